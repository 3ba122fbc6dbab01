//! # 统一错误处理模块
//!
//! 定义 tokencount 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// tokencount 统一错误类型
#[derive(Error, Debug)]
pub enum TokencountError {
    // ─────────────────────────────────────────────────────────────
    // 配置错误（处理开始前检出，全部致命）
    // ─────────────────────────────────────────────────────────────
    #[error("Dataset directory not found: {path}")]
    DatasetNotFound { path: String },

    #[error("No readable data files found in: {path}")]
    NoFilesFound { path: String },

    #[error("Field '{field}' not found in {path}\nAvailable fields: {available}")]
    FieldNotFound {
        field: String,
        path: String,
        available: String,
    },

    #[error("Unknown tokenizer model: {model}")]
    UnknownModel {
        model: String,
        #[source]
        source: anyhow::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open {path}")]
    ParquetError {
        path: String,
        #[source]
        source: parquet::errors::ParquetError,
    },

    // ─────────────────────────────────────────────────────────────
    // 行级错误（非致命：跳过该行，记录警告，继续处理）
    // ─────────────────────────────────────────────────────────────
    #[error("{path} (row {row}): {reason}")]
    RowDecodeError {
        path: String,
        row: u64,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 运行期错误
    // ─────────────────────────────────────────────────────────────
    #[error("Worker pool failure: {0}")]
    WorkerFailed(String),

    #[error("Run cancelled by user")]
    Interrupted,
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, TokencountError>;
