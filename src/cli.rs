//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数。
//!
//! ## 参数结构
//! - `DATASET_PATH`: 数据文件所在目录
//! - `FIELD`: 待统计 token 的字段名
//! - `--model`: 分词器模型名（默认 gpt-4o）
//! - `--batch-size`: 每批行数（默认 1000）
//! - `--workers`: 并行 worker 数（默认 CPU 核数）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 参数传递给 `pipeline/`

use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;

/// tokencount - 统计数据集文件中的 LLM token 数量
#[derive(Parser, Debug)]
#[command(name = "tokencount")]
#[command(version)]
#[command(about = "Count language-model tokens across data files in a directory", long_about = None)]
#[command(after_help = "Supported files: .jsonl/.json, .csv, .tsv, .parquet, \
plus .gz/.zst compressed jsonl and csv.\n\n\
Exit codes:\n  \
0    success, total token count printed\n  \
1    fatal error (bad path, missing field, unknown model, worker failure)\n  \
2    command-line usage error\n  \
130  interrupted by the user")]
pub struct Cli {
    /// Path to the directory containing data files
    pub dataset_path: PathBuf,

    /// Field/column name containing the text to tokenize
    pub field: String,

    /// Model name to use for tokenization
    #[arg(long, default_value = "gpt-4o")]
    pub model: String,

    /// Batch size for processing rows
    #[arg(long, default_value = "1000")]
    pub batch_size: NonZeroUsize,

    /// Number of parallel workers (defaults to the number of CPUs)
    #[arg(long)]
    pub workers: Option<NonZeroUsize>,
}
