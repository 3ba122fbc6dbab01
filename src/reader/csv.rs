//! # CSV/TSV 读取器
//!
//! 首行作为表头，每条记录映射为字段名到字符串值的行。
//!
//! ## 行为
//! - 分隔符由扩展名决定（.csv 逗号，.tsv 制表符）
//! - 表头不可读视为致命错误
//! - 畸形记录产出行级错误（带记录号），流继续
//!
//! ## 依赖关系
//! - 被 `reader/mod.rs` 使用
//! - 使用 `csv` crate

use crate::error::{Result, TokencountError};
use crate::reader::{Row, RowStream};

use csv::ReaderBuilder;
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// 流式读取 CSV/TSV 记录
pub fn rows(input: Box<dyn Read>, delimiter: u8, path: &Path) -> Result<RowStream> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(input);

    let display = path.display().to_string();
    let headers = reader
        .headers()
        .map_err(|e| TokencountError::RowDecodeError {
            path: display.clone(),
            row: 0,
            reason: format!("unreadable header: {e}"),
        })?
        .clone();

    let iter = reader
        .into_records()
        .enumerate()
        .map(move |(index, record)| match record {
            Ok(record) => {
                let mut row = Row::new();
                for (name, value) in headers.iter().zip(record.iter()) {
                    row.insert(name.to_string(), Value::String(value.to_string()));
                }
                Ok(row)
            }
            Err(e) => Err(TokencountError::RowDecodeError {
                path: display.clone(),
                row: index as u64 + 1,
                reason: e.to_string(),
            }),
        });

    Ok(Box::new(iter))
}

/// 推断 schema：表头字段名，表头不可读则为空
pub fn schema(input: Box<dyn Read>, delimiter: u8) -> Vec<String> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(input);

    match reader.headers() {
        Ok(headers) => headers.iter().map(|s| s.to_string()).collect(),
        Err(_) => Vec::new(),
    }
}
