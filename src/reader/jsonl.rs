//! # JSONL 读取器
//!
//! 按行解析 JSON Lines 文件，每行一个 JSON 对象。
//!
//! ## 行为
//! - 空行跳过
//! - 非法 JSON 或非对象行产出行级错误（带文件与行号），流继续
//! - 行内非 UTF-8 字节产出行级错误，流继续
//! - 其他 I/O 错误（如截断的压缩流）为致命错误：文件尾部已不可读，
//!   产出 `FileReadError` 后终止流，绝不把残缺文件的总数当作权威结果
//!
//! ## 依赖关系
//! - 被 `reader/mod.rs` 使用
//! - 使用 `serde_json`

use crate::error::{Result, TokencountError};
use crate::reader::{Row, RowStream};

use std::io::{BufRead, BufReader, ErrorKind, Lines, Read};
use std::path::Path;

/// 流式读取 JSONL 行
pub fn rows(input: Box<dyn Read>, path: &Path) -> RowStream {
    Box::new(JsonlRows {
        lines: BufReader::new(input).lines(),
        path: path.display().to_string(),
        line_no: 0,
        done: false,
    })
}

/// 推断 schema：第一个可解析对象的键集合，全部不可解析则为空
pub fn schema(input: Box<dyn Read>, path: &Path) -> Vec<String> {
    for row in rows(input, path) {
        if let Ok(row) = row {
            return row.keys().cloned().collect();
        }
    }
    Vec::new()
}

struct JsonlRows {
    lines: Lines<BufReader<Box<dyn Read>>>,
    path: String,
    line_no: u64,
    done: bool,
}

impl JsonlRows {
    fn row_error(&self, reason: String) -> TokencountError {
        TokencountError::RowDecodeError {
            path: self.path.clone(),
            row: self.line_no,
            reason,
        }
    }
}

impl Iterator for JsonlRows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            match self.lines.next()? {
                Ok(line) => {
                    self.line_no += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    return match serde_json::from_str::<serde_json::Value>(&line) {
                        Ok(serde_json::Value::Object(map)) => Some(Ok(map)),
                        Ok(_) => Some(Err(self.row_error("expected a JSON object".to_string()))),
                        Err(e) => Some(Err(self.row_error(e.to_string()))),
                    };
                }
                // 非 UTF-8 行：该行字节已被消费，流可以继续
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    self.line_no += 1;
                    return Some(Err(self.row_error(e.to_string())));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(TokencountError::FileReadError {
                        path: self.path.clone(),
                        source: e,
                    }));
                }
            }
        }
    }
}
