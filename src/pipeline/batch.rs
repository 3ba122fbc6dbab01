//! # 批次构造
//!
//! 将逐行提取出的文本聚合为固定大小的批次。
//!
//! ## 不变量
//! - 每个批次 `1 <= len <= capacity`
//! - 仅整个运行的最后一个批次允许不满
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs` 使用

use crate::reader::Row;

/// 一批待分词的文本，由单个 worker 一次性处理
#[derive(Debug)]
pub struct Batch {
    pub texts: Vec<String>,
}

/// 批次构造器：行到批次的分配只取决于行序与批大小
#[derive(Debug)]
pub struct Batcher {
    capacity: usize,
    texts: Vec<String>,
}

impl Batcher {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            texts: Vec::with_capacity(capacity),
        }
    }

    /// 追加一条文本；凑满一个批次时将其取出
    pub fn push(&mut self, text: String) -> Option<Batch> {
        self.texts.push(text);
        if self.texts.len() >= self.capacity {
            return self.take();
        }
        None
    }

    /// 取出收尾的不满批次
    pub fn finish(&mut self) -> Option<Batch> {
        self.take()
    }

    fn take(&mut self) -> Option<Batch> {
        if self.texts.is_empty() {
            return None;
        }
        let texts = std::mem::replace(&mut self.texts, Vec::with_capacity(self.capacity));
        Some(Batch { texts })
    }
}

/// 从行中提取目标字段的非空文本
///
/// 字段缺失、null、空串或非字符串值一律视为零贡献行。
pub fn extract_text<'a>(row: &'a Row, field: &str) -> Option<&'a str> {
    match row.get(field) {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    }
}
