//! # 分词器模块
//!
//! 按模型名解析 tiktoken 编码器并统计 token 数量。
//!
//! ## 依赖关系
//! - 被 `pipeline/` 和 `main.rs` 使用
//! - 使用 `tiktoken-rs` crate

use crate::error::{Result, TokencountError};

use tiktoken_rs::tokenizer::{get_tokenizer, Tokenizer};
use tiktoken_rs::CoreBPE;

/// 解析模型对应的编码器；未知模型为致命错误
pub fn resolve_encoder(model: &str) -> Result<CoreBPE> {
    tiktoken_rs::get_bpe_from_model(model).map_err(|source| TokencountError::UnknownModel {
        model: model.to_string(),
        source,
    })
}

/// 模型映射到的编码族名称（仅用于启动信息回显）
pub fn encoding_name(model: &str) -> Option<&'static str> {
    match get_tokenizer(model)? {
        Tokenizer::O200kBase => Some("o200k_base"),
        Tokenizer::Cl100kBase => Some("cl100k_base"),
        Tokenizer::P50kBase => Some("p50k_base"),
        Tokenizer::P50kEdit => Some("p50k_edit"),
        Tokenizer::R50kBase | Tokenizer::Gpt2 => Some("r50k_base"),
    }
}

/// 统计一段文本的 token 数；空文本直接为 0
pub fn count_tokens(bpe: &CoreBPE, text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    bpe.encode_ordinary(text).len()
}
