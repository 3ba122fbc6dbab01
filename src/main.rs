//! # tokencount - 数据集 token 统计工具
//!
//! 统计目录下异构数据文件（JSONL/CSV/TSV/Parquet，可叠加 gzip/zstd 压缩）
//! 中指定字段的 LLM token 总数，批量并行处理以保证大数据集下内存有界。
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli.rs      (命令行参数定义)
//!   ├── pipeline/   (批处理管线)
//!   │     ├── reader/     (数据集读取)
//!   │     └── tokenizer.rs(分词计数)
//!   ├── utils/      (输出与进度条)
//!   └── error.rs    (错误处理)
//! ```
//!
//! ## 退出码
//! - 0: 成功
//! - 1: 致命错误（目录/字段/模型/worker 故障）
//! - 2: 命令行用法错误（clap 约定）
//! - 130: 用户中断

mod cli;
mod error;
mod pipeline;
mod reader;
mod tokenizer;
mod utils;

use clap::Parser;
use cli::Cli;
use error::TokencountError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        if let Err(e) = ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed)) {
            utils::output::print_warning(&format!("Could not install Ctrl-C handler: {e}"));
        }
    }

    let config = pipeline::PipelineConfig {
        dataset_dir: cli.dataset_path,
        field: cli.field,
        model: cli.model,
        batch_size: cli.batch_size.get(),
        workers: cli
            .workers
            .map(|w| w.get())
            .unwrap_or_else(num_cpus::get),
    };

    match pipeline::run(&config, &cancel) {
        Ok(summary) => pipeline::print_summary(&summary),
        Err(TokencountError::Interrupted) => {
            utils::output::print_warning("Run cancelled by user; no total was computed.");
            std::process::exit(130);
        }
        Err(e) => {
            utils::output::print_error(&format!("{e}"));
            std::process::exit(1);
        }
    }
}
