//! # 批处理管线
//!
//! 把「一个目录 + 一个字段名」转换为「总 token 数」，全程不把数据集
//! 整体载入内存。
//!
//! ## 结构
//! 生产者（顺序读行、分批）→ 有界队列 → rayon worker 池（逐批计数）
//! → 归约（求和）。批次完成顺序不影响结果：求和满足交换律。
//!
//! ## 失败策略
//! - 数据集级错误（目录/字段/模型）在开工前检出，致命
//! - 行级错误跳过该行并告警，汇总计数在结束时上报
//! - worker panic 升级为整次运行的致命错误，绝不静默少算
//! - 用户中断丢弃部分结果，以独立的结果形态上报
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `reader/`, `tokenizer.rs`, `utils/`
//! - 使用 `rayon` 进行并行计数
//! - 子模块: batch

pub mod batch;

use crate::error::{Result, TokencountError};
use crate::reader::Dataset;
use crate::tokenizer;
use crate::utils::{output, progress};

use self::batch::{Batch, Batcher};
use indicatif::ProgressBar;
use rayon::iter::{ParallelBridge, ParallelIterator};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender};
use std::thread;
use std::time::{Duration, Instant};
use tiktoken_rs::CoreBPE;

/// 一次运行的完整配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub dataset_dir: PathBuf,
    pub field: String,
    pub model: String,
    pub batch_size: usize,
    pub workers: usize,
}

/// 运行结果
#[derive(Debug)]
pub struct RunSummary {
    pub total_tokens: u64,
    pub rows_tokenized: u64,
    pub rows_empty: u64,
    pub rows_failed: u64,
    pub batches: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct ProducerStats {
    rows_tokenized: u64,
    rows_empty: u64,
    rows_failed: u64,
    batches: u64,
}

/// 执行一次完整的统计运行
pub fn run(config: &PipelineConfig, cancel: &AtomicBool) -> Result<RunSummary> {
    // 快速失败：三项数据集级检查全部通过后才开始任何处理
    let dataset = Dataset::open(&config.dataset_dir)?;
    dataset.require_field(&config.field)?;
    let encoder = tokenizer::resolve_encoder(&config.model)?;

    output::print_header("Counting Tokens");
    if let Some(name) = tokenizer::encoding_name(&config.model) {
        output::print_info(&format!("Using encoding: {name}"));
    }
    output::print_info(&format!(
        "Processing dataset: {}",
        dataset.root().display()
    ));
    output::print_info(&format!("Field to tokenize: {}", config.field));
    output::print_info(&format!("Using {} worker threads", config.workers));
    for path in dataset.skipped() {
        output::print_skip(&format!("Unrecognized file: {}", path.display()));
    }
    output::print_info(&format!("Found {} data files", dataset.files().len()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| TokencountError::WorkerFailed(e.to_string()))?;

    // 有界队列：生产者最多领先 worker 两轮，内存上限约为
    // batch_size * 2 * workers 条文本
    let (tx, rx) = mpsc::sync_channel::<Batch>(config.workers.saturating_mul(2));
    let pb = progress::create_spinner("reading rows");
    let start = Instant::now();

    let (producer_outcome, consumer_outcome) = thread::scope(|scope| {
        let producer = scope.spawn(|| produce(&dataset, config, tx, cancel, &pb));

        // worker panic 在此捕获并升级，不允许静默丢批
        let consumer = panic::catch_unwind(AssertUnwindSafe(|| {
            pool.install(|| {
                rx.into_iter()
                    .par_bridge()
                    .map(|batch| count_batch(&encoder, &batch))
                    .sum::<u64>()
            })
        }));

        (producer.join(), consumer)
    });

    pb.finish_and_clear();

    let total_tokens = consumer_outcome.map_err(|_| {
        TokencountError::WorkerFailed("a worker panicked while tokenizing a batch".to_string())
    })?;
    let stats = match producer_outcome {
        Ok(result) => result?,
        Err(_) => {
            return Err(TokencountError::WorkerFailed(
                "the batch producer panicked".to_string(),
            ))
        }
    };

    Ok(RunSummary {
        total_tokens,
        rows_tokenized: stats.rows_tokenized,
        rows_empty: stats.rows_empty,
        rows_failed: stats.rows_failed,
        batches: stats.batches,
        elapsed: start.elapsed(),
    })
}

/// 打印最终统计
pub fn print_summary(summary: &RunSummary) {
    println!();
    output::print_done(&format!("Total tokens: {}", summary.total_tokens));
    output::print_info(&format!(
        "Total items processed: {}",
        summary.rows_tokenized
    ));
    if summary.rows_tokenized > 0 {
        output::print_info(&format!(
            "Average tokens per item: {:.2}",
            summary.total_tokens as f64 / summary.rows_tokenized as f64
        ));
    } else {
        output::print_info("Average tokens per item: 0.00");
    }
    if summary.rows_empty > 0 {
        output::print_info(&format!(
            "Rows with empty or non-text field: {}",
            summary.rows_empty
        ));
    }
    if summary.rows_failed > 0 {
        output::print_warning(&format!(
            "{} rows skipped due to decode errors (see warnings above)",
            summary.rows_failed
        ));
    }
    output::print_info(&format!(
        "Processed {} batches in {:.2}s",
        summary.batches,
        summary.elapsed.as_secs_f64()
    ));
}

/// 生产者：按文件序、行序读取，提取字段，分批送入队列
fn produce(
    dataset: &Dataset,
    config: &PipelineConfig,
    tx: SyncSender<Batch>,
    cancel: &AtomicBool,
    pb: &ProgressBar,
) -> Result<ProducerStats> {
    let mut stats = ProducerStats::default();
    let mut batcher = Batcher::new(config.batch_size);
    let mut rows_seen: u64 = 0;

    for file in dataset.files() {
        for row in file.rows()? {
            if cancel.load(Ordering::Relaxed) {
                return Err(TokencountError::Interrupted);
            }
            rows_seen += 1;

            match row {
                Ok(row) => match batch::extract_text(&row, &config.field) {
                    Some(text) => {
                        stats.rows_tokenized += 1;
                        if let Some(full) = batcher.push(text.to_string()) {
                            dispatch(&tx, full, &mut stats, pb, rows_seen)?;
                        }
                    }
                    None => stats.rows_empty += 1,
                },
                // 行级解码错误可恢复；其余（如文件中途不可读）致命
                Err(e @ TokencountError::RowDecodeError { .. }) => {
                    stats.rows_failed += 1;
                    pb.suspend(|| output::print_warning(&format!("Skipping row: {e}")));
                }
                Err(e) => return Err(e),
            }
        }
    }

    if let Some(last) = batcher.finish() {
        dispatch(&tx, last, &mut stats, pb, rows_seen)?;
    }

    Ok(stats)
}

fn dispatch(
    tx: &SyncSender<Batch>,
    batch: Batch,
    stats: &mut ProducerStats,
    pb: &ProgressBar,
    rows_seen: u64,
) -> Result<()> {
    stats.batches += 1;
    pb.set_message(format!("{rows_seen} rows read"));
    tx.send(batch).map_err(|_| {
        TokencountError::WorkerFailed("worker pool stopped accepting batches".to_string())
    })
}

fn count_batch(bpe: &CoreBPE, batch: &Batch) -> u64 {
    batch
        .texts
        .iter()
        .map(|text| tokenizer::count_tokens(bpe, text) as u64)
        .sum()
}
