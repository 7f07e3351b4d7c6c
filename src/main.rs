use mapreduce_worker::actions::{builtin_map_actions, builtin_reduce_actions};
use mapreduce_worker::processor::processor::TaskProcessor;
use mapreduce_worker::processor::types::{TaskData, TaskId, TaskKind, TaskState};

use std::collections::HashMap;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} --input <file> [--input <file> ...] [--concurrency <n>] [--tick-ms <ms>]", args[0]);
        eprintln!("Example: {} --input corpus/a.txt --input corpus/b.txt --concurrency 4", args[0]);
        std::process::exit(1);
    }

    let mut inputs: Vec<String> = vec![];
    let mut concurrency: Option<usize> = None;
    let mut tick_ms: Option<u64> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                inputs.push(args[i + 1].clone());
                i += 2;
            }
            "--concurrency" => {
                concurrency = Some(args[i + 1].parse()?);
                i += 2;
            }
            "--tick-ms" => {
                tick_ms = Some(args[i + 1].parse()?);
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    if inputs.is_empty() {
        eprintln!("At least one --input file is required");
        std::process::exit(1);
    }

    // Flags win over environment, environment over defaults.
    let concurrency = concurrency
        .or_else(|| {
            std::env::var("WORKER_CONCURRENCY")
                .ok()
                .and_then(|value| value.parse().ok())
        })
        .unwrap_or(4);
    let tick_ms = tick_ms
        .or_else(|| {
            std::env::var("WORKER_TICK_MS")
                .ok()
                .and_then(|value| value.parse().ok())
        })
        .unwrap_or(1);

    tracing::info!(
        "Starting worker: {} input file(s), concurrency {}, tick {} ms",
        inputs.len(),
        concurrency,
        tick_ms
    );

    let processor = TaskProcessor::new();
    processor.set_map_actions(builtin_map_actions()).await;
    processor.set_reduce_actions(builtin_reduce_actions()).await;
    processor.set_max_concurrent(concurrency).await;
    processor
        .set_tick_period(Duration::from_millis(tick_ms))
        .await;

    // Both sinks feed one channel; the record's state says which way it went.
    let (outcome_tx, mut outcome_rx) = tokio::sync::mpsc::unbounded_channel::<TaskData>();
    let error_tx = outcome_tx.clone();
    processor
        .set_completed_sink(move |task| {
            let tx = outcome_tx.clone();
            async move { tx.send(task).is_ok() }
        })
        .await;
    processor
        .set_error_sink(move |task| {
            let tx = error_tx.clone();
            async move { tx.send(task).is_ok() }
        })
        .await;

    processor.start().await;

    // One word-count map task per input file.
    let mut map_ids = Vec::new();
    for path in &inputs {
        let text = tokio::fs::read(path).await?;
        let id = TaskId(uuid::Uuid::new_v4().to_string());
        map_ids.push(id.clone());
        processor
            .submit_task(TaskData::new(id, TaskKind::Map, "wordcount", text))
            .await;
    }

    let mut partial_counts: Vec<serde_json::Value> = Vec::new();
    while partial_counts.len() < map_ids.len() {
        let Some(task) = outcome_rx.recv().await else {
            anyhow::bail!("outcome channel closed before all map tasks finished");
        };
        if task.state == TaskState::Errored {
            anyhow::bail!("map task {} failed", task.id.0);
        }
        tracing::info!("Map task {} finished", task.id.0);
        partial_counts.push(serde_json::from_slice(&task.output)?);
    }

    // Merge the partial counts with a combine task.
    let combine_id = TaskId(uuid::Uuid::new_v4().to_string());
    processor
        .submit_task(TaskData::new(
            combine_id.clone(),
            TaskKind::Combine,
            "sum_counts",
            serde_json::to_vec(&partial_counts)?,
        ))
        .await;

    let merged = loop {
        let Some(task) = outcome_rx.recv().await else {
            anyhow::bail!("outcome channel closed before the combine task finished");
        };
        if task.id != combine_id {
            continue;
        }
        if task.state == TaskState::Errored {
            anyhow::bail!("combine task {} failed", task.id.0);
        }
        break task;
    };

    let counts: HashMap<String, u64> = serde_json::from_slice(&merged.output)?;
    let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    println!("Top words across {} file(s):", inputs.len());
    for (word, count) in ranked.iter().take(10) {
        println!("  {:>8}  {}", count, word);
    }

    tracing::info!("{}", processor.describe().await);
    processor.stop().await;

    Ok(())
}
