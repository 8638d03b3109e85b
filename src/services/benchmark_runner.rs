// Benchmark Runner
// Purpose: Time repeated executions of a query on one connection

use crate::models::{QuerySpec, TimingSample};
use crate::services::mysql_client::Session;
use crate::utils::error::AnalysisError;
use tokio::time::Instant;

/// Statement keywords that only read data
const READ_ONLY_PREFIXES: [&str; 8] =
    ["SELECT", "WITH", "SHOW", "DESCRIBE", "DESC", "EXPLAIN", "TABLE", "VALUES"];

#[derive(Debug, Clone, Copy, Default)]
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    pub fn new() -> Self {
        Self
    }

    /// Execute the query `repeat_count` times, strictly one after another
    ///
    /// Every run fetches the complete result so transfer cost is part of the sample. The first
    /// failure aborts the benchmark and no partial sample is returned.
    pub async fn run(
        &self,
        spec: &QuerySpec,
        session: &mut dyn Session,
    ) -> Result<TimingSample, AnalysisError> {
        if !is_read_only(spec.query()) {
            tracing::warn!(
                "Benchmarking a statement that may modify data; it will run {} time(s)",
                spec.repeat_count()
            );
        }

        let mut sample = TimingSample::with_capacity(spec.repeat_count() as usize);
        for run in 1..=spec.repeat_count() {
            let start = Instant::now();
            let rows = session.query(spec.query()).await.map_err(|e| {
                tracing::warn!("Benchmark run {} failed: {}", run, e);
                AnalysisError::Execution(e)
            })?;
            let elapsed = start.elapsed().as_secs_f64();
            tracing::trace!("Run {}: {:.6}s, {} rows", run, elapsed, rows.row_count());
            sample.record(elapsed);
        }

        tracing::debug!(
            "Benchmark finished: {} runs, mean {:.6}s",
            sample.len(),
            sample.mean().unwrap_or_default()
        );
        Ok(sample)
    }
}

fn is_read_only(query: &str) -> bool {
    let first_word: String = query
        .trim_start()
        .trim_start_matches('(')
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    READ_ONLY_PREFIXES.iter().any(|p| first_word.eq_ignore_ascii_case(p))
}
