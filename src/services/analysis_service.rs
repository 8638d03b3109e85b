// Analysis Service
// Purpose: Run the analysis pipeline for one query and render the report
//
// Runner -> Inspector -> Correlator -> Rule Engine, strictly in that order.

use crate::models::{
    AnalysisReport, AnalysisResult, DataTable, Notice, QuerySpec, TimingSample, TimingSeries,
    TimingSummary, plan_legend,
};
use crate::services::benchmark_runner::BenchmarkRunner;
use crate::services::mysql_client::{Connector, Session};
use crate::services::plan_inspector::{Inspection, PlanInspector};
use crate::services::rule_engine::{RuleEngine, RuleThresholds};
use crate::services::stats_correlator::StatsCorrelator;
use crate::utils::error::AnalysisError;
use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

pub struct AnalysisService {
    connector: Arc<dyn Connector>,
    runner: BenchmarkRunner,
    inspector: PlanInspector,
    correlator: StatsCorrelator,
    rule_engine: RuleEngine,
}

/// Pipeline output before rendering
struct PipelineOutput {
    result: AnalysisResult,
    result_set: DataTable,
    notices: Vec<Notice>,
}

impl AnalysisService {
    pub fn new(
        connector: Arc<dyn Connector>,
        statistics_schema: impl Into<String>,
        thresholds: RuleThresholds,
    ) -> Self {
        Self {
            correlator: StatsCorrelator::new(connector.clone(), statistics_schema),
            connector,
            runner: BenchmarkRunner::new(),
            inspector: PlanInspector::new(),
            rule_engine: RuleEngine::new(thresholds),
        }
    }

    /// Analyse one query and render the report
    pub async fn analyze(&self, spec: QuerySpec) -> Result<AnalysisReport, AnalysisError> {
        let analysis_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("analysis", id = %analysis_id);

        async move {
            tracing::info!(
                "Analysing query ({} runs, database: {})",
                spec.repeat_count(),
                spec.database().unwrap_or("<none>")
            );
            let output = self.run_pipeline(&spec).await?;
            tracing::info!(
                "Analysis finished with {} findings (trace: {}, statistics: {})",
                output.result.findings.len(),
                output.result.trace.is_some(),
                output.result.statistics.is_some()
            );
            Ok::<_, AnalysisError>(render_report(analysis_id, &spec, output))
        }
        .instrument(span)
        .await
    }

    async fn run_pipeline(&self, spec: &QuerySpec) -> Result<PipelineOutput, AnalysisError> {
        let mut session =
            self.connector.open(spec.database()).await.map_err(AnalysisError::Connection)?;
        let outcome = self.measure(spec, session.as_mut()).await;
        session.close().await;
        let (timings, inspection) = outcome?;

        let statistics = self.correlator.correlate(spec).await;

        let trace_rows = inspection.trace.as_ref().map(|t| t.rows.as_slice());
        let findings =
            self.rule_engine.diagnose(&inspection.plan.rows, trace_rows, statistics.as_ref());

        let Inspection { result_set, plan, trace, notices } = inspection;
        Ok(PipelineOutput {
            result: AnalysisResult { timings, plan, trace, statistics, findings },
            result_set,
            notices,
        })
    }

    /// Benchmark then inspect on the target connection
    async fn measure(
        &self,
        spec: &QuerySpec,
        session: &mut dyn Session,
    ) -> Result<(TimingSample, Inspection), AnalysisError> {
        let timings = self.runner.run(spec, session).await?;
        let inspection = self.inspector.inspect(spec, session).await?;
        Ok((timings, inspection))
    }
}

fn render_report(analysis_id: String, spec: &QuerySpec, output: PipelineOutput) -> AnalysisReport {
    let PipelineOutput { result, result_set, notices: inspection_notices } = output;
    let timings = &result.timings;
    let mean = timings.mean().unwrap_or_default();

    let mut notices = vec![Notice::success(format!("Average execution time: {:.6} s", mean))];
    notices.extend(inspection_notices);

    AnalysisReport {
        analysis_id,
        generated_at: Utc::now(),
        query: spec.query().to_string(),
        database: spec.database().map(str::to_string),
        timing: TimingSummary {
            runs: timings.len(),
            mean_secs: mean,
            min_secs: timings.min().unwrap_or_default(),
            max_secs: timings.max().unwrap_or_default(),
            samples: timings.clone(),
        },
        series: TimingSeries::from(timings),
        result: result_set,
        plan: result.plan,
        trace: result.trace,
        statistics: result.statistics,
        findings: result.findings,
        notices,
        plan_legend: plan_legend(),
    }
}
