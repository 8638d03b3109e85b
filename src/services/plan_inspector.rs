// Plan Inspector
// Purpose: Fetch the displayed result set, the estimated plan and the actual-execution trace

use crate::models::{Notice, Plan, QuerySpec, ResultSet, Trace};
use crate::services::mysql_client::Session;
use crate::utils::error::AnalysisError;

pub const TRACE_UNAVAILABLE_NOTICE: &str =
    "Execution trace unavailable; the server may not support ANALYZE";

/// What the inspector found for one query
#[derive(Debug, Clone, Default)]
pub struct Inspection {
    /// Rows of one extra, un-timed execution
    pub result_set: ResultSet,
    pub plan: Plan,
    pub trace: Option<Trace>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlanInspector;

impl PlanInspector {
    pub fn new() -> Self {
        Self
    }

    /// Run the query once more, then EXPLAIN and ANALYZE it on the same connection
    ///
    /// A failing EXPLAIN aborts the analysis; a failing ANALYZE only drops the trace.
    pub async fn inspect(
        &self,
        spec: &QuerySpec,
        session: &mut dyn Session,
    ) -> Result<Inspection, AnalysisError> {
        let result_set = session.query(spec.query()).await.map_err(AnalysisError::Execution)?;

        let explain_sql = format!("EXPLAIN {}", spec.statement_body());
        let plan_table = session.query(&explain_sql).await.map_err(|e| {
            tracing::warn!("EXPLAIN failed: {}", e);
            AnalysisError::PlanUnavailable(e)
        })?;
        let plan = Plan::from(plan_table);
        tracing::debug!("Plan has {} rows", plan.rows.len());

        let mut notices = Vec::new();
        let trace = match self.fetch_trace(spec, session).await {
            Ok(trace) => Some(trace),
            Err(e) => {
                tracing::warn!("{}", e);
                notices.push(Notice::warning(TRACE_UNAVAILABLE_NOTICE));
                None
            },
        };

        Ok(Inspection { result_set, plan, trace, notices })
    }

    async fn fetch_trace(
        &self,
        spec: &QuerySpec,
        session: &mut dyn Session,
    ) -> Result<Trace, AnalysisError> {
        let analyze_sql = format!("ANALYZE FORMAT=TRADITIONAL {}", spec.statement_body());
        let table = session.query(&analyze_sql).await.map_err(AnalysisError::TraceUnavailable)?;
        Ok(Trace::from(table))
    }
}
