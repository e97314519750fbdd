use crate::error::ApiResult;
use crate::models::{AnalysisOutput, Mode, OutputFormat, QueryPos};
use serde::{Deserialize, Serialize};

/// A single, self-contained question for the analysis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineQuery {
    pub mode: Mode,
    pub pos: Option<QueryPos>,
    pub format: OutputFormat,
    /// Package paths the answer is restricted to. Empty means the whole program.
    pub scope: Vec<String>,
}

/// The analysis capability consumed by the service.
///
/// An engine is bound to one program snapshot for its whole lifetime. Queries
/// take `&mut self` because engines keep working state between calls and are
/// not safe to drive from several threads at once.
pub trait AnalysisEngine: Send {
    /// Modes this engine can answer. Defaults to every known mode.
    fn supported_modes(&self) -> Vec<Mode> {
        Mode::ALL.to_vec()
    }

    fn query(&mut self, query: &EngineQuery) -> ApiResult<AnalysisOutput>;
}
