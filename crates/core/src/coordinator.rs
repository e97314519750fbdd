//! Serialized access to the shared analysis engine.
//!
//! Any number of requests may validate queries concurrently, but only one
//! engine invocation runs at a time, process-wide. Validation happens before
//! the lock is taken, so a malformed query never waits for, or touches, the
//! engine.

use crate::index::ProgramIndex;
use augur_api::{
    AnalysisEngine, AnalysisOutput, EngineQuery, Mode, OutputFormat, PosSpan, ProgramSnapshot,
    QueryPos,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown mode: {0:?}")]
    UnknownMode(String),
    #[error("mode {0} is not supported by the analysis engine")]
    UnsupportedMode(Mode),
    #[error("unknown format: {0:?} (want plain or json)")]
    UnknownFormat(String),
    #[error("mode {0} requires a position")]
    MissingPosition(Mode),
    #[error("{0}")]
    InvalidPosition(String),
    #[error("file is not part of the loaded program: {0}")]
    FileNotInProgram(String),
    #[error("position out of range: {0}")]
    PositionOutOfRange(String),
    #[error("package is not part of the loaded program: {0}")]
    UnknownPackage(String),
    #[error("{0}")]
    Engine(String),
    #[error("query aborted: {0}")]
    Aborted(String),
}

impl QueryError {
    /// True when the query was rejected before reaching the engine.
    pub fn is_validation(&self) -> bool {
        !matches!(self, QueryError::Engine(_) | QueryError::Aborted(_))
    }
}

/// Raw query parameters as received on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub mode: String,
    pub pos: String,
    pub format: String,
    pub scope: String,
}

#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub query: EngineQuery,
    pub output: AnalysisOutput,
    pub elapsed: Duration,
}

/// Split a scope parameter on commas and whitespace.
pub fn parse_scope(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The analysis engine behind a mutual-exclusion guard.
///
/// The engine is reachable only through [`ExclusiveEngine::with_exclusive`],
/// so every call happens while the guard is held.
pub struct ExclusiveEngine {
    inner: Arc<Mutex<Box<dyn AnalysisEngine>>>,
}

impl ExclusiveEngine {
    pub fn new(engine: Box<dyn AnalysisEngine>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with sole access to the engine.
    ///
    /// Waiting for the guard does not occupy a runtime worker. Once acquired,
    /// the guard moves into a blocking task together with `f` and is released
    /// when `f` returns or panics. Dropping the returned future after
    /// acquisition does not stop `f`; it runs to completion.
    pub async fn with_exclusive<F, R>(&self, f: F) -> Result<R, QueryError>
    where
        F: FnOnce(&mut (dyn AnalysisEngine + 'static)) -> R + Send + 'static,
        R: Send + 'static,
    {
        let mut guard = self.inner.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || f(&mut **guard))
            .await
            .map_err(|e| {
                if e.is_panic() {
                    QueryError::Aborted("analysis engine panicked".to_string())
                } else {
                    QueryError::Aborted(e.to_string())
                }
            })
    }
}

/// Validates queries against the loaded program and drives the engine.
pub struct QueryCoordinator {
    engine: ExclusiveEngine,
    supported: HashSet<Mode>,
    snapshot: Arc<ProgramSnapshot>,
    index: Arc<ProgramIndex>,
}

impl QueryCoordinator {
    pub fn new(
        engine: Box<dyn AnalysisEngine>,
        snapshot: Arc<ProgramSnapshot>,
        index: Arc<ProgramIndex>,
    ) -> Self {
        let supported = engine.supported_modes().into_iter().collect();
        Self {
            engine: ExclusiveEngine::new(engine),
            supported,
            snapshot,
            index,
        }
    }

    pub fn supports(&self, mode: Mode) -> bool {
        self.supported.contains(&mode)
    }

    /// Check a raw request and turn it into an engine query. Never touches the engine.
    pub fn validate(&self, request: &QueryRequest) -> Result<EngineQuery, QueryError> {
        let mode: Mode = request
            .mode
            .parse()
            .map_err(|_| QueryError::UnknownMode(request.mode.clone()))?;
        if !self.supports(mode) {
            return Err(QueryError::UnsupportedMode(mode));
        }

        let format = if request.format.is_empty() {
            OutputFormat::default()
        } else {
            request
                .format
                .parse()
                .map_err(|_| QueryError::UnknownFormat(request.format.clone()))?
        };

        let pos = if request.pos.is_empty() {
            if mode.needs_position() {
                return Err(QueryError::MissingPosition(mode));
            }
            None
        } else {
            let pos: QueryPos = request
                .pos
                .parse()
                .map_err(|e: augur_api::ApiError| QueryError::InvalidPosition(e.to_string()))?;
            self.check_position(&pos)?;
            Some(pos)
        };

        let scope = parse_scope(&request.scope);
        if let Some(unknown) = scope.iter().find(|p| !self.index.contains_package(p)) {
            return Err(QueryError::UnknownPackage(unknown.clone()));
        }

        Ok(EngineQuery {
            mode,
            pos,
            format,
            scope,
        })
    }

    fn check_position(&self, pos: &QueryPos) -> Result<(), QueryError> {
        let path = Path::new(&pos.file);
        if !self.index.contains_file(path) {
            return Err(QueryError::FileNotInProgram(pos.file.clone()));
        }
        let file = self
            .snapshot
            .fset
            .file(path)
            .ok_or_else(|| QueryError::FileNotInProgram(pos.file.clone()))?;
        let in_range = match pos.span {
            PosSpan::Offsets { start, end } => start <= end && end <= file.size,
            PosSpan::LineCol { line, col } => file.offset_of(line, col).is_some(),
        };
        if in_range {
            Ok(())
        } else {
            Err(QueryError::PositionOutOfRange(pos.to_string()))
        }
    }

    /// Validate and execute a query. Engine failures are returned unmodified
    /// as [`QueryError::Engine`]; they never affect other queries.
    pub async fn run_query(&self, request: &QueryRequest) -> Result<QueryResponse, QueryError> {
        let query = self.validate(request)?;
        self.execute(query).await
    }

    /// Execute an already validated query under the engine guard.
    pub async fn execute(&self, query: EngineQuery) -> Result<QueryResponse, QueryError> {
        let engine_query = query.clone();
        let (result, elapsed) = self
            .engine
            .with_exclusive(move |engine| {
                let start = Instant::now();
                let result = engine.query(&engine_query);
                (result, start.elapsed())
            })
            .await?;

        debug!(mode = %query.mode, ?elapsed, "engine call finished");
        match result {
            Ok(output) => Ok(QueryResponse {
                query,
                output,
                elapsed,
            }),
            Err(e) => {
                warn!(mode = %query.mode, error = %e, "query failed");
                Err(QueryError::Engine(e.to_string()))
            }
        }
    }
}
