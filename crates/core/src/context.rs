use crate::cmdline::render_command_line;
use crate::config::ServerConfig;
use crate::coordinator::QueryCoordinator;
use crate::error::{AugurError, Result};
use crate::index::ProgramIndex;
use augur_api::{AnalysisEngine, ApiResult, EngineQuery, ProgramLoader, ProgramSnapshot};
use std::sync::Arc;
use tracing::info;

/// Process-wide service state, built once at startup and shared read-only
/// by every request handler.
pub struct ServiceContext {
    config: ServerConfig,
    snapshot: Arc<ProgramSnapshot>,
    index: Arc<ProgramIndex>,
    coordinator: QueryCoordinator,
}

impl ServiceContext {
    /// Load the program, derive the index and bind an engine to the snapshot.
    ///
    /// The engine factory runs only after a successful load. Any failure here
    /// is fatal to startup.
    pub fn build<L, F>(loader: &L, config: ServerConfig, engine_factory: F) -> Result<Self>
    where
        L: ProgramLoader + ?Sized,
        F: FnOnce(&Arc<ProgramSnapshot>) -> ApiResult<Box<dyn AnalysisEngine>>,
    {
        if config.package_args.is_empty() {
            return Err(AugurError::NoPackages);
        }

        let snapshot = loader
            .load(&config.package_args, &config.build_tags)
            .map_err(|e| AugurError::Load(e.to_string()))?;
        let snapshot = Arc::new(snapshot);
        info!(
            packages = snapshot.packages.len(),
            files = snapshot.fset.len(),
            "program loaded"
        );

        let engine = engine_factory(&snapshot).map_err(|e| AugurError::Engine(e.to_string()))?;
        Ok(Self::from_parts(config, snapshot, engine))
    }

    /// Assemble a context from an already loaded snapshot.
    pub fn from_parts(
        config: ServerConfig,
        snapshot: Arc<ProgramSnapshot>,
        engine: Box<dyn AnalysisEngine>,
    ) -> Self {
        let index = Arc::new(ProgramIndex::build(&snapshot));
        let coordinator = QueryCoordinator::new(engine, snapshot.clone(), index.clone());
        Self {
            config,
            snapshot,
            index,
            coordinator,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &ProgramSnapshot {
        &self.snapshot
    }

    pub fn index(&self) -> &ProgramIndex {
        &self.index
    }

    pub fn coordinator(&self) -> &QueryCoordinator {
        &self.coordinator
    }

    /// Standalone command line equivalent to `query`. An empty query scope
    /// stands for the whole program, i.e. the startup package arguments.
    pub fn command_line_for(&self, query: &EngineQuery) -> String {
        let pos = query.pos.as_ref().map(|p| p.to_string()).unwrap_or_default();
        let scope = if query.scope.is_empty() {
            &self.config.package_args
        } else {
            &query.scope
        };
        render_command_line(query.mode.as_str(), &pos, query.format.as_str(), scope)
    }
}
