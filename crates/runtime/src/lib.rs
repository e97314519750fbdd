use augur_api::AnalysisEngine;
use augur_core::{ServerConfig, ServiceContext};
use augur_go::{GoLoader, OracleEngine};

/// Worker threads used when no parallelism hint is given.
pub const MIN_WORKER_THREADS: usize = 4;

const WORKER_THREADS_ENV: &str = "TOKIO_WORKER_THREADS";

/// Loads the program named by `config` and binds the `oracle` tool to it.
///
/// Blocking: reads and parses every source file of the program.
pub fn build_default_context(config: ServerConfig) -> augur_core::Result<ServiceContext> {
    let loader = GoLoader::from_env()?;
    let tool = config.oracle_tool.clone();
    let scope = config.package_args.clone();
    let tags = config.build_tags.clone();
    ServiceContext::build(&loader, config, move |_snapshot| {
        let engine = OracleEngine::new(&tool, scope, tags)?;
        tracing::info!(tool = %engine.tool().display(), "analysis engine ready");
        Ok(Box::new(engine) as Box<dyn AnalysisEngine>)
    })
}

/// Initializes the logging system for a specific component.
/// This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> std::io::Result<impl Drop> {
    augur_core::logging::init_logging(component, to_stderr)
}

/// Number of runtime workers: the `TOKIO_WORKER_THREADS` hint when set,
/// otherwise the available parallelism with a floor of [`MIN_WORKER_THREADS`].
pub fn worker_threads(hint: Option<&str>) -> usize {
    if let Some(n) = hint
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
    {
        return n;
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(MIN_WORKER_THREADS)
}

pub fn build_runtime() -> std::io::Result<tokio::runtime::Runtime> {
    let hint = std::env::var(WORKER_THREADS_ENV).ok();
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads(hint.as_deref()))
        .enable_all()
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_threads_hint() {
        assert_eq!(worker_threads(Some("7")), 7);
        assert_eq!(worker_threads(Some(" 2 ")), 2);
        assert!(worker_threads(Some("0")) >= MIN_WORKER_THREADS);
        assert!(worker_threads(Some("lots")) >= MIN_WORKER_THREADS);
        assert!(worker_threads(None) >= MIN_WORKER_THREADS);
    }
}
