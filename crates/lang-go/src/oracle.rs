//! Analysis engine backed by the standalone `oracle` tool.

use augur_api::{AnalysisEngine, AnalysisOutput, ApiError, ApiResult, EngineQuery, OutputFormat};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Runs each query as an `oracle` child process.
pub struct OracleEngine {
    tool: PathBuf,
    default_scope: Vec<String>,
    build_tags: Vec<String>,
    queries_run: u64,
}

impl OracleEngine {
    /// Bind to a tool executable. A bare name is looked up on `PATH`.
    pub fn new(tool: &Path, default_scope: Vec<String>, build_tags: Vec<String>) -> ApiResult<Self> {
        let tool = resolve_tool(tool).ok_or_else(|| {
            ApiError::Engine(format!(
                "analysis tool {} not found",
                tool.display()
            ))
        })?;
        Ok(Self {
            tool,
            default_scope,
            build_tags,
            queries_run: 0,
        })
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    pub fn queries_run(&self) -> u64 {
        self.queries_run
    }

    /// Arguments for one invocation, in command-line order.
    pub fn args(&self, query: &EngineQuery) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(pos) = &query.pos {
            args.push(format!("-pos={pos}"));
        }
        args.push(format!("-format={}", query.format));
        if !self.build_tags.is_empty() {
            args.push(format!("-tags={}", self.build_tags.join(",")));
        }
        args.push(query.mode.to_string());
        let scope = if query.scope.is_empty() {
            &self.default_scope
        } else {
            &query.scope
        };
        args.extend(scope.iter().cloned());
        args
    }
}

impl AnalysisEngine for OracleEngine {
    fn query(&mut self, query: &EngineQuery) -> ApiResult<AnalysisOutput> {
        let args = self.args(query);
        debug!(tool = %self.tool.display(), ?args, "running analysis tool");

        let output = Command::new(&self.tool)
            .args(&args)
            .output()
            .map_err(|e| ApiError::Engine(format!("cannot run {}: {e}", self.tool.display())))?;
        self.queries_run += 1;
        debug!(
            queries = self.queries_run,
            status = %output.status,
            "analysis tool finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let message = if !stderr.is_empty() {
                stderr
            } else if !stdout.is_empty() {
                stdout
            } else {
                format!("{} exited with {}", self.tool.display(), output.status)
            };
            return Err(ApiError::Engine(message));
        }

        match query.format {
            OutputFormat::Json => serde_json::from_slice(&output.stdout)
                .map(AnalysisOutput::Json)
                .map_err(|e| ApiError::Engine(format!("malformed JSON from analysis tool: {e}"))),
            OutputFormat::Plain => Ok(AnalysisOutput::Text(
                String::from_utf8_lossy(&output.stdout).into_owned(),
            )),
        }
    }
}

fn resolve_tool(tool: &Path) -> Option<PathBuf> {
    if tool.components().count() > 1 {
        return tool.is_file().then(|| tool.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).find_map(|dir| {
        let candidate = dir.join(tool);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let exe = candidate.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}
