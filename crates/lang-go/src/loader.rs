//! Source-based package loading.
//!
//! Package arguments are resolved against the source roots, every import is
//! followed recursively, and each buildable file is registered in the
//! snapshot's file set. When a go tool is configured, the roots are then
//! compiled with it so type errors fail the load as well. Any failure aborts
//! the whole load.

use crate::constraint::BuildContext;
use crate::env::GoEnv;
use crate::header::{FileHeader, parse_header};
use augur_api::{ApiError, ApiResult, FileSet, PackageInfo, ProgramLoader, ProgramSnapshot};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// Pseudo-package provided by cgo; it has no source directory.
const CGO_PSEUDO_PACKAGE: &str = "C";

pub struct GoLoader {
    env: GoEnv,
    cwd: PathBuf,
    /// `go` executable used to type check the loaded roots.
    go_tool: Option<PathBuf>,
}

impl GoLoader {
    pub fn new(env: GoEnv, cwd: PathBuf) -> Self {
        Self {
            env,
            cwd,
            go_tool: None,
        }
    }

    /// Loader for the current process environment and working directory,
    /// type checking with the go tool of `GOROOT` (or `go` on `PATH`).
    pub fn from_env() -> ApiResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| ApiError::Load(format!("cannot determine working directory: {e}")))?;
        let env = GoEnv::from_env();
        let go_tool = env.go_tool();
        Ok(Self::new(env, cwd).with_type_check(go_tool))
    }

    pub fn with_type_check(mut self, go_tool: PathBuf) -> Self {
        self.go_tool = Some(go_tool);
        self
    }

    pub fn env(&self) -> &GoEnv {
        &self.env
    }
}

impl ProgramLoader for GoLoader {
    fn load(&self, package_args: &[String], build_tags: &[String]) -> ApiResult<ProgramSnapshot> {
        if package_args.is_empty() {
            return Err(ApiError::InvalidArgument("no package arguments".to_string()));
        }
        let mut session = LoadSession {
            ctx: BuildContext::new(&self.env, build_tags),
            roots: self.src_roots(),
            packages: HashMap::new(),
            fset: FileSet::new(),
            stack: Vec::new(),
        };

        let mut roots = Vec::with_capacity(package_args.len());
        for arg in package_args {
            let (import_path, dir) = session.resolve_arg(arg, &self.cwd)?;
            session.load_package(&import_path, &dir)?;
            roots.push(import_path);
        }

        debug!(
            packages = session.packages.len(),
            files = session.fset.len(),
            "loaded program"
        );
        if let Some(go_tool) = &self.go_tool {
            self.type_check(go_tool, &roots, build_tags)?;
        }
        Ok(ProgramSnapshot {
            packages: session.packages,
            fset: session.fset,
            roots,
        })
    }
}

impl GoLoader {
    fn src_roots(&self) -> Vec<PathBuf> {
        self.env
            .src_roots()
            .into_iter()
            .map(|root| root.canonicalize().unwrap_or(root))
            .collect()
    }

    /// Compile the roots in a scratch directory; any diagnostic fails the load.
    fn type_check(&self, go_tool: &Path, roots: &[String], build_tags: &[String]) -> ApiResult<()> {
        let scratch = tempfile::tempdir()
            .map_err(|e| load_error(format!("cannot create build directory: {e}")))?;
        let gopath = std::env::join_paths(&self.env.gopath)
            .map_err(|e| load_error(format!("invalid GOPATH: {e}")))?;

        let mut cmd = Command::new(go_tool);
        cmd.arg("build");
        if !build_tags.is_empty() {
            cmd.arg(format!("-tags={}", build_tags.join(",")));
        }
        cmd.args(roots)
            .current_dir(scratch.path())
            .env("GOROOT", &self.env.goroot)
            .env("GOPATH", gopath)
            .env("GO111MODULE", "off")
            .env("GOOS", &self.env.goos)
            .env("GOARCH", &self.env.goarch)
            .env("GOFLAGS", "")
            .stdin(Stdio::null());

        debug!(tool = %go_tool.display(), ?roots, "type checking");
        let output = cmd
            .output()
            .map_err(|e| load_error(format!("cannot run {}: {e}", go_tool.display())))?;
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = match stderr.trim() {
            "" => stdout.trim(),
            trimmed => trimmed,
        };
        if detail.is_empty() {
            return Err(load_error(format!("type checking failed: {}", output.status)));
        }
        Err(load_error(format!("type checking failed:\n{detail}")))
    }
}

fn load_error(msg: impl Into<String>) -> ApiError {
    ApiError::Load(msg.into())
}

fn is_local_arg(arg: &str) -> bool {
    arg == "."
        || arg == ".."
        || arg.starts_with("./")
        || arg.starts_with("../")
        || Path::new(arg).is_absolute()
}

struct LoadSession {
    ctx: BuildContext,
    roots: Vec<PathBuf>,
    packages: HashMap<String, Arc<PackageInfo>>,
    fset: FileSet,
    /// Import paths currently being loaded, for cycle detection.
    stack: Vec<String>,
}

impl LoadSession {
    fn resolve_arg(&self, arg: &str, cwd: &Path) -> ApiResult<(String, PathBuf)> {
        if is_local_arg(arg) {
            let dir = cwd
                .join(arg)
                .canonicalize()
                .map_err(|e| load_error(format!("cannot find package {arg:?}: {e}")))?;
            Ok((self.import_path_for_dir(&dir), dir))
        } else {
            let dir = self.find_import(arg)?;
            Ok((arg.to_string(), dir))
        }
    }

    /// Import path of a local directory: relative to the first source root
    /// containing it, or the directory itself when outside every root.
    fn import_path_for_dir(&self, dir: &Path) -> String {
        self.roots
            .iter()
            .find_map(|root| dir.strip_prefix(root).ok())
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_else(|| dir.to_string_lossy().into_owned())
    }

    fn find_import(&self, import_path: &str) -> ApiResult<PathBuf> {
        if let Some(dir) = self
            .roots
            .iter()
            .map(|root| root.join(import_path))
            .find(|dir| dir.is_dir())
        {
            return dir
                .canonicalize()
                .map_err(|e| load_error(format!("cannot read package {import_path:?}: {e}")));
        }
        let tried = self
            .roots
            .iter()
            .map(|root| format!("\t{}", root.join(import_path).display()))
            .collect::<Vec<_>>()
            .join("\n");
        Err(load_error(format!(
            "cannot find package {import_path:?} in any of:\n{tried}"
        )))
    }

    fn resolve_import(&self, import: &str, from_dir: &Path) -> ApiResult<(String, PathBuf)> {
        if import.starts_with("./") || import.starts_with("../") {
            let dir = from_dir
                .join(import)
                .canonicalize()
                .map_err(|e| load_error(format!("cannot find package {import:?}: {e}")))?;
            return Ok((self.import_path_for_dir(&dir), dir));
        }
        Ok((import.to_string(), self.find_import(import)?))
    }

    fn load_package(&mut self, import_path: &str, dir: &Path) -> ApiResult<()> {
        if self.packages.contains_key(import_path) {
            return Ok(());
        }
        if let Some(start) = self.stack.iter().position(|p| p == import_path) {
            let mut cycle: Vec<&str> = self.stack[start..].iter().map(String::as_str).collect();
            cycle.push(import_path);
            return Err(load_error(format!(
                "import cycle not allowed: {}",
                cycle.join(" -> ")
            )));
        }

        self.stack.push(import_path.to_string());
        let result = self.load_package_files(import_path, dir);
        self.stack.pop();
        let (info, sources) = result?;

        for (path, content) in &sources {
            self.fset.add_file(path.clone(), content);
        }
        self.packages.insert(import_path.to_string(), Arc::new(info));
        Ok(())
    }

    fn load_package_files(
        &mut self,
        import_path: &str,
        dir: &Path,
    ) -> ApiResult<(PackageInfo, Vec<(PathBuf, String)>)> {
        let candidates = candidate_files(dir)
            .map_err(|e| load_error(format!("cannot read package {import_path:?}: {e}")))?;

        let parsed: Vec<(PathBuf, String, FileHeader)> = candidates
            .par_iter()
            .map(|path| {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| load_error(format!("{}: {e}", path.display())))?;
                let header = parse_header(&content)
                    .map_err(|e| load_error(format!("{}: {e}", path.display())))?;
                Ok((path.clone(), content, header))
            })
            .collect::<ApiResult<_>>()?;

        let mut name: Option<String> = None;
        let mut imports = BTreeSet::new();
        let mut sources = Vec::new();
        for (path, content, header) in parsed {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let included = self
                .ctx
                .should_build(&file_name, &header)
                .map_err(|e| load_error(format!("{}: {e}", path.display())))?;
            if !included || header.package == "documentation" {
                continue;
            }
            match &name {
                Some(existing) if *existing != header.package => {
                    return Err(load_error(format!(
                        "found packages {} and {} in {}",
                        existing,
                        header.package,
                        dir.display()
                    )));
                }
                Some(_) => {}
                None => name = Some(header.package.clone()),
            }
            imports.extend(
                header
                    .imports
                    .into_iter()
                    .filter(|i| i != CGO_PSEUDO_PACKAGE),
            );
            sources.push((path, content));
        }

        let Some(name) = name else {
            return Err(load_error(format!(
                "no buildable Go source files in {}",
                dir.display()
            )));
        };

        let mut resolved_imports = Vec::with_capacity(imports.len());
        for import in &imports {
            let (dep_path, dep_dir) = self.resolve_import(import, dir)?;
            self.load_package(&dep_path, &dep_dir)?;
            resolved_imports.push(dep_path);
        }

        let info = PackageInfo {
            import_path: import_path.to_string(),
            name,
            dir: dir.to_path_buf(),
            files: sources.iter().map(|(p, _)| p.clone()).collect(),
            imports: resolved_imports,
        };
        Ok((info, sources))
    }
}

/// `.go` files of a directory that may take part in a build, sorted by name.
fn candidate_files(dir: &Path) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(".go")
            || name.ends_with("_test.go")
            || name.starts_with('_')
            || name.starts_with('.')
        {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_argument_detection() {
        assert!(is_local_arg("."));
        assert!(is_local_arg("./cmd/tool"));
        assert!(is_local_arg("../sibling"));
        assert!(!is_local_arg("image/png"));
        assert!(!is_local_arg("example.com/x"));
    }
}
