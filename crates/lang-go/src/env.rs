use std::path::PathBuf;

const DEFAULT_GOROOT: &str = "/usr/local/go";

/// Where package sources live and which platform files are selected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoEnv {
    pub goroot: PathBuf,
    pub gopath: Vec<PathBuf>,
    pub goos: String,
    pub goarch: String,
}

impl GoEnv {
    /// Read `GOROOT`, `GOPATH`, `GOOS` and `GOARCH`, falling back to the
    /// host platform and the conventional install locations.
    pub fn from_env() -> Self {
        let goroot = std::env::var_os("GOROOT")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GOROOT));

        let gopath = match std::env::var_os("GOPATH").filter(|v| !v.is_empty()) {
            Some(value) => std::env::split_paths(&value).collect(),
            None => dirs::home_dir()
                .map(|home| vec![home.join("go")])
                .unwrap_or_default(),
        };

        let goos = std::env::var("GOOS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| host_goos().to_string());
        let goarch = std::env::var("GOARCH")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| host_goarch().to_string());

        Self {
            goroot,
            gopath,
            goos,
            goarch,
        }
    }

    /// Directories import paths are resolved against, in search order.
    pub fn src_roots(&self) -> Vec<PathBuf> {
        std::iter::once(self.goroot.join("src"))
            .chain(self.gopath.iter().map(|p| p.join("src")))
            .collect()
    }

    /// The `go` executable shipped with `GOROOT`, else `go` from `PATH`.
    pub fn go_tool(&self) -> PathBuf {
        let bundled = self
            .goroot
            .join("bin")
            .join(format!("go{}", std::env::consts::EXE_SUFFIX));
        if bundled.is_file() {
            bundled
        } else {
            PathBuf::from("go")
        }
    }
}

pub fn host_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

pub fn host_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_src_roots_order() {
        let env = GoEnv {
            goroot: PathBuf::from("/go"),
            gopath: vec![PathBuf::from("/a"), PathBuf::from("/b")],
            goos: "linux".to_string(),
            goarch: "amd64".to_string(),
        };
        assert_eq!(
            env.src_roots(),
            vec![
                PathBuf::from("/go/src"),
                PathBuf::from("/a/src"),
                PathBuf::from("/b/src")
            ]
        );
    }

    #[test]
    fn test_go_tool_prefers_goroot() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = GoEnv {
            goroot: dir.path().to_path_buf(),
            gopath: vec![],
            goos: "linux".to_string(),
            goarch: "amd64".to_string(),
        };
        assert_eq!(env.go_tool(), PathBuf::from("go"));

        let bundled = dir
            .path()
            .join("bin")
            .join(format!("go{}", std::env::consts::EXE_SUFFIX));
        std::fs::create_dir_all(bundled.parent().unwrap()).unwrap();
        std::fs::write(&bundled, "").unwrap();
        assert_eq!(env.go_tool(), bundled);

        env.goroot = PathBuf::from("/nonexistent/goroot");
        assert_eq!(env.go_tool(), PathBuf::from("go"));
    }

    #[test]
    fn test_host_names_use_go_spelling() {
        assert_ne!(host_goos(), "macos");
        assert_ne!(host_goarch(), "x86_64");
        assert_ne!(host_goarch(), "aarch64");
    }
}
