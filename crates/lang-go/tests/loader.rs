use augur_api::{ApiError, ProgramLoader, ProgramSnapshot};
use augur_go::{GoEnv, GoLoader};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

struct Workspace {
    _dir: TempDir,
    goroot: PathBuf,
    gopath: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let goroot = root.join("goroot");
        let gopath = root.join("gopath");
        fs::create_dir_all(goroot.join("src")).unwrap();
        fs::create_dir_all(gopath.join("src")).unwrap();
        Self {
            _dir: dir,
            goroot,
            gopath,
        }
    }

    fn std_file(&self, rel: &str, content: &str) -> PathBuf {
        write(&self.goroot.join("src").join(rel), content)
    }

    fn file(&self, rel: &str, content: &str) -> PathBuf {
        write(&self.gopath.join("src").join(rel), content)
    }

    fn loader(&self, cwd: &Path) -> GoLoader {
        let env = GoEnv {
            goroot: self.goroot.clone(),
            gopath: vec![self.gopath.clone()],
            goos: "linux".to_string(),
            goarch: "amd64".to_string(),
        };
        GoLoader::new(env, cwd.to_path_buf())
    }

    fn load(&self, args: &[&str], tags: &[&str]) -> Result<ProgramSnapshot, ApiError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        self.loader(&self.gopath).load(&args, &tags)
    }
}

fn write(path: &Path, content: &str) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    path.to_path_buf()
}

fn load_err(result: Result<ProgramSnapshot, ApiError>) -> String {
    match result {
        Ok(_) => panic!("expected load failure"),
        Err(e) => e.to_string(),
    }
}

#[test]
fn test_loads_imports_transitively() {
    let ws = Workspace::new();
    ws.std_file("fmt/print.go", "package fmt\n\nimport \"io\"\n");
    ws.std_file("io/io.go", "package io\n");
    let main = ws.file(
        "example.com/app/main.go",
        "package main\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/util\"\n)\n\nfunc main() { fmt.Println(util.X) }\n",
    );
    ws.file("example.com/app/util/util.go", "package util\n\nvar X = 1\n");

    let snapshot = ws.load(&["example.com/app"], &[]).unwrap();

    assert_eq!(snapshot.roots, vec!["example.com/app"]);
    let mut paths: Vec<&str> = snapshot.packages.keys().map(String::as_str).collect();
    paths.sort();
    assert_eq!(paths, vec!["example.com/app", "example.com/app/util", "fmt", "io"]);

    let app = snapshot.package("example.com/app").unwrap();
    assert_eq!(app.name, "main");
    assert_eq!(app.files, vec![main.clone()]);
    assert_eq!(app.imports, vec!["example.com/app/util", "fmt"]);
    assert_eq!(snapshot.fset.len(), 4);
    assert!(snapshot.fset.file(&main).is_some());
}

#[test]
fn test_build_constraints_select_files() {
    let ws = Workspace::new();
    let plain = ws.file("example.com/p/p.go", "package p\n");
    ws.file("example.com/p/p_windows.go", "package p\n");
    let linux = ws.file("example.com/p/p_linux_amd64.go", "package p\n");
    let tagged = ws.file("example.com/p/extra.go", "//go:build extra\n\npackage p\n");
    ws.file("example.com/p/ignored.go", "// +build ignore\n\npackage main\n");
    ws.file("example.com/p/p_test.go", "package p_test\n");
    ws.file("example.com/p/_scratch.go", "package scratch\n");

    let snapshot = ws.load(&["example.com/p"], &[]).unwrap();
    assert_eq!(
        snapshot.package("example.com/p").unwrap().files,
        vec![plain.clone(), linux.clone()]
    );

    let snapshot = ws.load(&["example.com/p"], &["extra"]).unwrap();
    assert_eq!(
        snapshot.package("example.com/p").unwrap().files,
        vec![tagged, plain, linux]
    );
}

#[test]
fn test_missing_import_fails_the_load() {
    let ws = Workspace::new();
    ws.file("example.com/a/a.go", "package a\n\nimport \"example.com/gone\"\n");

    let msg = load_err(ws.load(&["example.com/a"], &[]));
    assert!(msg.contains("cannot find package \"example.com/gone\""), "{msg}");
}

#[test]
fn test_import_cycle_is_reported() {
    let ws = Workspace::new();
    ws.file("example.com/a/a.go", "package a\n\nimport \"example.com/b\"\n");
    ws.file("example.com/b/b.go", "package b\n\nimport \"example.com/a\"\n");

    let msg = load_err(ws.load(&["example.com/a"], &[]));
    assert!(
        msg.contains("import cycle not allowed: example.com/a -> example.com/b -> example.com/a"),
        "{msg}"
    );
}

#[test]
fn test_mixed_package_names_fail() {
    let ws = Workspace::new();
    ws.file("example.com/m/a.go", "package alpha\n");
    ws.file("example.com/m/b.go", "package beta\n");

    let msg = load_err(ws.load(&["example.com/m"], &[]));
    assert!(msg.contains("found packages alpha and beta"), "{msg}");
}

#[test]
fn test_directory_without_buildable_files_fails() {
    let ws = Workspace::new();
    ws.file("example.com/w/w_windows.go", "package w\n");

    let msg = load_err(ws.load(&["example.com/w"], &[]));
    assert!(msg.contains("no buildable Go source files"), "{msg}");
}

#[test]
fn test_local_argument_resolves_to_import_path() {
    let ws = Workspace::new();
    ws.file("example.com/tool/main.go", "package main\n");

    let cwd = ws.gopath.join("src/example.com");
    let snapshot = ws
        .loader(&cwd)
        .load(&["./tool".to_string()], &[])
        .unwrap();
    assert_eq!(snapshot.roots, vec!["example.com/tool"]);
    assert!(snapshot.package("example.com/tool").is_some());
}

#[test]
fn test_no_arguments_is_an_error() {
    let ws = Workspace::new();
    assert!(ws.load(&[], &[]).is_err());
}

#[cfg(unix)]
fn go_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// Both go tools are written and run from one test so no other thread holds a
// writable descriptor while a child is spawned.
#[cfg(unix)]
#[test]
fn test_type_check_runs_go_build() {
    let ws = Workspace::new();
    ws.file(
        "example.com/app/main.go",
        "package main\n\nvar x int = \"not an int\"\n\nfunc main() { undefinedCall() }\n",
    );
    let tools = tempdir().unwrap();
    let passing = go_stub(
        tools.path(),
        "go-ok",
        "[ \"$GO111MODULE\" = off ] && [ \"$GOOS\" = linux ] && [ \"$1\" = build ]",
    );
    let failing = go_stub(
        tools.path(),
        "go-fail",
        "echo \"main.go:5:15: undefined: undefinedCall ($*)\" >&2 ; exit 1",
    );

    let args = vec!["example.com/app".to_string()];
    let snapshot = ws
        .loader(&ws.gopath)
        .with_type_check(passing)
        .load(&args, &[])
        .unwrap();
    assert_eq!(snapshot.roots, args);

    let msg = load_err(
        ws.loader(&ws.gopath)
            .with_type_check(failing)
            .load(&args, &["netgo".to_string(), "extra".to_string()]),
    );
    assert!(msg.contains("type checking failed"), "{msg}");
    assert!(msg.contains("undefined: undefinedCall"), "{msg}");
    assert!(msg.contains("build -tags=netgo,extra example.com/app"), "{msg}");

    let missing = tools.path().join("no-such-go");
    let msg = load_err(ws.loader(&ws.gopath).with_type_check(missing).load(&args, &[]));
    assert!(msg.contains("no-such-go"), "{msg}");
}
