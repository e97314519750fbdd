//! Sorted, read-only listings derived from a program snapshot.

use augur_api::{PackageInfo, ProgramSnapshot};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Packages ordered by import path and files ordered by path.
///
/// Both sequences are materialized and sorted once, so their order never
/// depends on the snapshot's map iteration order.
#[derive(Debug, Clone, Default)]
pub struct ProgramIndex {
    packages: Vec<Arc<PackageInfo>>,
    files: Vec<PathBuf>,
}

impl ProgramIndex {
    pub fn build(snapshot: &ProgramSnapshot) -> Self {
        let mut packages: Vec<Arc<PackageInfo>> = snapshot.packages.values().cloned().collect();
        packages.sort_by(|a, b| a.import_path.as_bytes().cmp(b.import_path.as_bytes()));
        packages.dedup_by(|a, b| a.import_path == b.import_path);

        let mut files: Vec<PathBuf> = snapshot.fset.iter().map(|f| f.path.clone()).collect();
        files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        files.dedup();

        Self { packages, files }
    }

    pub fn packages(&self) -> &[Arc<PackageInfo>] {
        &self.packages
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn package(&self, import_path: &str) -> Option<&Arc<PackageInfo>> {
        self.packages
            .binary_search_by(|p| p.import_path.as_bytes().cmp(import_path.as_bytes()))
            .ok()
            .map(|i| &self.packages[i])
    }

    pub fn contains_package(&self, import_path: &str) -> bool {
        self.package(import_path).is_some()
    }

    pub fn contains_file(&self, path: &Path) -> bool {
        self.files
            .binary_search_by(|f| f.as_os_str().cmp(path.as_os_str()))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use augur_api::FileSet;

    fn package(path: &str) -> Arc<PackageInfo> {
        Arc::new(PackageInfo {
            import_path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            dir: PathBuf::from("/src").join(path),
            files: vec![],
            imports: vec![],
        })
    }

    fn snapshot(paths: &[&str], files: &[&str]) -> ProgramSnapshot {
        let mut fset = FileSet::new();
        for f in files {
            fset.add_file(PathBuf::from(f), "package x\n");
        }
        ProgramSnapshot {
            packages: paths.iter().map(|p| (p.to_string(), package(p))).collect(),
            fset,
            roots: vec![],
        }
    }

    #[test]
    fn test_packages_sorted_by_import_path() {
        let snap = snapshot(&["net/http", "fmt", "image/png", "image", "Zeta"], &[]);
        let index = ProgramIndex::build(&snap);
        let order: Vec<_> = index.packages().iter().map(|p| p.import_path.as_str()).collect();
        // byte order: uppercase sorts before lowercase
        assert_eq!(order, vec!["Zeta", "fmt", "image", "image/png", "net/http"]);
    }

    #[test]
    fn test_files_sorted_lexicographically() {
        let snap = snapshot(&[], &["/src/b/z.go", "/src/a/y.go", "/src/a/x.go", "/src/a-b/w.go"]);
        let index = ProgramIndex::build(&snap);
        let files: Vec<_> = index.files().iter().map(|f| f.to_str().unwrap()).collect();
        assert_eq!(
            files,
            vec!["/src/a-b/w.go", "/src/a/x.go", "/src/a/y.go", "/src/b/z.go"]
        );
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let paths: Vec<String> = (0..200).map(|i| format!("pkg/{:03}", (i * 37) % 200)).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let snap = snapshot(&refs, &[]);
        let first: Vec<_> = ProgramIndex::build(&snap)
            .packages()
            .iter()
            .map(|p| p.import_path.clone())
            .collect();
        for _ in 0..5 {
            let again: Vec<_> = ProgramIndex::build(&snap)
                .packages()
                .iter()
                .map(|p| p.import_path.clone())
                .collect();
            assert_eq!(first, again);
        }
        assert!(first.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_lookups() {
        let snap = snapshot(&["fmt", "os"], &["/src/fmt/print.go"]);
        let index = ProgramIndex::build(&snap);
        assert!(index.contains_package("fmt"));
        assert!(!index.contains_package("fm"));
        assert!(index.contains_file(Path::new("/src/fmt/print.go")));
        assert!(!index.contains_file(Path::new("/src/fmt/scan.go")));
    }

    #[test]
    fn test_empty_snapshot_gives_empty_index() {
        let index = ProgramIndex::build(&ProgramSnapshot::default());
        assert!(index.packages().is_empty());
        assert!(index.files().is_empty());
    }
}
