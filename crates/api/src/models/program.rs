use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opaque global source position: an offset into the file set's address space.
pub type Pos = usize;

/// One source file registered in a [`FileSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// First global position belonging to this file.
    pub base: Pos,
    /// Size in bytes.
    pub size: usize,
    /// Byte offset at which each line starts; always begins with 0.
    pub line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(path: PathBuf, base: Pos, content: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1)
                .filter(|&start| start < content.len()),
        );
        Self {
            path,
            base,
            size: content.len(),
            line_starts,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a 1-based line and byte column into a byte offset.
    /// The column may point one past the last byte of the line.
    pub fn offset_of(&self, line: usize, col: usize) -> Option<usize> {
        if line == 0 || col == 0 {
            return None;
        }
        let start = *self.line_starts.get(line - 1)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.size);
        let offset = start.checked_add(col - 1)?;
        (offset <= end).then_some(offset)
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos >= self.base && pos <= self.base + self.size
    }
}

/// Position-resolution table for every file of a program.
///
/// Files occupy disjoint ranges of a single position space, so a [`Pos`] maps
/// back to exactly one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSet {
    files: Vec<SourceFile>,
    /// Path to index into `files`.
    by_path: HashMap<PathBuf, usize>,
    next_base: Pos,
}

impl FileSet {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            by_path: HashMap::new(),
            next_base: 1,
        }
    }

    /// Register a file and return the base position assigned to it.
    pub fn add_file(&mut self, path: PathBuf, content: &str) -> Pos {
        let base = self.next_base.max(1);
        let file = SourceFile::new(path, base, content);
        self.next_base = base + file.size + 1;
        self.by_path
            .entry(file.path.clone())
            .or_insert(self.files.len());
        self.files.push(file);
        base
    }

    /// The file owning a global position.
    pub fn file_for(&self, pos: Pos) -> Option<&SourceFile> {
        let idx = self.files.partition_point(|f| f.base <= pos);
        let file = self.files.get(idx.checked_sub(1)?)?;
        file.contains(pos).then_some(file)
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.by_path.get(path).map(|&i| &self.files[i])
    }

    /// Files in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A resolved package of the loaded program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub import_path: String,
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub imports: Vec<String>,
}

/// The loaded target program. Built once, never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ProgramSnapshot {
    pub packages: HashMap<String, Arc<PackageInfo>>,
    pub fset: FileSet,
    /// Import paths the package arguments resolved to.
    pub roots: Vec<String>,
}

impl ProgramSnapshot {
    pub fn package(&self, import_path: &str) -> Option<&Arc<PackageInfo>> {
        self.packages.get(import_path)
    }
}
