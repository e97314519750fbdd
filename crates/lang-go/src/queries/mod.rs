use tree_sitter::Query;

/// Capture indices of `go_header.scm`.
pub struct HeaderIndices {
    pub comment: u32,
    pub package: u32,
    pub import_path: u32,
}

impl HeaderIndices {
    pub fn new(query: &Query) -> Result<Self, String> {
        Ok(Self {
            comment: capture_index(query, "comment")?,
            package: capture_index(query, "package")?,
            import_path: capture_index(query, "import_path")?,
        })
    }
}

fn capture_index(query: &Query, name: &str) -> Result<u32, String> {
    query
        .capture_index_for_name(name)
        .ok_or_else(|| format!("capture '{name}' not found in query"))
}
