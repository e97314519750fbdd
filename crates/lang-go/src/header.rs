//! Reader for the head of a Go source file: build constraints, the package
//! clause and the import declarations. Everything after the first
//! declaration that is not an import is ignored.

use crate::queries::HeaderIndices;
use once_cell::sync::Lazy;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor, StreamingIterator};

/// Cached header query, compiled once per process.
static HEADER_QUERY: Lazy<Query> = Lazy::new(|| {
    Query::new(&go_language(), include_str!("queries/go_header.scm"))
        .expect("Failed to load Go header query - this is a fatal error")
});

fn go_language() -> Language {
    tree_sitter_go::LANGUAGE.into()
}

/// What the loader needs to know about one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeader {
    pub package: String,
    pub imports: Vec<String>,
    /// Expression of a `//go:build` line, if any.
    pub go_build: Option<String>,
    /// Bodies of `// +build` lines.
    pub plus_build: Vec<String>,
}

/// Byte ranges of the header: where the package clause starts and where
/// the last import declaration ends.
struct HeaderSpan {
    package_start: usize,
    end: usize,
}

/// Parse the header of a Go source file.
pub fn parse_header(src: &str) -> Result<FileHeader, String> {
    let src = src.strip_prefix('\u{feff}').unwrap_or(src);

    let mut parser = Parser::new();
    parser
        .set_language(&go_language())
        .map_err(|e| e.to_string())?;
    let tree = parser
        .parse(src, None)
        .ok_or_else(|| "failed to parse Go source".to_string())?;

    let span = header_span(tree.root_node())?;
    let query = &*HEADER_QUERY;
    let indices = HeaderIndices::new(query)?;

    let mut header = FileHeader::default();
    let mut imports = Vec::new();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), src.as_bytes());
    while let Some(mat) = matches.next() {
        for cap in mat.captures {
            let node = cap.node;
            if node.start_byte() >= span.end {
                continue;
            }
            let text = &src[node.byte_range()];
            if cap.index == indices.comment {
                if node.end_byte() <= span.package_start {
                    read_constraint(text, &mut header);
                }
            } else if cap.index == indices.package {
                header.package = text.to_string();
            } else if cap.index == indices.import_path {
                imports.push((node.start_byte(), import_path(text)?));
            }
        }
    }

    imports.sort_by_key(|(start, _)| *start);
    header.imports = imports.into_iter().map(|(_, path)| path).collect();
    Ok(header)
}

/// Check the top-level nodes up to the first non-import declaration.
fn header_span(root: Node) -> Result<HeaderSpan, String> {
    let mut package_start = None;
    let mut end = 0;

    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.is_error() || child.is_missing() {
            return Err(format!("syntax error at line {}", line_of(child)));
        }
        if !child.is_named() || child.kind() == "comment" {
            continue;
        }
        match (child.kind(), package_start) {
            ("package_clause", None) => package_start = Some(child.start_byte()),
            ("import_declaration", Some(_)) => {}
            (_, None) => return Err("expected 'package' clause".to_string()),
            _ => break,
        }
        if child.has_error() {
            return Err(format!("malformed {} at line {}", child.kind(), line_of(child)));
        }
        end = child.end_byte();
    }

    let package_start = package_start.ok_or("expected 'package' clause")?;
    Ok(HeaderSpan { package_start, end })
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

fn read_constraint(comment: &str, header: &mut FileHeader) {
    let comment = comment.trim_end();
    if let Some(expr) = comment.strip_prefix("//go:build") {
        header.go_build = Some(expr.trim().to_string());
    } else if let Some(line) = comment.strip_prefix("// +build") {
        header.plus_build.push(line.trim().to_string());
    }
}

/// Strip the quotes of an interpreted or raw string literal.
fn import_path(literal: &str) -> Result<String, String> {
    let path = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .ok_or_else(|| format!("expected import path, found {literal}"))?;
    if path.is_empty() {
        return Err("empty import path".to_string());
    }
    Ok(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_grouped_imports() {
        let src = r#"// Copyright notice.

// Package demo does things.
package demo

import "fmt"

import (
	"net/http"
	str "strings"
	. "math"
	_ "image/png"
	`os`
)

func main() { fmt.Println() }
"#;
        let header = parse_header(src).unwrap();
        assert_eq!(header.package, "demo");
        assert_eq!(
            header.imports,
            vec!["fmt", "net/http", "strings", "math", "image/png", "os"]
        );
        assert!(header.go_build.is_none());
    }

    #[test]
    fn test_build_constraints_before_package() {
        let src = "//go:build linux && !cgo\n// +build linux,!cgo\n\n/* doc */\npackage sys\n\n// +build ignore\nimport \"unsafe\"\n";
        let header = parse_header(src).unwrap();
        assert_eq!(header.go_build.as_deref(), Some("linux && !cgo"));
        assert_eq!(header.plus_build, vec!["linux,!cgo"]);
        assert_eq!(header.imports, vec!["unsafe"]);
    }

    #[test]
    fn test_body_is_not_part_of_the_header() {
        let src = "\u{feff}package p\nimport \"a\"\nvar x = \"b\"\nimport \"c\"\n";
        let header = parse_header(src).unwrap();
        assert_eq!(header.package, "p");
        assert_eq!(header.imports, vec!["a"]);
    }

    #[test]
    fn test_malformed_headers() {
        assert!(parse_header("").is_err());
        assert!(parse_header("func main() {}").is_err());
        assert!(parse_header("package").is_err());
        assert!(parse_header("import \"a\"\npackage p\n").is_err());
        assert!(parse_header("package p\nimport (\n\"a\"\n").is_err());
        assert!(parse_header("package p\nimport \"\"\n").is_err());
    }
}
