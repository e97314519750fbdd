//! Page rendering.

use augur_api::Mode;
use augur_core::ProgramIndex;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt::Write;
use std::path::Path;

/// Escape text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Bytes kept as-is in query-string values; `/` stays readable in file paths.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode a query-string value.
pub fn encode_query_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n</head>\n<body>\n{}\
         <script src=\"/static/app.js\"></script>\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn source_link(path: &Path) -> String {
    let path = path.to_string_lossy();
    format!(
        "<a href=\"/source?file={}\">{}</a>",
        escape(&encode_query_value(&path)),
        escape(&path)
    )
}

/// Landing page: query form, package listing and file listing.
pub fn index_page(index: &ProgramIndex, modes: &[Mode], roots: &[String]) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>Go source oracle</h1>");
    let _ = writeln!(
        body,
        "<p>{} packages loaded from {}.</p>",
        index.packages().len(),
        escape(&roots.join(" "))
    );

    body.push_str("<form id=\"query\" action=\"/query\" method=\"get\">\n<select name=\"mode\">\n");
    for mode in modes {
        let _ = writeln!(body, "<option value=\"{mode}\">{mode}</option>");
    }
    body.push_str(
        "</select>\n<input name=\"pos\" placeholder=\"file.go:#offset\" size=\"50\">\n\
         <select name=\"format\"><option>plain</option><option>json</option></select>\n\
         <input name=\"scope\" placeholder=\"scope packages\" size=\"30\">\n\
         <button type=\"submit\">Query</button>\n</form>\n<pre id=\"result\"></pre>\n",
    );

    body.push_str("<h2>Packages</h2>\n<table class=\"packages\">\n");
    for pkg in index.packages() {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{} files</td></tr>",
            escape(&pkg.import_path),
            escape(&pkg.name),
            pkg.files.len()
        );
    }
    body.push_str("</table>\n<h2>Files</h2>\n<ul class=\"files\">\n");
    for file in index.files() {
        let _ = writeln!(body, "<li>{}</li>", source_link(file));
    }
    body.push_str("</ul>\n");

    page("Go source oracle", &body)
}

/// Clamp a requested byte range to `content`, on char boundaries.
pub fn clamp_selection(content: &str, start: usize, end: usize) -> (usize, usize) {
    let mut start = start.min(content.len());
    let mut end = end.clamp(start, content.len());
    while !content.is_char_boundary(start) {
        start -= 1;
    }
    while !content.is_char_boundary(end) {
        end += 1;
    }
    (start, end)
}

/// A source file with the byte range `selection` highlighted.
pub fn source_page(path: &Path, content: &str, selection: Option<(usize, usize)>) -> String {
    let title = path.to_string_lossy();
    let mut body = format!(
        "<h1>{}</h1>\n<p><a href=\"/\">index</a> &middot; <a href=\"/file?path={}\">raw</a></p>\n<pre class=\"source\">",
        escape(&title),
        escape(&encode_query_value(&title))
    );
    match selection {
        Some((start, end)) => {
            let (start, end) = clamp_selection(content, start, end);
            body.push_str(&escape(&content[..start]));
            body.push_str("<span class=\"selection\">");
            body.push_str(&escape(&content[start..end]));
            body.push_str("</span>");
            body.push_str(&escape(&content[end..]));
        }
        None => body.push_str(&escape(content)),
    }
    body.push_str("</pre>\n");
    page(&title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("a<b> & \"c\" 'd'"),
            "a&lt;b&gt; &amp; &quot;c&quot; &#39;d&#39;"
        );
    }

    #[test]
    fn test_encode_query_value() {
        assert_eq!(encode_query_value("/src/a.go:#10,#12"), "/src/a.go%3A%2310%2C%2312");
        assert_eq!(encode_query_value("a b"), "a%20b");
        assert_eq!(encode_query_value("/x/été~_-.go"), "/x/%C3%A9t%C3%A9~_-.go");
        assert_eq!(encode_query_value("a&b=c+d"), "a%26b%3Dc%2Bd");
    }

    #[test]
    fn test_clamp_selection() {
        assert_eq!(clamp_selection("hello", 1, 3), (1, 3));
        assert_eq!(clamp_selection("hello", 4, 99), (4, 5));
        assert_eq!(clamp_selection("hello", 9, 2), (5, 5));
        assert_eq!(clamp_selection("hello", 3, 1), (3, 3));
        // "é" occupies bytes 1..3
        assert_eq!(clamp_selection("aéb", 2, 2), (1, 3));
    }

    #[test]
    fn test_source_page_highlights_selection() {
        let html = source_page(Path::new("/src/m.go"), "package m // <x>\n", Some((8, 9)));
        assert!(html.contains("package <span class=\"selection\">m</span> // &lt;x&gt;"));
    }
}
