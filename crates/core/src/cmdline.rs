/// Name of the standalone analysis tool a rendered command line invokes.
pub const ORACLE_TOOL_NAME: &str = "oracle";

/// What the command line would look like if the oracle were invoked directly
/// with the given arguments. Tokens are space-joined without quoting.
pub fn render_command_line(mode: &str, pos: &str, format: &str, scope: &[String]) -> String {
    format!(
        "{} -pos={} -format={} {} {}",
        ORACLE_TOOL_NAME,
        pos,
        format,
        mode,
        scope.join(" ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_fixed_token_order() {
        assert_eq!(
            render_command_line("callers", "foo.go:10:2", "json", &["example.com/pkg".to_string()]),
            "oracle -pos=foo.go:10:2 -format=json callers example.com/pkg"
        );
    }

    #[test]
    fn test_scope_is_space_joined() {
        let scope = vec!["image/png".to_string(), "net/http".to_string()];
        assert_eq!(
            render_command_line("pointsto", "/x/a.go:#12,#15", "plain", &scope),
            "oracle -pos=/x/a.go:#12,#15 -format=plain pointsto image/png net/http"
        );
    }

    #[test]
    fn test_empty_inputs_still_render() {
        assert_eq!(
            render_command_line("callgraph", "", "plain", &[]),
            "oracle -pos= -format=plain callgraph "
        );
    }
}
