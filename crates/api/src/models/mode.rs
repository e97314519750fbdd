use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of question asked of the analysis engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Callees,
    Callers,
    Callgraph,
    Callstack,
    Describe,
    Freevars,
    Implements,
    Peers,
    Pointsto,
    Referrers,
    Whicherrs,
}

impl Mode {
    pub const ALL: [Mode; 11] = [
        Mode::Callees,
        Mode::Callers,
        Mode::Callgraph,
        Mode::Callstack,
        Mode::Describe,
        Mode::Freevars,
        Mode::Implements,
        Mode::Peers,
        Mode::Pointsto,
        Mode::Referrers,
        Mode::Whicherrs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Callees => "callees",
            Mode::Callers => "callers",
            Mode::Callgraph => "callgraph",
            Mode::Callstack => "callstack",
            Mode::Describe => "describe",
            Mode::Freevars => "freevars",
            Mode::Implements => "implements",
            Mode::Peers => "peers",
            Mode::Pointsto => "pointsto",
            Mode::Referrers => "referrers",
            Mode::Whicherrs => "whicherrs",
        }
    }

    /// Whether the mode is about a particular source location.
    /// Only the whole-program call graph is position-free.
    pub fn needs_position(&self) -> bool {
        !matches!(self, Mode::Callgraph)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ApiError::InvalidArgument(format!("unknown mode {:?}", s)))
    }
}

/// Output encoding requested for a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Plain => "plain",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(OutputFormat::Plain),
            "json" => Ok(OutputFormat::Json),
            other => Err(ApiError::InvalidArgument(format!(
                "unknown format {:?}",
                other
            ))),
        }
    }
}

/// Engine-defined answer to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutput {
    Text(String),
    Json(serde_json::Value),
}

impl AnalysisOutput {
    /// Render as text, pretty-printing JSON answers.
    pub fn to_text(&self) -> String {
        match self {
            AnalysisOutput::Text(text) => text.clone(),
            AnalysisOutput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }

    /// Render as a JSON value; text answers become a JSON string.
    pub fn into_json(self) -> serde_json::Value {
        match self {
            AnalysisOutput::Text(text) => serde_json::Value::String(text),
            AnalysisOutput::Json(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tokens_round_trip() {
        for mode in Mode::ALL {
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!("whocares".parse::<Mode>().is_err());
        assert!("Callers".parse::<Mode>().is_err());
        assert!("".parse::<Mode>().is_err());
    }

    #[test]
    fn test_only_callgraph_is_position_free() {
        let free: Vec<_> = Mode::ALL.iter().filter(|m| !m.needs_position()).collect();
        assert_eq!(free, vec![&Mode::Callgraph]);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Plain);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_output_rendering() {
        let text = AnalysisOutput::Text("main.go:3:1: func main".to_string());
        assert_eq!(text.to_text(), "main.go:3:1: func main");

        let json = AnalysisOutput::Json(serde_json::json!({"mode": "callers"}));
        assert_eq!(json.clone().into_json()["mode"], "callers");
        assert!(json.to_text().contains("\"callers\""));
    }
}
