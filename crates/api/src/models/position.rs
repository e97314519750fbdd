use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Location part of a position specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PosSpan {
    /// Byte offsets into the file, `#start` or `#start,#end`.
    Offsets { start: usize, end: usize },
    /// 1-based line and byte column.
    LineCol { line: usize, col: usize },
}

/// A source position as written on the oracle command line:
/// `file:#start`, `file:#start,#end` or `file:line:col`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPos {
    pub file: String,
    pub span: PosSpan,
}

impl QueryPos {
    pub fn offsets(file: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            file: file.into(),
            span: PosSpan::Offsets { start, end },
        }
    }

    pub fn line_col(file: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            file: file.into(),
            span: PosSpan::LineCol { line, col },
        }
    }
}

fn invalid(spec: &str, why: &str) -> ApiError {
    ApiError::InvalidArgument(format!("invalid position {:?}: {}", spec, why))
}

fn parse_offset(spec: &str, raw: &str) -> Result<usize, ApiError> {
    raw.parse::<usize>()
        .map_err(|_| invalid(spec, "offset is not a non-negative integer"))
}

impl FromStr for QueryPos {
    type Err = ApiError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        if let Some((file, rest)) = spec.rsplit_once(":#") {
            if file.is_empty() {
                return Err(invalid(spec, "missing file name"));
            }
            let (start, end) = match rest.split_once(",#") {
                Some((s, e)) => (parse_offset(spec, s)?, parse_offset(spec, e)?),
                None => {
                    let s = parse_offset(spec, rest)?;
                    (s, s)
                }
            };
            if end < start {
                return Err(invalid(spec, "end offset precedes start offset"));
            }
            return Ok(QueryPos::offsets(file, start, end));
        }

        let mut parts = spec.rsplitn(3, ':');
        let col = parts.next();
        let line = parts.next();
        let file = parts.next();
        match (file, line, col) {
            (Some(file), Some(line), Some(col)) if !file.is_empty() => {
                let line = line
                    .parse::<usize>()
                    .map_err(|_| invalid(spec, "line is not an integer"))?;
                let col = col
                    .parse::<usize>()
                    .map_err(|_| invalid(spec, "column is not an integer"))?;
                Ok(QueryPos::line_col(file, line, col))
            }
            _ => Err(invalid(spec, "expected file:#offset or file:line:col")),
        }
    }
}

impl fmt::Display for QueryPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            PosSpan::Offsets { start, end } if start == end => write!(f, "{}:#{}", self.file, start),
            PosSpan::Offsets { start, end } => write!(f, "{}:#{},#{}", self.file, start, end),
            PosSpan::LineCol { line, col } => write!(f, "{}:{}:{}", self.file, line, col),
        }
    }
}
