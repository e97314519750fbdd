//! Build constraints: which files of a package take part in the build.

use crate::env::GoEnv;
use crate::header::FileHeader;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static TAG_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.]+$").unwrap());

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

const LATEST_RELEASE: u32 = 21;

/// Platform and tag set files are selected against.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    tags: HashSet<String>,
}

impl BuildContext {
    pub fn new(env: &GoEnv, build_tags: &[String]) -> Self {
        let mut tags: HashSet<String> = build_tags.iter().cloned().collect();
        tags.insert("gc".to_string());
        for minor in 1..=LATEST_RELEASE {
            tags.insert(format!("go1.{minor}"));
        }
        Self {
            goos: env.goos.clone(),
            goarch: env.goarch.clone(),
            tags,
        }
    }

    pub fn matches_tag(&self, name: &str) -> bool {
        if name == self.goos || name == self.goarch || self.tags.contains(name) {
            return true;
        }
        match name {
            "linux" => self.goos == "android",
            "solaris" => self.goos == "illumos",
            "darwin" => self.goos == "ios",
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            _ => false,
        }
    }

    /// Whether a file with this name and header belongs to the build.
    pub fn should_build(&self, file_name: &str, header: &FileHeader) -> Result<bool, String> {
        if !self.good_os_arch_file(file_name) {
            return Ok(false);
        }
        if let Some(expr) = &header.go_build {
            return self.eval_expr(expr);
        }
        Ok(header
            .plus_build
            .iter()
            .all(|line| self.eval_plus_build_line(line)))
    }

    /// Apply the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` file name suffixes.
    pub fn good_os_arch_file(&self, file_name: &str) -> bool {
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let Some(idx) = stem.find('_') else {
            return true;
        };
        let parts: Vec<&str> = stem[idx..].split('_').collect();
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        let last = parts[n - 1];
        if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
            return self.matches_tag(last);
        }
        true
    }

    /// Evaluate one `// +build` line: space separated alternatives of
    /// comma separated terms.
    pub fn eval_plus_build_line(&self, line: &str) -> bool {
        line.split_whitespace().any(|alternative| {
            alternative.split(',').all(|term| match term.strip_prefix('!') {
                Some(name) => TAG_NAME.is_match(name) && !self.matches_tag(name),
                None => TAG_NAME.is_match(term) && self.matches_tag(term),
            })
        })
    }

    /// Evaluate a `//go:build` expression.
    pub fn eval_expr(&self, expr: &str) -> Result<bool, String> {
        let tokens = tokenize(expr)?;
        let mut parser = ExprParser {
            tokens: &tokens,
            pos: 0,
            ctx: self,
        };
        let value = parser.or()?;
        if parser.pos != tokens.len() {
            return Err(format!("unexpected token in build constraint: {expr}"));
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Not,
    And,
    Or,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            ' ' | '\t' => {}
            '!' => tokens.push(Token::Not),
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '&' | '|' => {
                if chars.next().map(|(_, n)| n) != Some(c) {
                    return Err(format!("invalid operator in build constraint: {expr}"));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                let mut end = i + c.len_utf8();
                while let Some(&(j, n)) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' || n == '.' {
                        end = j + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(expr[i..end].to_string()));
            }
            other => {
                return Err(format!(
                    "unexpected character {other:?} in build constraint: {expr}"
                ));
            }
        }
    }
    Ok(tokens)
}

struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    ctx: &'a BuildContext,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or(&mut self) -> Result<bool, String> {
        let mut value = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and(&mut self) -> Result<bool, String> {
        let mut value = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.not()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn not(&mut self) -> Result<bool, String> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(!self.not()?);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<bool, String> {
        match self.tokens.get(self.pos).cloned() {
            Some(Token::LParen) => {
                self.pos += 1;
                let value = self.or()?;
                if self.peek() != Some(&Token::RParen) {
                    return Err("missing ) in build constraint".to_string());
                }
                self.pos += 1;
                Ok(value)
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(self.ctx.matches_tag(&name))
            }
            _ => Err("malformed build constraint".to_string()),
        }
    }
}
