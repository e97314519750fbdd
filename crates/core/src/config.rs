use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_ORACLE_TOOL: &str = "oracle";

/// Everything the service needs to start, as resolved from the command line.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub verbose: bool,
    pub open_browser: bool,
    pub build_tags: Vec<String>,
    pub static_dir: PathBuf,
    pub oracle_tool: PathBuf,
    pub package_args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_HTTP_ADDR.to_string(),
            verbose: false,
            open_browser: true,
            build_tags: Vec::new(),
            static_dir: PathBuf::from("static"),
            oracle_tool: PathBuf::from(DEFAULT_ORACLE_TOOL),
            package_args: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Address to bind. A bare `:port` listens on all interfaces.
    pub fn bind_addr(&self) -> String {
        normalize_listen_addr(&self.listen_addr)
    }
}

pub fn normalize_listen_addr(addr: &str) -> String {
    if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    }
}

/// Split a comma separated tag list, dropping empty entries.
pub fn split_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// URL a local browser should open for a bound listener.
pub fn browser_url(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() || addr.ip().is_loopback() {
        format!("http://localhost:{}/", addr.port())
    } else {
        format!("http://{addr}/")
    }
}
