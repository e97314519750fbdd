mod browser;

use augur_core::ServerConfig;
use augur_core::config::{DEFAULT_HTTP_ADDR, DEFAULT_ORACLE_TOOL, browser_url, split_tags};
use clap::{ArgAction, Parser};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

const STATIC_DIR_ENV: &str = "AUGUR_STATIC";

const AFTER_HELP: &str = "\
The --http flag specifies the HTTP service address (e.g. ':6060').

The --tags flag specifies comma separated tags to use when importing
code (e.g. 'foo,!darwin').

The --open flag determines whether the application should try to
open the browser. It is 'true' by default; '--open=false' keeps the
browser closed.

With -v every incoming query to the oracle is logged.

Examples:

Start augur with the scope of package oracle:
% augur golang.org/x/tools/cmd/oracle

Start augur with the scope of package image/png on port 8081,
but don't open the browser:
% augur --http=:8081 --open=false image/png

Package arguments are import paths (e.g. 'image/png') or local
directories ('.', './cmd/tool', absolute paths). Every package they
import is loaded as well.";

/// Web frontend for the Go source code oracle.
#[derive(Parser, Debug)]
#[command(name = "augur", version, after_long_help = AFTER_HELP)]
struct Cli {
    /// HTTP service address
    #[arg(long, value_name = "ADDR", default_value = DEFAULT_HTTP_ADDR)]
    http: String,

    /// Log every incoming query
    #[arg(short, long)]
    verbose: bool,

    /// Try to open the browser once the server is listening
    #[arg(long, value_name = "BOOL", default_value_t = true, action = ArgAction::Set)]
    open: bool,

    /// Comma separated build tags used when importing packages
    #[arg(long, value_name = "LIST", default_value = "")]
    tags: String,

    /// Directory served under /static
    #[arg(long, value_name = "DIR")]
    static_dir: Option<PathBuf>,

    /// Analysis tool executable
    #[arg(long, value_name = "PATH", default_value = DEFAULT_ORACLE_TOOL)]
    oracle: PathBuf,

    /// Packages making up the program to analyze
    #[arg(value_name = "PACKAGE", required = true)]
    packages: Vec<String>,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            listen_addr: self.http,
            verbose: self.verbose,
            open_browser: self.open,
            build_tags: split_tags(&self.tags),
            static_dir: resolve_static_dir(self.static_dir),
            oracle_tool: self.oracle,
            package_args: self.packages,
        }
    }
}

fn resolve_static_dir(flag: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = flag {
        return dir;
    }
    if let Some(dir) = std::env::var_os(STATIC_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("static")))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(augur_web::default_static_dir)
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(2);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.into_config();
    let _guard = augur_runtime::init_logging("server", true)?;
    let runtime = augur_runtime::build_runtime()?;
    runtime.block_on(serve(config))
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn Error>> {
    let ctx = tokio::task::spawn_blocking(move || augur_runtime::build_default_context(config))
        .await??;
    let ctx = Arc::new(ctx);

    let listener = TcpListener::bind(ctx.config().bind_addr()).await?;
    let url = browser_url(listener.local_addr()?);
    info!(
        packages = ctx.index().packages().len(),
        files = ctx.index().files().len(),
        %url,
        "serving"
    );

    if ctx.config().open_browser && !browser::open(&url) {
        println!("{url}");
    }

    axum::serve(listener, augur_web::build_router(ctx)).await?;
    Ok(())
}
