//! urlmd CLI - serve the URL to markdown gateway, or convert one URL

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use urlmd::{normalize_url, Gateway, GatewayBuilder, GatewayError};

/// Output format for convert subcommand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Converted content as is
    #[default]
    Md,
    /// JSON report
    Json,
}

/// urlmd - convert any URL to markdown over HTTP
#[derive(Parser, Debug)]
#[command(name = "urlmd")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Serve options, used when no subcommand is given
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP gateway (default)
    Serve(ServeArgs),
    /// Convert a single URL and print the result
    Convert {
        /// URL to convert; missing or malformed schemes are repaired
        url: String,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,

        #[command(flatten)]
        conversion: ConversionArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "URLMD_BIND", default_value = "0.0.0.0:8000")]
    bind: SocketAddr,

    /// Only convert URLs starting with one of these prefixes
    #[arg(long = "allow-prefix", value_name = "PREFIX")]
    allow_prefixes: Vec<String>,

    /// Never convert URLs starting with one of these prefixes
    #[arg(long = "block-prefix", value_name = "PREFIX")]
    block_prefixes: Vec<String>,

    #[command(flatten)]
    conversion: ConversionArgs,
}

#[derive(Args, Debug, Clone)]
struct ConversionArgs {
    /// Conversion deadline in seconds
    #[arg(long, env = "URLMD_TIMEOUT_SECS", default_value_t = 25)]
    timeout_secs: u64,

    /// Custom User-Agent
    #[arg(long, env = "URLMD_USER_AGENT")]
    user_agent: Option<String>,
}

impl ConversionArgs {
    fn builder(&self) -> GatewayBuilder {
        let mut builder = Gateway::builder().timeout(Duration::from_secs(self.timeout_secs));
        if let Some(ref ua) = self.user_agent {
            builder = builder.user_agent(ua.clone());
        }
        builder
    }
}

impl ServeArgs {
    fn gateway(&self) -> Gateway {
        let mut builder = self.conversion.builder();
        for prefix in &self.allow_prefixes {
            builder = builder.allow_prefix(prefix.clone());
        }
        for prefix in &self.block_prefixes {
            builder = builder.block_prefix(prefix.clone());
        }
        builder.build()
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve(cli.serve));

    let default_level = match command {
        Commands::Serve(_) => "info",
        Commands::Convert { .. } => "warn",
    };
    init_tracing(default_level);

    match command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Convert {
            url,
            output,
            conversion,
        } => run_convert(&url, output, conversion).await,
    }
}

/// Log to stderr, filtered by RUST_LOG
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run_serve(args: ServeArgs) {
    let gateway = args.gateway();

    let listener = match tokio::net::TcpListener::bind(args.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %args.bind, "Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = urlmd::server::serve(listener, gateway, shutdown_signal()).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    warn!("Shutting down");
}

async fn run_convert(url: &str, output: OutputFormat, conversion: ConversionArgs) {
    let gateway = conversion.builder().build();
    let result = gateway.convert(url).await;
    let failed = result.is_err();

    match output {
        OutputFormat::Md => match result {
            Ok(content) => writeln_safe(&content),
            Err(e) => eprintln!("Error: {}", e),
        },
        OutputFormat::Json => {
            let report = ConvertReport::new(url, result);
            let json = serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
                eprintln!("Error serializing report: {}", e);
                std::process::exit(1);
            });
            writeln_safe(&json);
        }
    }

    if failed {
        std::process::exit(1);
    }
}

/// JSON output of the convert subcommand
#[derive(Debug, Serialize)]
struct ConvertReport {
    url: String,
    normalized_url: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ConvertReport {
    fn new(url: &str, result: Result<String, GatewayError>) -> Self {
        let normalized_url = normalize_url(url);
        match result {
            Ok(content) => Self {
                url: url.to_string(),
                normalized_url,
                status: 200,
                content: Some(content),
                error: None,
            },
            Err(e) => Self {
                url: url.to_string(),
                normalized_url,
                status: e.status().as_u16(),
                content: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
