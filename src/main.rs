use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use harness_backup::backup::{run_backup, BackupFailure, BackupRequest};
use harness_backup::config::{Config, Overrides};
use harness_backup::harness::client::HarnessClient;
use harness_backup::resource::{list_kind, list_with_parent, ResourceKind, Scope};
use serde::Serialize;
use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Back up Harness projects and list their resources
#[derive(Parser, Debug)]
#[command(name = "harness-backup", version = harness_backup::VERSION, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Harness API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Items requested per listing page
    #[arg(long, global = true)]
    page_size: Option<u32>,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a project into a .tar.gz archive
    Backup(BackupArgs),
    /// Print every resource of one kind
    List(ListArgs),
}

#[derive(Args, Debug)]
struct CredentialArgs {
    /// API key (defaults to HARNESS_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Account identifier (defaults to HARNESS_ACCOUNT_ID, then the config file)
    #[arg(long)]
    account_id: Option<String>,
}

#[derive(Args, Debug)]
struct BackupArgs {
    /// Project identifier
    #[arg(long)]
    project: String,

    /// Organization identifier
    #[arg(long)]
    org: String,

    /// Archive path
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Only check that the project exists
    #[arg(long)]
    check: bool,

    #[command(flatten)]
    credentials: CredentialArgs,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(value_enum)]
    kind: ResourceKind,

    #[arg(long)]
    org: Option<String>,

    #[arg(long, requires = "org")]
    project: Option<String>,

    /// Parent environment, required for infrastructure definitions
    #[arg(long)]
    environment: Option<String>,

    #[arg(long, value_enum, default_value = "yaml")]
    format: OutputFormat,

    #[command(flatten)]
    credentials: CredentialArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Structured failure printed on stdout
#[derive(Debug, Serialize)]
struct FailureReport {
    failed: bool,
    msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl FailureReport {
    fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<BackupFailure>() {
            Some(failure) => Self {
                failed: true,
                msg: error_chain(&failure.source),
                stage: Some(failure.stage.to_string()),
                kind: failure.kind(),
            },
            None => Self {
                failed: true,
                msg: format!("{err:#}"),
                stage: None,
                kind: None,
            },
        }
    }
}

/// Join an error with its causes, skipping causes already quoted by their parent
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut msg = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        let text = inner.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        cause = inner.source();
    }
    msg
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&Path>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let Some(log_path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create log directory {}", parent.display()))?;
        }
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Could not open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        "harness-backup {} started with log level: {:?}",
        harness_backup::VERSION,
        level
    );
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match setup_logging(cli.log_level, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => return fail(&err),
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

fn fail(err: &anyhow::Error) -> ExitCode {
    tracing::error!("{err:#}");
    let report = FailureReport::from_error(err);
    match serde_json::to_string(&report) {
        Ok(json) => println!("{json}"),
        Err(_) => println!("{{\"failed\":true}}"),
    }
    ExitCode::FAILURE
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let options = config.client_options(&Overrides {
        base_url: cli.base_url,
        timeout_secs: cli.timeout_secs,
        page_size: cli.page_size,
    })?;

    match cli.command {
        Command::Backup(args) => {
            let creds = config.credentials(
                args.credentials.api_key.as_deref(),
                args.credentials.account_id.as_deref(),
            )?;
            let client = HarnessClient::new(&creds, options)?;

            let mut request = BackupRequest::new(args.org, args.project);
            request.dest = args.dest;
            request.check_mode = args.check;
            request.work_dir =
                std::env::current_dir().context("Could not determine working directory")?;

            let report = run_backup(&client, &request).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::List(args) => {
            let creds = config.credentials(
                args.credentials.api_key.as_deref(),
                args.credentials.account_id.as_deref(),
            )?;
            let client = HarnessClient::new(&creds, options)?;
            let scope = Scope::from_parts(
                client.account_id(),
                args.org.as_deref(),
                args.project.as_deref(),
            )?;

            let items = match args.environment.as_deref() {
                Some(env) => list_with_parent(&client, args.kind, &scope, Some(env)).await?,
                None => list_kind(&client, args.kind, &scope).await?,
            };
            tracing::info!("Listed {} {}", items.len(), args.kind);

            match args.format {
                OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&items)?),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
            }
        }
    }
    Ok(())
}
