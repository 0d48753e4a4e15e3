//! copilot-relay - relay task instructions to a local editor extension.
//!
//! Composes instructions from command-line arguments, an interactive line
//! loop or a terminal form, and posts each one as JSON to the extension's
//! `/message` endpoint on localhost.

mod client;
mod compose;
mod config;
mod error;
mod protocol;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use client::form::FormResult;
use client::{report_outcome, DeliveryClient};
use compose::{compose_message, InfoSource, ProjectFields};
use config::{Config, Overrides};
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "copilot-relay")]
#[command(author, version, about = "Relay task instructions to a local editor extension")]
#[command(long_about = "Sends a message (optionally with a file) to the editor extension listening on localhost.\n\nRun without a message to enter interactive mode.")]
struct Cli {
    /// Message to send; omit to read messages interactively
    #[arg(value_name = "MESSAGE")]
    message: Option<String>,

    /// Files to attach; the first one that exists is sent
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Listener port (default: 12345)
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Listener host (default: localhost)
    #[arg(long, global = true)]
    host: Option<String>,

    /// Request timeout in seconds (default: 10)
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<f64>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose a project task instruction and send it
    Project {
        #[command(flatten)]
        fields: FieldArgs,

        /// Print the composed message without validating or sending
        #[arg(long)]
        preview: bool,
    },
    /// Fill in a project task in a terminal form with live preview
    Form {
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Default)]
struct FieldArgs {
    /// Technology (method) name
    #[arg(long, value_name = "NAME")]
    technology: Option<String>,

    /// Benchmark (dataset) name
    #[arg(long, value_name = "NAME")]
    benchmark: Option<String>,

    /// Path of the technology
    #[arg(long, value_name = "PATH")]
    technology_path: Option<String>,

    /// Path of the benchmark
    #[arg(long, value_name = "PATH")]
    benchmark_path: Option<String>,

    /// Where the additional information comes from
    /// (paper-technology, paper-benchmark, homepage-technology, homepage-benchmark, custom)
    #[arg(long, value_name = "KEY")]
    source: Option<InfoSource>,

    /// Source text when --source custom
    #[arg(long, value_name = "TEXT")]
    custom_source: Option<String>,

    /// Additional information to include
    #[arg(long, value_name = "TEXT")]
    info: Option<String>,
}

impl FieldArgs {
    fn into_fields(self, default_source: InfoSource) -> ProjectFields {
        ProjectFields {
            technology_name: self.technology.unwrap_or_default(),
            benchmark_name: self.benchmark.unwrap_or_default(),
            technology_path: self.technology_path.unwrap_or_default(),
            benchmark_path: self.benchmark_path.unwrap_or_default(),
            info_source: self.source.unwrap_or(default_source),
            custom_source: self.custom_source.unwrap_or_default(),
            additional_info: self.info.unwrap_or_default(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = Config::load()?.with_overrides(Overrides {
        host: cli.host,
        port: cli.port,
        timeout_secs: cli.timeout,
    });
    debug!("Listener endpoint: {}", config.client.endpoint());

    let ok = match cli.command {
        Some(Commands::Project { fields, preview }) => handle_project(&config, fields, preview).await?,
        Some(Commands::Form { fields }) => handle_form(&config, fields).await?,
        Some(Commands::Config { init }) => handle_config(&config, init)?,
        None => match cli.message {
            Some(message) => handle_send(&config, &message, &cli.files).await?,
            None => handle_interactive(&config).await?,
        },
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Log to stderr so stdout only carries results.
fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("copilot_relay={}", level).parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();
    Ok(())
}

/// Send one message from the command line.
async fn handle_send(config: &Config, message: &str, files: &[PathBuf]) -> Result<bool> {
    let client = DeliveryClient::new(config.client.clone())?;
    let outcome = client.send(message, files).await;
    Ok(report_outcome(&outcome, &mut io::stdout())?)
}

/// Read and send messages until an exit word.
async fn handle_interactive(config: &Config) -> Result<bool> {
    let client = DeliveryClient::new(config.client.clone())?;
    let show_prompt = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();

    let stats = client::repl::run_repl(&client, stdin.lock(), &mut io::stdout(), show_prompt).await?;
    info!("Interactive session ended: {} sent, {} failed", stats.sent, stats.failed);
    Ok(stats.all_delivered())
}

/// Compose a project task and send it, or only preview it.
async fn handle_project(config: &Config, args: FieldArgs, preview: bool) -> Result<bool> {
    let fields = args.into_fields(config.project.info_source);

    if preview {
        println!("{}", compose_message(&fields));
        return Ok(true);
    }

    if let Err(e) = fields.validate() {
        eprintln!("Error: {}", e);
        return Ok(false);
    }

    send_project(config, &fields).await
}

/// Run the form, then send what was submitted.
async fn handle_form(config: &Config, args: FieldArgs) -> Result<bool> {
    let initial = args.into_fields(config.project.info_source);

    match client::form::run_form(initial).context("Failed to run the project form")? {
        FormResult::Submit(fields) => send_project(config, &fields).await,
        FormResult::Cancelled => {
            eprintln!("Cancelled");
            Ok(true)
        }
    }
}

/// Paths are only referenced in the text, never attached.
async fn send_project(config: &Config, fields: &ProjectFields) -> Result<bool> {
    let message = compose_message(fields);
    let client = DeliveryClient::new(config.client.clone())?;
    let outcome = client.send::<PathBuf>(&message, &[]).await;
    Ok(report_outcome(&outcome, &mut io::stdout())?)
}

/// Print the effective configuration.
fn handle_config(config: &Config, init: bool) -> Result<bool> {
    let path = Config::config_path()?;

    if init && !path.exists() {
        Config::default().save()?;
        println!("Created default config at {}", path.display());
    }

    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("(not present, using defaults)");
    }
    println!();
    print!("{}", toml::to_string_pretty(config).context("Failed to render configuration")?);
    Ok(true)
}
