//! iqueue CLI: run the dispatcher on alerts read from stdin.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use iqueue::config::Config;
use iqueue::config::secrets::SmtpCredentials;
use iqueue::decision::ProcessType;
use iqueue::engine::{Dispatcher, DispatcherConfig};
use iqueue::identity::HostIdentity;
use iqueue::notify::messages::ReportContext;
use iqueue::notify::{EmailNotifier, LogNotifier, Notifier};
use iqueue::source::spawn_line_reader;
use iqueue::telemetry::spans::dispatcher_span;
use iqueue::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "iqueue", about = "Time-ordered task queue driven by alerts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the dispatcher, reading one JSON alert per line from stdin
    Run {
        /// Path to the TOML config file
        #[arg(long, short)]
        config: PathBuf,
    },
    /// Validate a config file and its decision logic variant
    Check {
        /// Path to the TOML config file
        #[arg(long, short)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Run { config } => cmd_run(&config).await,
        Command::Check { config } => cmd_check(&config),
    }
}

async fn cmd_run(path: &Path) -> anyhow::Result<()> {
    let config = Config::load(path)?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.general.otel_endpoint.clone(),
        service_name: "iqueue".to_string(),
        log_level: config.general.log_level.clone(),
        log_file: config.log_file(),
    })?;
    config.log_summary();

    // Unknown variants abort startup.
    let process_type: ProcessType = config.general.process_type.parse()?;
    let logic = process_type.build(&config.variant)?;

    let notifier: Arc<dyn Notifier> = match config.smtp {
        Some(ref smtp) => Arc::new(EmailNotifier::from_config(smtp, SmtpCredentials::from_env())?),
        None => Arc::new(LogNotifier),
    };

    let source = spawn_line_reader(tokio::io::BufReader::new(tokio::io::stdin()));
    let report = ReportContext {
        identity: HostIdentity::resolve(),
        config: path.display().to_string(),
    };

    let mut dispatcher = Dispatcher::new(
        source,
        logic,
        notifier,
        DispatcherConfig::from_config(&config),
    )
    .with_report_context(report)
    .with_span(dispatcher_span(process_type.as_str(), &config.label()));

    dispatcher.run().await?;
    Ok(())
}

fn cmd_check(path: &Path) -> anyhow::Result<()> {
    let config = Config::load(path)?;
    let process_type: ProcessType = config.general.process_type.parse()?;
    let logic = process_type.build(&config.variant)?;

    println!("Config:       {}", path.display());
    println!("Process type: {} ({})", process_type, logic.name());
    println!(
        "Log file:     {}",
        config
            .log_file()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Log level:    {}", config.general.log_level);
    println!(
        "Queue:        sleep={}s max_complete={} max_frac={}",
        config.queue.sleep, config.queue.max_complete, config.queue.max_frac
    );
    println!(
        "Backlog:      warn_threshold={} warn_delay={}s max_warn={}",
        config.backlog.warn_threshold, config.backlog.warn_delay, config.backlog.max_warn
    );
    println!(
        "Recipients:   {}",
        if config.backlog.recipients.is_empty() {
            "-".to_string()
        } else {
            config.backlog.recipients.join(", ")
        }
    );
    println!(
        "SMTP:         {}",
        config
            .smtp
            .as_ref()
            .map(|s| s.host.as_str())
            .unwrap_or("-")
    );
    Ok(())
}
