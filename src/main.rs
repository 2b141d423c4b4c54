use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use neeo_cli::plugins::ProcessModuleLoader;
use neeo_cli::{DeviceController, DriverScanner, Error, LocalDeviceServer, load_sdk_options};

/// neeo-cli - Run the NEEO drivers installed in a project
#[derive(Parser)]
#[command(name = "neeo-cli", version, about, arg_required_else_help = true)]
struct Cli {
    /// Project directory (holds package.json and node_modules)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    /// Directory scanned for driver packages [default: <project>/node_modules]
    #[arg(long, global = true, env = "NEEO_MODULES_DIR")]
    modules_dir: Option<PathBuf>,

    /// Seconds a driver may take to load or build before it is abandoned
    #[arg(long, global = true, default_value = "10")]
    load_timeout_secs: u64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the SDK instance
    Start,
    /// List the devices the installed drivers expose
    Scan,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,neeo_cli=info",
        1 => "info,neeo_cli=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let modules_dir = cli
        .modules_dir
        .unwrap_or_else(|| project_dir.join("node_modules"));

    let loader = ProcessModuleLoader::new(Duration::from_secs(cli.load_timeout_secs));
    let scanner = DriverScanner::new(modules_dir).loader(Arc::new(loader));

    match cli.command {
        Command::Start => cmd_start(&project_dir, scanner).await,
        Command::Scan => cmd_scan(&scanner).await,
    }
}

/// Start the device server and run until interrupted
async fn cmd_start(project_dir: &std::path::Path, scanner: DriverScanner) -> anyhow::Result<()> {
    let options = load_sdk_options(project_dir)?;
    tracing::debug!(?options, "loaded sdk options");

    let controller = DeviceController::new(scanner, Arc::new(LocalDeviceServer::default()));
    let session = controller.start_devices(&options).await?;

    let warnings = session.diagnostics.iter().filter(|d| d.is_warning()).count();
    let errors = session.diagnostics.len() - warnings;
    tracing::info!(
        devices = session.config.devices.len(),
        warnings,
        errors,
        "serving devices, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    controller.stop_active().await?;
    Ok(())
}

/// Run the discovery pipeline and print what it found
async fn cmd_scan(scanner: &DriverScanner) -> anyhow::Result<()> {
    let report = scanner.scan().await?;

    for device in &report.devices {
        println!(
            "{:<30} {:<20} {}",
            device.module,
            device.manufacturer.as_deref().unwrap_or("-"),
            device.name.as_deref().unwrap_or("-"),
        );
    }

    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }

    if report.is_empty() {
        return Err(Error::NoDevicesFound.into());
    }

    println!(
        "\n{} device(s) from {}",
        report.devices.len(),
        scanner.root().display()
    );
    Ok(())
}
