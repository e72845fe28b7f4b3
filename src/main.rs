//! archdock - Main entry point

use std::process::ExitCode;

use anyhow::Context;
use archdock::cli::Cli;
use archdock::{ArchDockError, DryRunHost, Host, InstallReport, Installer, SystemHost, sanity};
use tracing_subscriber::EnvFilter;

/// Initialize tracing; RUST_LOG overrides the verbosity flags
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_tracing(cli.log_level());

    if let Err(e) = archdock::process_guard::init_signal_handlers() {
        tracing::warn!("Failed to initialize signal handlers: {}", e);
    }

    let result = if cli.dry_run {
        tracing::info!("Dry-run mode: no changes will be made");
        run(&cli, DryRunHost::new(SystemHost))
    } else {
        run(&cli, SystemHost)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let known = e.downcast_ref::<ArchDockError>();
            let code = known.map_or(1, ArchDockError::exit_code);
            if !known.is_some_and(ArchDockError::is_reported) {
                tracing::error!("{:#}", e);
            }
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run<H: Host>(cli: &Cli, host: H) -> anyhow::Result<()> {
    let skip_root = cli.skip_root_check || sanity::should_skip_root_check();
    sanity::run_preflight_checks(&host, skip_root)?;

    let sudo_user = std::env::var("SUDO_USER").ok();
    let installer = Installer::new(host, cli.to_config(sudo_user));
    let report = installer.run()?;

    if cli.json {
        print_json(&report)?;
    }
    Ok(())
}

fn print_json(report: &InstallReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
