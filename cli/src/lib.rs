//! Command-line front-end for the launch loop.
//!
//! All decisions live in `armgrab-core`; this crate parses arguments, wires
//! Ctrl-C into the controller's cancellation token, renders events, and maps
//! outcomes onto process exit codes: 0 for success or a clean operator stop,
//! 1 for a fatal provisioning failure, 2 for configuration or credential
//! problems detected before the first attempt.

mod reporter;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use armgrab_core::oci::{ApiKeySigner, ComputeClient, Profile};
use armgrab_core::{GrabError, LaunchPlan, RetryConfig, RetryController, RunOutcome};
use clap::{CommandFactory, Parser, Subcommand};
use owo_colors::{OwoColorize, Stream};
use tokio_util::sync::CancellationToken;

use crate::reporter::Reporter;

#[derive(Debug, Parser)]
#[command(
    name = "armgrab",
    version,
    about = "Launch a capacity-constrained OCI compute instance, retrying until it lands"
)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, clap::Args)]
pub struct GlobalOptions {
    /// Path to the launch plan.
    #[arg(long = "config", short = 'c', default_value = "armgrab.toml")]
    pub config: PathBuf,

    /// Seconds to wait between attempts (overrides the plan).
    #[arg(long = "interval", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Profile name in the OCI config file.
    #[arg(long = "profile", default_value = "DEFAULT")]
    pub profile: String,

    /// Path to the OCI config file (defaults to ~/.oci/config).
    #[arg(long = "oci-config")]
    pub oci_config: Option<PathBuf>,

    /// Emit events as JSON lines on stdout instead of human-readable output.
    #[arg(long = "json", short = 'j')]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the launch loop (the default when no subcommand is given).
    Run,
    /// Validate the launch plan and OCI profile, then exit.
    Validate,
    /// Generate shell completions.
    Completion {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

pub async fn run_main(cli: Cli) -> ExitCode {
    init_tracing();

    match cli.command.unwrap_or(Command::Run) {
        Command::Completion { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "armgrab", &mut std::io::stdout());
            ExitCode::SUCCESS
        }
        Command::Validate => match prepare(&cli.options) {
            Ok(prepared) => {
                println!(
                    "plan ok: {} ({}, {} OCPU, {} GB) in {}",
                    prepared.plan.instance.display_name,
                    prepared.plan.instance.shape,
                    prepared.plan.instance.ocpus,
                    prepared.plan.instance.memory_in_gbs,
                    prepared.plan.instance.availability_domain,
                );
                println!(
                    "profile ok: region {}, key {}",
                    prepared.profile.region,
                    prepared.profile.key_file.display(),
                );
                ExitCode::SUCCESS
            }
            Err(err) => config_failure(&err),
        },
        Command::Run => run_loop(cli.options).await,
    }
}

/// Everything the loop needs, built and validated before the first attempt.
struct Prepared {
    plan: LaunchPlan,
    profile: Profile,
    signer: ApiKeySigner,
}

fn prepare(options: &GlobalOptions) -> Result<Prepared, GrabError> {
    let plan = LaunchPlan::load(&options.config)?;
    let profile_path = match &options.oci_config {
        Some(path) => path.clone(),
        None => Profile::default_path()?,
    };
    let profile = Profile::load(&profile_path, &options.profile)?;
    let signer = ApiKeySigner::from_profile(&profile)?;
    Ok(Prepared {
        plan,
        profile,
        signer,
    })
}

async fn run_loop(options: GlobalOptions) -> ExitCode {
    let prepared = match prepare(&options) {
        Ok(prepared) => prepared,
        Err(err) => return config_failure(&err),
    };

    let interval = options
        .interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| prepared.plan.retry.interval());

    let client = match ComputeClient::for_region(&prepared.profile.region, Arc::new(prepared.signer))
    {
        Ok(client) => client,
        Err(err) => return config_failure(&err),
    };
    let request = prepared.plan.to_launch_request();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("interrupt received, cancelling run");
                cancel.cancel();
            }
        }
    });

    let mut reporter = Reporter::new(options.json, interval);
    reporter.banner(&prepared.plan, &prepared.profile);

    let controller = RetryController::new(client, RetryConfig { interval });
    let outcome = controller
        .run(&request, &cancel, |event| reporter.report(&event))
        .await;

    match outcome {
        RunOutcome::Succeeded { .. } | RunOutcome::Interrupted { .. } => ExitCode::SUCCESS,
        RunOutcome::Failed { .. } => ExitCode::FAILURE,
    }
}

fn config_failure(err: &GrabError) -> ExitCode {
    let label = if err.is_auth() {
        "authentication error"
    } else {
        "configuration error"
    };
    eprintln!(
        "{}: {err}",
        label.if_supports_color(Stream::Stderr, |text| text.red())
    );
    ExitCode::from(2)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
