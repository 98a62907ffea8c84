use std::{env, path::{Path, PathBuf}, process::ExitCode};
use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use presynaptic_plasticity::distribution::SeededUniform;
use presynaptic_plasticity::error::SimulationError;
use presynaptic_plasticity::experiment::build_train;
use presynaptic_plasticity::export::{ensure_output_directories, save_experiment};
use presynaptic_plasticity::parameters::SimulationParameters;
use presynaptic_plasticity::simulation::{run_experiment, PairedPulseScore};


/// Presynaptic bouton short-term plasticity under control and blocker conditions
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Inter-stimulus interval (ms), 75 runs a paired pulse
    isi: f64,
    /// Length of the stimulus train (s)
    seconds: f64,
    /// Number of trials per condition
    trials: usize,
    /// Apply AP5 in the blocker condition
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    ap5: u8,
    /// Block ryanodine receptors in the blocker condition
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    ryr: u8,
    /// Couple an astrocyte to the bouton
    #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
    astro: u8,
    /// Optional `.toml` parameter file
    params: Option<PathBuf>,
}

fn usage() -> String {
    let program = env::args().next().unwrap_or_else(|| String::from("presynaptic_plasticity"));

    format!("Usage: {}  isi seconds trials AP5={{0,1}} RyR={{0,1}} astro={{0,1}}", program)
}

fn run(cli: &Cli) -> Result<()> {
    let params = match &cli.params {
        Some(path) => SimulationParameters::load_or_default(path)
            .with_context(|| format!("Cannot load parameters from {}", path.display()))?,
        None => SimulationParameters::default(),
    };

    let root = Path::new(".");
    ensure_output_directories(root).context("Cannot create output directories")?;

    let mut ex = build_train(
        cli.isi,
        cli.seconds,
        cli.trials,
        params.delta_t,
        cli.astro == 1,
        &params.stimulus,
    )?;
    ex.ap5_exp = cli.ap5 == 1;
    ex.ry_exp = !ex.ap5_exp && cli.ryr == 1;

    println!("Sim for isi={}", cli.isi);

    let mut source = SeededUniform::new(params.seed);
    let report = run_experiment(&ex, &params, &mut PairedPulseScore, &mut source)?;

    if params.save_data {
        save_experiment(root, &ex, &report, params.save_stride)
            .context("Cannot save results")?;
    }

    info!(draws = source.draws(), "random variates consumed");
    println!("Simulation done.");

    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return ExitCode::SUCCESS;
            },
            _ => {
                eprintln!("{}", usage());
                return ExitCode::from(1);
            }
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<SimulationError>() {
            Some(SimulationError::NumericalInstability(instability)) => {
                error!(
                    compartment = instability.compartment,
                    step = instability.step,
                    calcium_next = instability.diagnostics.calcium_next,
                    calcium_prior = instability.diagnostics.calcium_prior,
                    gate = instability.diagnostics.gate,
                    j_chan = instability.diagnostics.j_chan,
                    j_pump = instability.diagnostics.j_pump,
                    j_leak = instability.diagnostics.j_leak,
                    "numerical instability"
                );
                ExitCode::from(2)
            },
            _ => {
                error!("{:#}", e);
                ExitCode::from(3)
            }
        },
    }
}
