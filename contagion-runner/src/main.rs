mod stats;

use clap::{Parser, ValueEnum};
use contagion_config::{load_config, validate, Config, ConfigError, ConfigOverrides, SimulationConfig};
use contagion_simulation::{Simulation, SimulationError, Snapshot};
use contagion_transport::{TransportController, TransportError};
use log::{error, info, warn};
use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::stats::TickStats;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Preset {
    /// Start-menu defaults: 1500 agents
    Menu,
    /// 400 agents with long infections
    Classic,
    /// 600 agents with a throttled gate
    Throttled,
}

impl Preset {
    fn simulation(self) -> SimulationConfig {
        match self {
            Preset::Menu => SimulationConfig::menu_defaults(),
            Preset::Classic => SimulationConfig::classic(),
            Preset::Throttled => SimulationConfig::throttled(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless agent-based outbreak simulator", long_about = None)]
struct Args {
    /// Path to a JSON or TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Built-in scenario used when no config file is given
    #[arg(long, value_enum, default_value_t = Preset::Menu)]
    preset: Preset,

    #[command(flatten)]
    overrides: ConfigOverrides,

    /// Pace the run to this many ticks per second (unpaced if omitted)
    #[arg(long)]
    ticks_per_second: Option<f64>,

    /// Extra motion-only frames to run once the outbreak window closes
    #[arg(long, default_value_t = 0)]
    cooldown_frames: u64,
}

#[derive(Error, Debug)]
enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Failed to set up tick statistics: {0}")]
    Stats(#[from] hdrhistogram::CreationError),

    #[error("--ticks-per-second must be positive and not vanishingly small, got {0}")]
    TickRate(f64),
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        return Err(e.into());
    }
    Ok(())
}

fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            info!("No config file given, using the {:?} preset", args.preset);
            Config {
                simulation: args.preset.simulation(),
                ..Config::default()
            }
        }
    };
    args.overrides.apply(&mut config.simulation);
    validate(&config)?;
    Ok(config)
}

fn frame_budget(ticks_per_second: Option<f64>) -> Result<Option<Duration>, RunnerError> {
    match ticks_per_second {
        None => Ok(None),
        Some(rate) if rate.is_finite() && rate > 0.0 => Duration::try_from_secs_f64(1.0 / rate)
            .map(Some)
            .map_err(|_| RunnerError::TickRate(rate)),
        Some(rate) => Err(RunnerError::TickRate(rate)),
    }
}

fn run(args: &Args) -> Result<(), RunnerError> {
    let config = resolve_config(args)?;
    let budget = frame_budget(args.ticks_per_second)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))?;

    let mut simulation = Simulation::configure(&config.simulation)?;
    let mut transport = TransportController::from_config(&config.transport)?;
    let mut stats = TickStats::new()?;

    simulation.seed()?;
    info!(
        "Running {} ticks on a {}x{} arena",
        simulation.max_ticks(),
        simulation.arena().width(),
        simulation.arena().height()
    );

    let mut cooldown_left = args.cooldown_frames;
    loop {
        if stop.load(Ordering::SeqCst) {
            warn!("Interrupted at tick {}", simulation.tick_count());
            break;
        }
        if simulation.is_finished() {
            if cooldown_left == 0 {
                break;
            }
            cooldown_left -= 1;
        }

        let started = Instant::now();
        simulation.step()?;
        transport.publish(&simulation)?;
        let elapsed = started.elapsed();
        stats.record(elapsed);

        if let Some(budget) = budget {
            if elapsed < budget {
                spin_sleep::sleep(budget - elapsed);
            } else {
                stats.record_overrun();
                warn!("Tick {} overran its frame budget: {:?} > {:?}", simulation.tick_count(), elapsed, budget);
            }
        }
    }

    transport.publish_final(&simulation)?;
    log_summary(&simulation.snapshot(), &simulation, &stats);
    Ok(())
}

fn log_summary(snapshot: &Snapshot, simulation: &Simulation, stats: &TickStats) {
    let counts = &snapshot.counts;
    let (peak, peak_tick) = simulation.history().peak_infected();

    info!("Finished after {} ticks ({} cooldown frames)", snapshot.tick, simulation.cooldown_frames());
    info!(
        "Susceptible {} | Infected {} | Recovered {} | Dead {} | Initial {}",
        counts.susceptible, counts.infected, counts.recovered, counts.dead, counts.initial
    );
    info!("Attack rate {:.1}%, peak of {} infected at tick {}", snapshot.attack_rate * 100.0, peak, peak_tick);
    if stats.count() > 0 {
        info!(
            "Tick time mean {:?}, p50 {:?}, p99 {:?}, max {:?}, {} over budget",
            stats.mean(),
            stats.percentile(0.5),
            stats.percentile(0.99),
            stats.max(),
            stats.overruns()
        );
    }
}
