//! ═══════════════════════════════════════════════════════════════════════════════
//! PENDULUM - Entry Point
//! ═══════════════════════════════════════════════════════════════════════════════
//! Single binary, subcommand dispatch. Results go to stdout, logs to stderr.
//! ═══════════════════════════════════════════════════════════════════════════════

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use pendulum::stats::{float_cmp, mean, std_dev};
use pendulum::{
    generate_trends, simulate, DomainOscillator, FeatureRecord, FeatureVector,
    HistoricalAnalogyScorer, LinearAxisModel, PendulumConfig, ScenarioForecaster, ShockWindow,
};

#[derive(Parser)]
#[command(name = "pendulum")]
#[command(about = "Pendulum - Order/Novelty cultural oscillation engine", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON config file (falls back to PENDULUM_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configuration as JSON
    Params,

    /// Replay the coupled multi-domain pendulum on a monthly grid
    Simulate {
        /// Number of months (overrides config)
        #[arg(short, long)]
        months: Option<usize>,

        /// Add a shock starting at this month
        #[arg(long)]
        shock_month: Option<f64>,

        #[arg(long, default_value_t = pendulum::DEFAULT_SHOCK_MAGNITUDE)]
        shock_magnitude: f64,

        /// Shock width in months
        #[arg(long, default_value_t = 1.0)]
        shock_width: f64,

        /// Restrict the shock to one domain
        #[arg(long)]
        shock_domain: Option<String>,

        /// Disable seeded noise
        #[arg(long)]
        no_noise: bool,

        /// Emit the full run as JSON
        #[arg(long)]
        json: bool,
    },

    /// Single-oscillator theoretical trend with one shock
    Trends {
        #[arg(long, default_value_t = pendulum::simulation::TREND_LENGTH_MONTHS)]
        length: f64,

        #[arg(long, default_value_t = pendulum::simulation::TREND_SHOCK_MONTH)]
        shock_month: f64,

        #[arg(long)]
        json: bool,
    },

    /// Score historical analogies for a JSON array of feature records
    Analogy {
        /// Records file: [{"entity_id", "ordinal", "features": {...}}, ...]
        input: PathBuf,
    },

    /// Forecast the Order/Novelty axis under a text scenario
    Forecast {
        /// Free-text scenario, e.g. "recession hits while AI trends go viral"
        scenario: String,

        /// Horizon in months (overrides config)
        #[arg(long)]
        horizon: Option<f64>,

        /// Linear axis model JSON; defaults to a zero-weight model
        #[arg(long)]
        model: Option<PathBuf>,

        /// Base feature vector JSON; defaults to the reference vector
        #[arg(long)]
        base: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = PendulumConfig::load(cli.config.as_deref()).context("loading configuration")?;
    info!(seed = config.params.seed, lag = config.params.default_lag, "configuration loaded");

    match cli.command {
        Commands::Params => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Simulate {
            months,
            shock_month,
            shock_magnitude,
            shock_width,
            shock_domain,
            no_noise,
            json,
        } => {
            let mut sim = config.simulation.clone();
            if let Some(m) = months {
                sim.months = m;
            }
            if no_noise {
                sim.noise = false;
            }
            if let Some(start) = shock_month {
                let mut shock = ShockWindow::new(start, shock_magnitude).with_width(shock_width);
                if let Some(domain) = shock_domain {
                    shock = shock.for_domain(domain);
                }
                sim.shocks.push(shock);
            }
            run_simulate(&config, &sim, json)
        }
        Commands::Trends {
            length,
            shock_month,
            json,
        } => run_trends(&config, length, shock_month, json),
        Commands::Analogy { input } => run_analogy(&config, &input),
        Commands::Forecast {
            scenario,
            horizon,
            model,
            base,
            json,
        } => run_forecast(&config, &scenario, horizon, model.as_deref(), base.as_deref(), json),
    }
}

fn banner(title: &str) {
    println!("═══════════════════════════════════════════════════════════════════════════════");
    println!("                         {}", title);
    println!("═══════════════════════════════════════════════════════════════════════════════");
    println!();
}

fn run_simulate(
    config: &PendulumConfig,
    sim: &pendulum::SimulationConfig,
    json: bool,
) -> Result<()> {
    let run = simulate(&config.params, sim)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    banner("PENDULUM SIMULATION");
    println!(
        "Months:       {}   Lag: {}   Seed: {}   Shocks: {}",
        sim.months,
        config.params.default_lag,
        config.params.seed,
        sim.shocks.len()
    );
    println!();
    println!("{:<12} {:>9} {:>9} {:>9} {:>9}", "domain", "mean", "std", "min", "max");
    for (i, domain) in run.coupled.domains().iter().enumerate() {
        let column = run.coupled.column(i);
        let min = column.iter().cloned().min_by(float_cmp).unwrap_or(0.0);
        let max = column.iter().cloned().max_by(float_cmp).unwrap_or(0.0);
        println!(
            "{:<12} {:>9.4} {:>9.4} {:>9.4} {:>9.4}",
            domain,
            mean(&column),
            std_dev(&column),
            min,
            max
        );
    }

    let smoothed = run.smoothed_heartbeat();
    if let Some(last) = smoothed.last() {
        println!();
        println!(
            "Heartbeat:    {:+.4} (EMA window {}), leaning {}",
            last,
            run.ema_window,
            pendulum::AxisLabel::from_prediction(*last)
        );
    }
    Ok(())
}

fn run_trends(config: &PendulumConfig, length: f64, shock_month: f64, json: bool) -> Result<()> {
    let oscillator = DomainOscillator::from_params(&config.params);
    let (grid, signal) = generate_trends(&oscillator, length, shock_month)?;

    if json {
        let out = serde_json::json!({ "years": grid.times(), "signal": signal });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    banner("THEORETICAL TREND");
    for (t, v) in grid.times().iter().zip(&signal).step_by(12) {
        println!("{:>7.1}y  {:+.4}", t, v);
    }
    Ok(())
}

fn run_analogy(config: &PendulumConfig, input: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(input)
        .with_context(|| format!("reading records from {}", input.display()))?;
    let records: Vec<FeatureRecord> = serde_json::from_str(&contents)?;

    let scorer = HistoricalAnalogyScorer::new(config.analogy.clone())?;
    let scores = scorer.score_records(&records)?;
    println!("{}", serde_json::to_string_pretty(&scores)?);
    Ok(())
}

fn run_forecast(
    config: &PendulumConfig,
    scenario: &str,
    horizon: Option<f64>,
    model: Option<&Path>,
    base: Option<&Path>,
    json: bool,
) -> Result<()> {
    let regressor = match model {
        Some(path) => LinearAxisModel::load(path)?,
        None => LinearAxisModel::constant(0.0),
    };
    let base = match base {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading base features from {}", path.display()))?;
            serde_json::from_str::<FeatureVector>(&contents)?
        }
        None => pendulum::reference_base(),
    };

    let forecaster = ScenarioForecaster::new(config.forecast.clone())?;
    let horizon = horizon.unwrap_or(config.forecast.default_horizon);
    let forecast = forecaster.forecast(&base, scenario, horizon, &regressor)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
        return Ok(());
    }

    banner("SCENARIO FORECAST");
    println!("Scenario:     {}", scenario);
    println!("Themes:       {}", pendulum::describe_themes(scenario));
    if forecast.fired_rules.is_empty() {
        println!("Nudges:       none");
    } else {
        println!("Nudges:       {}", forecast.fired_rules.join(", "));
    }
    println!(
        "Axis:         {} (confidence {:.2})",
        forecast.reading.label, forecast.reading.confidence
    );
    println!();
    println!("{}", forecast.narrate());
    Ok(())
}
