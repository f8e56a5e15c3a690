//! RegimeLab CLI: backtest, detection, sanity and sweep commands.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file
//! - `detect`: classify every period of a macro CSV without simulating
//! - `sanity`: check the detector against the historical scenario catalogue
//! - `stress`: run the multi-period stress suite with the gate and limiter on
//! - `sweep`: run a learning-rate × cadence grid over one dataset

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use regimelab_core::detection::{detect_sequence, DetectorConfig, RegimeDetection};
use regimelab_core::domain::{IndicatorSnapshot, Regime};
use regimelab_core::engine::RebalanceCadence;
use regimelab_runner::dataset::read_macro;
use regimelab_runner::{
    best_by_sharpe, run_backtest, run_sanity_checks, run_stress_tests, run_sweep, BacktestConfig, BacktestResult,
    Dataset, DateWindow, SweepGrid, SweepPoint,
};

#[derive(Parser)]
#[command(
    name = "regimelab",
    about = "RegimeLab CLI: macro regime detection and allocation backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Write the full result as JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Classify each period of a macro CSV.
    Detect {
        /// Macro series CSV (date column plus indicator columns).
        #[arg(long = "macro")]
        macro_path: PathBuf,

        /// Use the raw detector (λ = 1, no sticky lock).
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Override the smoothing learning rate (0, 1].
        #[arg(long)]
        learning_rate: Option<f64>,

        /// Cap each period's probability move at 0.25 / 3.
        #[arg(long, default_value_t = false)]
        decay_limiter: bool,

        /// Require regime persistence and confidence before switching.
        #[arg(long, default_value_t = false)]
        transition_gate: bool,

        /// Write every detection as JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Check the detector against the historical scenario catalogue.
    Sanity,
    /// Run the multi-period stress suite.
    Stress {
        /// Write the report as JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Run a learning-rate × cadence grid over the config's dataset.
    Sweep {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Learning rates, comma separated. Defaults to 0.1,0.2,0.3,0.5,1.0.
        #[arg(long, value_delimiter = ',')]
        learning_rates: Vec<f64>,

        /// Cadences, comma separated (every_period, quarterly, annual, signal_only).
        #[arg(long, value_delimiter = ',')]
        cadences: Vec<String>,

        /// Write all grid points as JSON to this path.
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, json } => run_cmd(&config, json.as_deref()),
        Commands::Detect {
            macro_path,
            raw,
            learning_rate,
            decay_limiter,
            transition_gate,
            json,
        } => {
            let guards = Guards {
                decay_limiter,
                transition_gate,
            };
            detect_cmd(&macro_path, raw, learning_rate, guards, json.as_deref())
        }
        Commands::Sanity => sanity_cmd(),
        Commands::Stress { json } => stress_cmd(json.as_deref()),
        Commands::Sweep {
            config,
            learning_rates,
            cadences,
            json,
        } => sweep_cmd(&config, learning_rates, &cadences, json.as_deref()),
    }
}

fn run_cmd(config_path: &Path, json: Option<&Path>) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    tracing::info!(config = %config_path.display(), "loaded config");
    let result = run_backtest(&config)?;
    tracing::info!(run_id = %result.run_id, "run finished");
    print_summary(&result);

    if let Some(path) = json {
        write_json(path, &result)?;
        println!("Result saved to: {}", path.display());
    }
    Ok(())
}

/// Optional detector stages switched on from the command line.
#[derive(Debug, Clone, Copy, Default)]
struct Guards {
    decay_limiter: bool,
    transition_gate: bool,
}

fn detect_cmd(
    macro_path: &Path,
    raw: bool,
    learning_rate: Option<f64>,
    guards: Guards,
    json: Option<&Path>,
) -> Result<()> {
    let file = std::fs::File::open(macro_path).with_context(|| format!("opening {}", macro_path.display()))?;
    let points = read_macro(file)?;
    if points.is_empty() {
        bail!("no rows in {}", macro_path.display());
    }

    let mut detector = if raw { DetectorConfig::raw() } else { DetectorConfig::production() };
    if let Some(lambda) = learning_rate {
        detector = detector.with_learning_rate(lambda)?;
    }
    detector.decay_limiter |= guards.decay_limiter;
    detector.transition_gate |= guards.transition_gate;

    let snapshots: Vec<IndicatorSnapshot> = points.iter().map(|p| p.indicators.clone()).collect();
    let detections = detect_sequence(&snapshots, &detector);

    println!(
        "{:<12} {:<6} {:>6} {:>6} {:>6} {:>6} {:>6}  {}",
        "Date", "Regime", "Conf", "P(A)", "P(B)", "P(C)", "P(D)", "Notes"
    );
    println!("{}", "-".repeat(72));
    for (point, d) in points.iter().zip(&detections) {
        println!(
            "{:<12} {:<6} {:>6.2} {:>6.3} {:>6.3} {:>6.3} {:>6.3}  {}",
            point.date.to_string(),
            d.dominant.to_string(),
            d.confidence,
            d.probabilities.get(Regime::A),
            d.probabilities.get(Regime::B),
            d.probabilities.get(Regime::C),
            d.probabilities.get(Regime::D),
            detection_notes(d),
        );
    }

    if let Some(path) = json {
        write_json(path, &detections)?;
        println!("Detections saved to: {}", path.display());
    }
    Ok(())
}

fn detection_notes(d: &RegimeDetection) -> String {
    let mut notes = Vec::new();
    if d.is_sticky {
        notes.push("sticky".to_string());
    }
    if d.raw_dominant != d.dominant {
        notes.push(format!("held (candidate {})", d.raw_dominant));
    }
    if let Some(gate) = d.gate.as_ref().filter(|g| !g.allowed) {
        notes.push(format!("gate: {:?} after {} period(s)", gate.reason, gate.periods_in_regime));
    }
    notes.join(", ")
}

fn sanity_cmd() -> Result<()> {
    let report = run_sanity_checks();

    println!("=== Sanity Checks ===");
    for o in &report.outcomes {
        let mark = if o.passed { "PASS" } else { "FAIL" };
        println!(
            "[{mark}] {:<48} expected {}  detected {}  (p = {:.3})",
            o.scenario,
            o.expected,
            o.detected,
            o.probabilities.get(o.detected)
        );
    }
    println!();
    println!("{}/{} scenarios passed", report.passed, report.total);

    if !report.all_passed() {
        bail!("{} sanity scenario(s) failed", report.total - report.passed);
    }
    Ok(())
}

fn stress_cmd(json: Option<&Path>) -> Result<()> {
    let report = run_stress_tests();

    println!("=== Stress Tests ===");
    for o in &report.outcomes {
        let mark = if o.passed { "PASS" } else { "FAIL" };
        println!("[{mark}] {:<34} {}", o.scenario, o.details);
    }
    println!();
    println!("{}/{} stress tests passed", report.passed, report.total);

    if let Some(path) = json {
        write_json(path, &report)?;
        println!("Report saved to: {}", path.display());
    }
    if !report.all_passed() {
        bail!("{} stress test(s) failed", report.total - report.passed);
    }
    Ok(())
}

fn sweep_cmd(config_path: &Path, learning_rates: Vec<f64>, cadences: &[String], json: Option<&Path>) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)?;
    let base = config.simulator_config()?;
    let window = DateWindow {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
    };

    let mut grid = SweepGrid::default();
    if !learning_rates.is_empty() {
        grid.learning_rates = learning_rates;
    }
    if !cadences.is_empty() {
        grid.cadences = cadences
            .iter()
            .map(|c| RebalanceCadence::parse(c).with_context(|| format!("unknown cadence '{c}'")))
            .collect::<Result<_>>()?;
    }

    let dataset = Dataset::load(&config.data)?;
    let points = run_sweep(&dataset, &base, &grid, window)?;
    print_sweep(&points);

    if let Some(path) = json {
        write_json(path, &points)?;
        println!("Sweep saved to: {}", path.display());
    }
    Ok(())
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn print_sweep(points: &[SweepPoint]) {
    println!();
    println!("=== Sweep ({} points) ===", points.len());
    println!(
        "{:>6} {:<13} {:>9} {:>8} {:>8} {:>8} {:>6}",
        "λ", "Cadence", "Return", "Sharpe", "MaxDD", "Changes", "Rebal"
    );
    println!("{}", "-".repeat(64));
    for p in points {
        println!(
            "{:>6.2} {:<13} {:>8.2}% {:>8.3} {:>7.2}% {:>8} {:>6}",
            p.learning_rate,
            format!("{:?}", p.cadence),
            p.summary.total_return * 100.0,
            p.summary.sharpe_ratio,
            p.summary.max_drawdown * 100.0,
            p.regime_changes,
            p.rebalances,
        );
    }
    if let Some(best) = best_by_sharpe(points).map(|i| &points[i]) {
        println!();
        println!(
            "Best Sharpe: λ = {:.2}, {:?} ({:.3})",
            best.learning_rate, best.cadence, best.summary.sharpe_ratio
        );
    }
    println!();
}

fn print_summary(result: &BacktestResult) {
    let s = &result.summary;
    println!();
    println!("=== Backtest Result ===");
    println!("Run ID:         {}", result.run_id);
    if let (Some(start), Some(end)) = (result.start_date, result.end_date) {
        println!("Period:         {start} to {end}");
    }
    println!("Periods:        {}", s.periods);
    println!("Regime Changes: {}", result.regime_changes());
    println!("Rebalances:     {}", result.output.rebalance_count());
    if let Some(regime) = result.final_regime() {
        println!("Final Regime:   {regime}");
    }
    println!();
    println!("--- Performance ---");
    println!("Total Return:   {:.2}%", s.total_return * 100.0);
    println!("Annualized:     {:.2}%", s.annualized_return * 100.0);
    println!("Volatility:     {:.2}%", s.annualized_vol * 100.0);
    println!("Sharpe:         {:.3}", s.sharpe_ratio);
    println!("Max Drawdown:   {:.2}%", s.max_drawdown * 100.0);
    println!("Win Rate:       {:.1}%", s.win_rate * 100.0);
    println!(
        "Daily VaR 95:   {:.2}%{}",
        s.daily_var_95 * 100.0,
        if s.var_is_approximation { " (approx.)" } else { "" }
    );
    println!("Daily CVaR 95:  {:.2}%", s.daily_cvar_95 * 100.0);
    println!("Median Return:  {:.3}%", s.median_return * 100.0);
    println!("End Value:      {:.2}", s.end_value);

    if !result.regime_performance.is_empty() {
        println!();
        println!("--- By Regime ---");
        for r in &result.regime_performance {
            println!(
                "{}: {:>3} periods ({:>5.1}%), avg {:.2}%/period, total {:.2}%",
                r.regime,
                r.periods,
                r.share * 100.0,
                r.avg_period_return * 100.0,
                r.total_return * 100.0
            );
        }
    }

    if let Some(cmp) = &result.benchmark {
        println!();
        println!("--- vs Benchmark ---");
        println!("Benchmark Return: {:.2}%", cmp.benchmark.total_return * 100.0);
        println!("Outperformance:   {:.2}%", cmp.outperformance.total_return * 100.0);
        println!("Sharpe Delta:     {:.3}", cmp.outperformance.sharpe_ratio);
        if cmp.missing_dates > 0 {
            println!("WARNING: {} period(s) missing from the benchmark", cmp.missing_dates);
        }
    }

    for gap in &result.coverage_gaps {
        println!("WARNING: regime {} has no funds for {:?}", gap.regime, gap.missing);
    }
    let proxies = result.output.proxy_periods();
    if proxies > 0 {
        println!("WARNING: {proxies} period(s) use macro proxy returns");
    }
    println!();
}
