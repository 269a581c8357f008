//! itersink CLI - run an iterative computation into a sink target

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, RecordBatch};
use arrow::util::pretty::pretty_format_batches;
use clap::{Parser, Subcommand};
use itersink_connectors::open_target;
use itersink_core::{args, create_sink, Args, IntoValue, SinkOutput, TargetKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "itersink")]
#[command(about = "Record the state of an iterative computation, one call per step")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Iterate the logistic map x' = r * x * (1 - x) and record every step
    Simulate {
        /// Target URI: memory:, -, file:PATH, postgres://...?table=T, sqlite:PATH?table=T
        #[arg(short, long, env = "ITERSINK_TARGET", default_value = "memory:")]
        target: String,

        /// Number of steps to run
        #[arg(short, long, env = "ITERSINK_STEPS", default_value_t = 10)]
        steps: u32,

        /// Growth rate r
        #[arg(short, long, env = "ITERSINK_RATE", default_value_t = 3.7)]
        rate: f64,

        /// Starting value, in (0, 1)
        #[arg(long, default_value_t = 0.5)]
        x0: f64,

        /// Run identifier written as a constant column (random if unset)
        #[arg(long, env = "ITERSINK_RUN_ID")]
        run_id: Option<String>,

        /// Additional constant columns, as name=value
        #[arg(short, long = "extra", value_name = "NAME=VALUE")]
        extra: Vec<String>,
    },

    /// Show which kind of target a URI names, without opening it
    Classify {
        uri: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging on stderr so stream targets keep stdout to themselves
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate {
            target,
            steps,
            rate,
            x0,
            run_id,
            extra,
        } => {
            let run_id = run_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let extra = extra_args(&run_id, &extra)?;
            simulate(&target, steps, rate, x0, extra)?;
        }
        Commands::Classify { uri } => {
            println!("{}", describe_kind(&TargetKind::from_uri(&uri)?));
        }
    }

    Ok(())
}

fn simulate(target: &str, steps: u32, rate: f64, x0: f64, extra: Args) -> Result<()> {
    anyhow::ensure!(
        x0 > 0.0 && x0 < 1.0,
        "x0 must lie strictly between 0 and 1, got {}",
        x0
    );

    let target = open_target(target).with_context(|| format!("cannot open '{}'", target))?;
    let mut sink = create_sink(target, extra)?;
    info!("Running {} steps at r = {}", steps, rate);

    let mut x = x0;
    for step in 0..steps {
        sink.call(args![step = step as i64, x = x])?;
        x = logistic_step(rate, x);
    }

    match sink.finish() {
        SinkOutput::Table(table) => println!("{}", render_table(&table)?),
        SinkOutput::Handle(handle) => println!(
            "Wrote {} steps to table '{}' on {}",
            steps,
            handle.table_name(),
            handle.connection()
        ),
        SinkOutput::Written => {}
    }
    Ok(())
}

fn logistic_step(rate: f64, x: f64) -> f64 {
    rate * x * (1.0 - x)
}

fn render_table(table: &RecordBatch) -> Result<String> {
    Ok(pretty_format_batches(std::slice::from_ref(table))?.to_string())
}

/// The `run` column followed by every `--extra name=value`. Values that
/// parse as integers or floats become numeric columns.
fn extra_args(run_id: &str, pairs: &[String]) -> Result<Args> {
    let mut extra = Args::new().named("run", run_id);
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("expected NAME=VALUE, got '{}'", pair))?;
        let name = name.trim();
        anyhow::ensure!(!name.is_empty(), "empty column name in '{}'", pair);
        extra = extra.named(name, parse_scalar(value.trim()));
    }
    Ok(extra)
}

fn parse_scalar(value: &str) -> ArrayRef {
    if let Ok(i) = value.parse::<i64>() {
        i.into_value()
    } else if let Ok(f) = value.parse::<f64>() {
        f.into_value()
    } else if let Ok(b) = value.parse::<bool>() {
        b.into_value()
    } else {
        value.into_value()
    }
}

fn describe_kind(kind: &TargetKind) -> String {
    match kind {
        TargetKind::Memory => "memory (deferred table)".to_string(),
        TargetKind::Stdout => "stream (stdout)".to_string(),
        TargetKind::File(path) => format!("stream (file {})", path.display()),
        TargetKind::Postgres(_) => "database (postgres)".to_string(),
        TargetKind::Sqlite(_) => "database (sqlite)".to_string(),
    }
}
