use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{
    aggregate::AggregateArg, analyze::AnalyzeArg, anova::AnovaArg, simulate::SimulateArg,
    summary::SummaryArg,
};

mod aggregate;
mod analyze;
mod anova;
mod simulate;
mod summary;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log debug events of the analysis to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Aggregate per-participant Sternberg trial files into one wide table
    Aggregate(#[clap(flatten)] AggregateArg),
    /// Run the full repeated-measures analysis on a wide table
    Analyze(#[clap(flatten)] AnalyzeArg),
    /// Run only the repeated-measures ANOVA, ranked by p-value
    Anova(#[clap(flatten)] AnovaArg),
    /// Summarize significant results of a saved analysis report
    Summary(#[clap(flatten)] SummaryArg),
    /// Generate a synthetic wide table
    Simulate(#[clap(flatten)] SimulateArg),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.verbose);
    match args.mode {
        Mode::Aggregate(arg) => aggregate::run(&arg)?,
        Mode::Analyze(arg) => analyze::run(&arg)?,
        Mode::Anova(arg) => anova::run(&arg)?,
        Mode::Summary(arg) => summary::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
    }
    Ok(())
}
