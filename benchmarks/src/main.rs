use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mica_benchmarks::{
  fixtures, load_fixtures, run, select_fixtures, verify, Driver, DEFAULT_BUDGET, DEFAULT_LOG_FILTER,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Measures the throughput of the mica HTTP parser.
#[derive(Parser, Debug)]
#[command(name = "mica-bench", version)]
struct Cli {
  /// How many bytes to parse for each sample.
  #[arg(long, env = "MICA_BENCH_BYTES", default_value_t = DEFAULT_BUDGET)]
  bytes: usize,

  /// Only run the given samples. Can be repeated.
  #[arg(long = "sample", value_name = "NAME")]
  samples: Vec<String>,

  /// Load the samples from `<DIR>/<name>.txt` instead of using the built-in
  /// ones.
  #[arg(long, value_name = "DIR")]
  fixtures: Option<PathBuf>,

  /// How the parser is invoked.
  #[arg(long, value_enum, default_value_t = Driver::Native)]
  driver: Driver,

  /// Do not check that every sample parses before timing it.
  #[arg(long)]
  skip_verify: bool,
}

fn main() -> Result<()> {
  // Logs go to stderr so that stdout only carries the report
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
    .with_writer(io::stderr)
    .init();

  let cli = Cli::parse();

  let samples = match &cli.fixtures {
    Some(dir) => load_fixtures(dir)?,
    None => fixtures(),
  };

  let samples = select_fixtures(samples, &cli.samples)?;

  if !cli.skip_verify {
    for sample in &samples {
      verify(sample, cli.driver)?;
    }
  }

  info!(budget = cli.bytes, driver = ?cli.driver, samples = samples.len(), "starting");

  for sample in &samples {
    println!("{}", run(sample, cli.driver, cli.bytes));
  }

  Ok(())
}
