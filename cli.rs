use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pair_amm::scenario::{replay, Scenario};
use pair_amm::sim::{run_parallel, AggregatedResult};
use pair_amm::swap::{fee_portion, get_amount_in, get_amount_out};
use pair_amm::types::{FeeRate, SimConfig, DEFAULT_FEE_DENOMINATOR, DEFAULT_FEE_NUMERATOR};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pair-amm", about = "Constant-product pool: quotes, scripted replays and workload simulations")]
struct Cli {
	/// Log filter used when RUST_LOG is unset
	#[arg(long, global = true, default_value = "info")]
	log_level: String,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Price a swap against explicit reserves
	Quote {
		#[arg(long)]
		amount_in: u128,
		#[arg(long)]
		reserve_in: u128,
		#[arg(long)]
		reserve_out: u128,
		#[arg(long, default_value_t = DEFAULT_FEE_NUMERATOR)]
		fee_numerator: u128,
		#[arg(long, default_value_t = DEFAULT_FEE_DENOMINATOR)]
		fee_denominator: u128,
	},
	/// Run a JSON scenario against a fresh pool
	Replay {
		file: PathBuf,
		/// Print the full report as JSON instead of a summary
		#[arg(long)]
		json: bool,
	},
	/// Run seeded random workloads in parallel
	Simulate {
		/// JSON SimConfig; missing fields take defaults
		#[arg(long)]
		config: Option<PathBuf>,
		#[arg(long, default_value_t = 100)]
		simulations: usize,
		#[arg(long)]
		steps: Option<usize>,
		#[arg(long)]
		seed_start: Option<u64>,
		/// Directory to write a JSON report into
		#[arg(long)]
		report: Option<PathBuf>,
	},
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(&cli.log_level)?;

	match cli.command {
		Commands::Quote {
			amount_in,
			reserve_in,
			reserve_out,
			fee_numerator,
			fee_denominator,
		} => quote_cmd(amount_in, reserve_in, reserve_out, FeeRate::new(fee_numerator, fee_denominator)),
		Commands::Replay { file, json } => replay_cmd(&file, json),
		Commands::Simulate {
			config,
			simulations,
			steps,
			seed_start,
			report,
		} => simulate_cmd(config.as_deref(), simulations, steps, seed_start, report.as_deref()),
	}
}

fn init_tracing(level: &str) -> Result<()> {
	let filter = EnvFilter::try_from_default_env()
		.or_else(|_| EnvFilter::try_new(level))
		.with_context(|| format!("invalid log filter `{level}`"))?;
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
	Ok(())
}

fn quote_cmd(amount_in: u128, reserve_in: u128, reserve_out: u128, fee: FeeRate) -> Result<()> {
	fee.validate()?;
	let amount_out = get_amount_out(amount_in, reserve_in, reserve_out, fee)?;
	let fee_amount = fee_portion(amount_in, fee)?;

	println!("amount_out  {amount_out}");
	println!("fee         {fee_amount} ({fee})");
	if amount_out > 0 {
		let needed = get_amount_in(amount_out, reserve_in, reserve_out, fee)?;
		println!("min input   {needed}");
	}
	Ok(())
}

fn replay_cmd(file: &Path, json: bool) -> Result<()> {
	let raw = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
	let scenario: Scenario =
		serde_json::from_str(&raw).with_context(|| format!("invalid scenario {}", file.display()))?;
	let report = replay(&scenario)?;

	if json {
		println!("{}", serde_json::to_string_pretty(&report)?);
		return Ok(());
	}

	for step in &report.steps {
		match &step.outcome {
			Ok(msg) => println!("[ OK ] #{:<3} {msg}", step.index),
			Err(err) => println!("[FAIL] #{:<3} {err}", step.index),
		}
	}

	println!("\nEvents");
	println!("------");
	for event in &report.events {
		println!("{}", serde_json::to_string(event)?);
	}

	let (reserve_a, reserve_b) = report.reserves;
	println!("\nReserves      {reserve_a} / {reserve_b}");
	println!("Total shares  {}", report.total_shares);
	match report.price {
		Some(price) => println!("Price (1e18)  {price}"),
		None => println!("Price (1e18)  n/a"),
	}
	for (account, shares) in &report.shares {
		println!("  {account:<20} {shares}");
	}
	Ok(())
}

fn simulate_cmd(
	config_path: Option<&Path>,
	simulations: usize,
	steps: Option<usize>,
	seed_start: Option<u64>,
	report: Option<&Path>,
) -> Result<()> {
	if simulations == 0 {
		bail!("--simulations must be at least 1");
	}

	let mut config = match config_path {
		Some(path) => {
			let raw = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
			serde_json::from_str::<SimConfig>(&raw).with_context(|| format!("invalid config {}", path.display()))?
		}
		None => SimConfig::default(),
	};
	if let Some(steps) = steps {
		config.total_steps = steps;
	}
	config.pool.validate()?;
	let seed_start = seed_start.unwrap_or(config.seed);

	let result = run_parallel(&config, simulations, seed_start)?;

	println!("\nRuns   Mean swaps   Mean sqrt(k) growth   Std     Mean share value   Min share value");
	println!("------------------------------------------------------------------------------------");
	println!(
		"{:<6} {:>10.1} {:>21.6} {:>7.4} {:>18.6} {:>17.6}",
		result.runs,
		result.mean_swaps,
		result.mean_k_growth,
		result.std_k_growth,
		result.mean_share_value_growth,
		result.min_share_value_growth
	);
	if !result.failures.is_empty() {
		println!("\nRejected operations");
		for (kind, count) in &result.failures {
			println!("  {kind:<20} {count}");
		}
	}

	if let Some(dir) = report {
		let path = write_report(dir, &config, &result, simulations, seed_start)?;
		println!("\nReport: {}", path.display());
	}

	Ok(())
}

#[derive(Serialize)]
struct SimulationReport<'a> {
	timestamp: u64,
	simulations: usize,
	seed_start: u64,
	config: &'a SimConfig,
	result: &'a AggregatedResult,
}

fn write_report(
	dir: &Path,
	config: &SimConfig,
	result: &AggregatedResult,
	simulations: usize,
	seed_start: u64,
) -> Result<PathBuf> {
	let ts = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
	fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

	let payload = SimulationReport {
		timestamp: ts,
		simulations,
		seed_start,
		config,
		result,
	};

	let path = dir.join(format!("simulation_{ts}.json"));
	fs::write(&path, serde_json::to_vec_pretty(&payload)?)?;
	Ok(path)
}
