use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::error;

use paraplan::config::Config;
use paraplan::metrics;
use paraplan::osrm::OsrmClient;
use paraplan::planner::Planner;
use paraplan::problem::Problem;

#[derive(Parser)]
#[command(about = "Plans daily paratransit routes for a problem document")]
struct Args {
    /// Path to the JSON problem document; stdin when omitted
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Solver wall-clock budget in seconds
    #[arg(short, long)]
    time_limit: Option<u64>,

    /// Seed for the solver's random stream
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write per-iteration search records to this Parquet file
    #[arg(long)]
    instrumentation: Option<PathBuf>,

    /// Pretty-print the solution document
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(seconds) = args.time_limit {
        config.time_limit = Duration::from_secs(seconds);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let raw = match read_input(&args.file) {
        Ok(raw) => raw,
        Err(err) => {
            error!("cannot read the problem document: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let problem: Problem = match serde_json::from_str(&raw) {
        Ok(problem) => problem,
        Err(err) => {
            error!("InvalidInput: malformed problem document: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let osrm = OsrmClient::new(config.osrm.clone());
    let planner = Planner::new(&config, &osrm, &osrm);

    let mut records = Vec::new();
    let wants_records = args.instrumentation.is_some();
    let result = planner.plan_instrumented(
        &problem,
        if wants_records { Some(&mut records) } else { None },
    );

    let solution = match result {
        Ok(solution) => solution,
        Err(err) if err.is_reportable() => paraplan::solution::Solution::all_dropped(
            problem.rides.iter().map(|r| r.id.clone()).collect(),
            err.to_string(),
        ),
        Err(err) => {
            error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.instrumentation {
        if let Err(err) = metrics::serialize_to_parquet(&records, &path.to_string_lossy()) {
            error!("cannot write instrumentation: {}", err);
            return ExitCode::FAILURE;
        }
    }

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&solution)
    } else {
        serde_json::to_string(&solution)
    };
    match rendered {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("cannot serialize the solution: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn read_input(file: &Option<PathBuf>) -> std::io::Result<String> {
    match file {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut raw = String::new();
            std::io::stdin().read_to_string(&mut raw)?;
            Ok(raw)
        }
    }
}
