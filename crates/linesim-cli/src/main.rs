use std::path::PathBuf;

use clap::Parser;
use linesim_core::config::SimConfig;
use linesim_core::policy::TieBreak;
use linesim_data::load_scenario;
use linesim_stats::{
    ReplicationSummary, RunReport, replication_config, run_replication_observed,
    run_replications, run_replications_parallel,
};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "linesim", about = "Replicated simulation of a two-inspector assembly line")]
struct Args {
    /// Scenario file (.ron, .toml, or .json). Flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of independent replications
    #[arg(short = 'n', long)]
    replications: Option<usize>,

    /// Base seed; replication k uses seed + k
    #[arg(short, long)]
    seed: Option<u64>,

    /// Products to make before a run stops
    #[arg(short, long)]
    target: Option<u64>,

    /// Products to make before statistics restart
    #[arg(short, long)]
    warmup: Option<u64>,

    /// C1 tie-break policy
    #[arg(short, long, value_parser = parse_policy)]
    policy: Option<TieBreak>,

    /// Queue capacity override, e.g. `c12=4` (repeatable)
    #[arg(long = "capacity", value_parser = parse_assignment::<usize>)]
    capacities: Vec<(String, usize)>,

    /// Rate override for a component type or workstation, e.g. `c2=0.1`
    /// or `w1=0.3` (repeatable)
    #[arg(long = "rate", value_parser = parse_assignment::<f64>)]
    rates: Vec<(String, f64)>,

    /// Run replications on all cores
    #[arg(long, conflicts_with = "trace")]
    parallel: bool,

    /// Log every observation at debug level
    #[arg(long)]
    trace: bool,

    /// Print the summary as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn parse_policy(s: &str) -> Result<TieBreak, String> {
    let name = match s {
        "lowest" => "lowest-index",
        "highest" => "highest-index",
        other => other,
    };
    TieBreak::from_name(name).ok_or_else(|| {
        format!("unknown policy '{s}' (expected lowest, highest, random, or prefer-blocking)")
    })
}

fn parse_assignment<T: std::str::FromStr>(s: &str) -> Result<(String, T), String>
where
    T::Err: std::fmt::Display,
{
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let value = value.parse().map_err(|e| format!("bad value in '{s}': {e}"))?;
    Ok((name.to_string(), value))
}

/// Merge the scenario file (if any) with command-line overrides.
fn build_config(args: &Args) -> Result<(SimConfig, usize), Box<dyn std::error::Error>> {
    let (mut config, file_replications) = match &args.config {
        Some(path) => {
            info!(file = %path.display(), "loading scenario");
            let scenario = load_scenario(path)?;
            (scenario.config, scenario.replications)
        }
        None => (SimConfig::default(), None),
    };

    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(target) = args.target {
        config = config.with_target(target);
    }
    if let Some(warmup) = args.warmup {
        config = config.with_warmup(warmup);
    }
    if let Some(policy) = args.policy {
        config = config.with_tie_break(policy);
    }
    for (name, capacity) in &args.capacities {
        config = config.with_capacity_named(name, *capacity)?;
    }
    for (name, rate) in &args.rates {
        config = config.with_rate_named(name, *rate)?;
    }
    config.validate()?;

    let replications = args.replications.or(file_replications).unwrap_or(1);
    Ok((config, replications))
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let (config, replications) = build_config(args)?;

    let reports: Vec<RunReport> = if args.trace {
        (0..replications)
            .map(|k| {
                run_replication_observed(
                    replication_config(&config, k),
                    Box::new(|o| debug!(?o, "observation")),
                )
            })
            .collect::<Result<_, _>>()?
    } else if args.parallel {
        run_replications_parallel(&config, replications)?
    } else {
        run_replications(&config, replications)?
    };

    let summary = ReplicationSummary::from_reports(&reports);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for report in &reports {
            println!("{report}");
        }
        print!("{summary}");
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        tracing::error!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("linesim").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn policy_short_names() {
        assert_eq!(parse_policy("lowest"), Ok(TieBreak::LowestIndex));
        assert_eq!(parse_policy("highest"), Ok(TieBreak::HighestIndex));
        assert_eq!(parse_policy("prefer-blocking"), Ok(TieBreak::PreferBlocking));
        assert!(parse_policy("tie123").is_err());
    }

    #[test]
    fn assignments_parse() {
        assert_eq!(parse_assignment::<usize>("c12=4"), Ok(("c12".to_string(), 4)));
        assert!(parse_assignment::<usize>("c12").is_err());
        assert!(parse_assignment::<f64>("w1=fast").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--seed", "9", "--target", "100", "--warmup", "10", "--policy", "random",
            "--capacity", "c2=3", "--rate", "w2=0.5", "-n", "4",
        ]);
        let (config, replications) = build_config(&args).unwrap();
        assert_eq!(replications, 4);
        assert_eq!(config.seed, 9);
        assert_eq!(config.target_products, 100);
        assert_eq!(config.warmup_products, 10);
        assert_eq!(config.tie_break, TieBreak::Random);
        assert_eq!(config.capacity(linesim_core::id::QueueId::C2), 3);
        assert_eq!(
            config.workstation_rate(linesim_core::id::WorkstationId::W2),
            0.5
        );
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = parse(&["--capacity", "w1=3"]);
        assert!(build_config(&args).is_err());
        let args = parse(&["--target", "5", "--warmup", "5"]);
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn parallel_and_trace_conflict() {
        let result = Args::try_parse_from(["linesim", "--parallel", "--trace"]);
        assert!(result.is_err());
    }
}
