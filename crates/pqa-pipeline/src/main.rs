use clap::{Arg, ArgAction, Command};
use pqa_evaluator::ScoreConfig;
use pqa_oracle::{EnvCredentials, NoopTransport, OracleClient, OracleConfig};
use pqa_pipeline::{
    BatchDriver, BatchId, PipelineConfig, PipelineError, RunCoordinator, RunId, RunStore, Stage,
    StageStatus,
};
use pqa_scenario::QualityTier;
use pqa_taxonomy::Catalog;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Command::new("pqa")
        .version(pqa_pipeline::VERSION)
        .about("Plan quality assurance pipeline")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Run the five-stage pipeline for one input")
                .arg(
                    Arg::new("input")
                        .long("input")
                        .required(true)
                        .help("Free-form assertion seeding the run"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .default_value("runs")
                        .help("Run store root directory"),
                )
                .arg(
                    Arg::new("run-id")
                        .long("run-id")
                        .help("Operate on an existing run instead of creating one"),
                )
                .arg(
                    Arg::new("from")
                        .long("from")
                        .help("First stage to run (scenario, assertions, plans, evaluations, report)"),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .help("Last stage to run"),
                )
                .arg(
                    Arg::new("tier")
                        .long("tier")
                        .action(ArgAction::Append)
                        .help("Quality tier to synthesize (top, mid, low); repeatable"),
                )
                .arg(
                    Arg::new("intent")
                        .long("intent")
                        .help("Intent handed to the plan synthesizer"),
                )
                .arg(
                    Arg::new("overwrite")
                        .long("overwrite")
                        .action(ArgAction::SetTrue)
                        .help("Re-run stages even when their checkpoint exists"),
                ),
        )
        .subcommand(
            Command::new("resume")
                .about("Resume an interrupted run from its first missing checkpoint")
                .arg(Arg::new("run-id").required(true).help("Run to resume"))
                .arg(
                    Arg::new("input")
                        .long("input")
                        .required(true)
                        .help("Original input of the run"),
                )
                .arg(Arg::new("out").long("out").default_value("runs")),
        )
        .subcommand(
            Command::new("batch")
                .about("Run the pipeline for every line of an input file")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .help("Input file, one assertion per line"),
                )
                .arg(
                    Arg::new("resume")
                        .long("resume")
                        .help("Resume an existing batch instead of starting one"),
                )
                .arg(Arg::new("out").long("out").default_value("runs")),
        )
        .subcommand(Command::new("catalog").about("Print the dimension catalog"));

    let matches = cli.get_matches();
    let code = match matches.subcommand() {
        Some(("run", args)) => run_command(args).await,
        Some(("resume", args)) => resume_command(args).await,
        Some(("batch", args)) => batch_command(args).await,
        Some(("catalog", _)) => catalog_command(),
        _ => 2,
    };
    std::process::exit(code);
}

fn coordinator(out: &str, config: PipelineConfig) -> Result<RunCoordinator, i32> {
    let catalog = match Catalog::load() {
        Ok(catalog) => Arc::new(catalog),
        Err(err) => {
            tracing::error!(%err, "catalog failed to load");
            return Err(2);
        }
    };
    // The HTTP transport is deployment-specific; the default build wires the
    // noop transport and expects callers to embed the library with a real one.
    let oracle = Arc::new(OracleClient::new(
        Arc::new(NoopTransport),
        Arc::new(EnvCredentials::default()),
        OracleConfig::default(),
    ));
    Ok(RunCoordinator::new(
        RunStore::new(out),
        oracle,
        catalog,
        config,
    ))
}

fn pipeline_config(args: &clap::ArgMatches) -> Result<PipelineConfig, i32> {
    let mut config = PipelineConfig::new().with_score(ScoreConfig::default());
    if let Some(intent) = args.get_one::<String>("intent") {
        config = config.with_intent(intent);
    }
    if args.get_flag("overwrite") {
        config = config.with_overwrite();
    }
    let tiers: Vec<QualityTier> = args
        .get_many::<String>("tier")
        .unwrap_or_default()
        .map(|name| match name.as_str() {
            "top" => Ok(QualityTier::Top),
            "mid" => Ok(QualityTier::Mid),
            "low" => Ok(QualityTier::Low),
            other => {
                tracing::error!(tier = other, "unknown quality tier");
                Err(2)
            }
        })
        .collect::<Result<_, _>>()?;
    if !tiers.is_empty() {
        config = config.with_tiers(tiers);
    }
    Ok(config)
}

fn parse_stage(args: &clap::ArgMatches, name: &str, fallback: Stage) -> Result<Stage, i32> {
    match args.get_one::<String>(name) {
        None => Ok(fallback),
        Some(raw) => Stage::from_str(raw).map_err(|err| {
            tracing::error!(%err, "invalid stage argument");
            2
        }),
    }
}

async fn run_command(args: &clap::ArgMatches) -> i32 {
    let input = args.get_one::<String>("input").cloned().unwrap_or_default();
    let out = args.get_one::<String>("out").cloned().unwrap_or_default();
    let config = match pipeline_config(args) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let coordinator = match coordinator(&out, config) {
        Ok(coordinator) => coordinator,
        Err(code) => return code,
    };

    let from = match parse_stage(args, "from", Stage::ScenarioSynthesis) {
        Ok(stage) => stage,
        Err(code) => return code,
    };
    let to = match parse_stage(args, "to", Stage::ReportSynthesis) {
        Ok(stage) => stage,
        Err(code) => return code,
    };

    let run_id = match args.get_one::<String>("run-id") {
        Some(raw) => match RunId::from_str(raw) {
            Ok(run_id) => run_id,
            Err(err) => {
                tracing::error!(%err, "invalid run id");
                return 2;
            }
        },
        None => match coordinator.store().init_run().await {
            Ok(metadata) => metadata.run_id,
            Err(err) => {
                tracing::error!(%err, "failed to initialize run");
                return 2;
            }
        },
    };

    match coordinator.run_range(run_id, &input, from, to).await {
        Ok(()) => {
            println!("run {run_id} completed");
            0
        }
        Err(err) => failed_run_code(&coordinator, run_id, &err).await,
    }
}

async fn resume_command(args: &clap::ArgMatches) -> i32 {
    let raw = args.get_one::<String>("run-id").cloned().unwrap_or_default();
    let input = args.get_one::<String>("input").cloned().unwrap_or_default();
    let out = args.get_one::<String>("out").cloned().unwrap_or_default();
    let run_id = match RunId::from_str(&raw) {
        Ok(run_id) => run_id,
        Err(err) => {
            tracing::error!(%err, "invalid run id");
            return 2;
        }
    };
    let coordinator = match coordinator(&out, PipelineConfig::new()) {
        Ok(coordinator) => coordinator,
        Err(code) => return code,
    };

    match coordinator.resume(run_id, &input).await {
        Ok(()) => {
            println!("run {run_id} completed");
            0
        }
        Err(err) => failed_run_code(&coordinator, run_id, &err).await,
    }
}

async fn batch_command(args: &clap::ArgMatches) -> i32 {
    let out = args.get_one::<String>("out").cloned().unwrap_or_default();
    let coordinator = match coordinator(&out, PipelineConfig::new()) {
        Ok(coordinator) => coordinator,
        Err(code) => return code,
    };
    let driver = BatchDriver::new(coordinator);

    let outcome = if let Some(raw) = args.get_one::<String>("resume") {
        match BatchId::from_str(raw) {
            Ok(batch_id) => driver.resume(batch_id).await,
            Err(err) => {
                tracing::error!(%err, "invalid batch id");
                return 2;
            }
        }
    } else {
        let Some(file) = args.get_one::<String>("file") else {
            tracing::error!("batch requires --file or --resume");
            return 2;
        };
        let contents = match tokio::fs::read_to_string(file).await {
            Ok(contents) => contents,
            Err(err) => {
                tracing::error!(%err, file, "failed to read input file");
                return 2;
            }
        };
        let inputs: Vec<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        driver.run(inputs).await
    };

    match outcome {
        Ok(summary) => {
            println!(
                "batch {}: {} succeeded, {} failed",
                summary.batch_id, summary.successes, summary.failures
            );
            summary.exit_code()
        }
        Err(PipelineError::BatchAborted { batch_id, source }) => {
            tracing::error!(err = %source, %batch_id, "batch aborted");
            match driver.state(batch_id).await {
                Ok(state) => {
                    let summary = state.summary();
                    println!(
                        "batch {batch_id} aborted: {} succeeded, {} failed",
                        summary.successes, summary.failures
                    );
                    if summary.successes > 0 {
                        1
                    } else {
                        2
                    }
                }
                Err(err) => {
                    tracing::error!(%err, %batch_id, "failed to read back batch state");
                    2
                }
            }
        }
        Err(err) => {
            tracing::error!(%err, "batch failed");
            2
        }
    }
}

fn catalog_command() -> i32 {
    let catalog = match Catalog::load() {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!(%err, "catalog failed to load");
            return 2;
        }
    };

    println!("Structural dimensions:");
    for dim in pqa_taxonomy::StructuralDimension::ALL {
        println!("  {:<3} {:<28} weight {}", dim.id(), dim.name(), dim.weight());
        for candidate in catalog.candidates_for(dim) {
            println!("      -> {:<3} {}", candidate.dimension.id(), candidate.rationale);
        }
    }
    println!("Grounding dimensions:");
    for dim in pqa_taxonomy::GroundingDimension::ALL {
        println!(
            "  {:<3} {:<28} source '{}' weight {}",
            dim.id(),
            dim.name(),
            dim.source_field(),
            dim.weight()
        );
    }
    0
}

/// Exit code for a failed run: 1 when any stage checkpoint survives for
/// resume, 2 when nothing was produced
async fn failed_run_code(coordinator: &RunCoordinator, run_id: RunId, err: &PipelineError) -> i32 {
    tracing::error!(%err, %run_id, "run failed");
    if let Ok(metadata) = coordinator.store().load_metadata(run_id).await {
        let partial = metadata
            .stages
            .values()
            .any(|status| *status != StageStatus::Failed);
        if partial {
            return 1;
        }
    }
    2
}
