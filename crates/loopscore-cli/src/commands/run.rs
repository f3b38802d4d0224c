use crate::cli::RunArgs;
use crate::config::{DefaultsConfig, PartialRunConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use loopscore::core::io::query_file::TomlQueryLoader;
use loopscore::core::models::query::LoopCategory;
use loopscore::core::repository::fs::FsModelRepository;
use loopscore::engine::error::PipelineError;
use loopscore::engine::progress::ProgressReporter;
use loopscore::engine::scoring::precomputed::PrecomputedScorer;
use loopscore::engine::scoring::registry::ScorerRegistry;
use loopscore::persistence::sqlite::SqliteSink;
use loopscore::persistence::tabular::CsvSink;
use loopscore::persistence::{ResultSink, RunStamp};
use loopscore::workflows::score::{self, ScoringContext};
use std::path::Path;
use tracing::{error, info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialRunConfig::from_file(path)?,
        None => PartialRunConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args, &DefaultsConfig::default())?;

    let registry = build_registry(config.score_table.as_deref())?;
    let repository = FsModelRepository::new();
    let loader = TomlQueryLoader::new(&args.queries);

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let ctx = ScoringContext::new(&config.pipeline, &repository, &registry, &reporter);
    let stamp = RunStamp::now();

    println!("Scoring query '{}'...", args.query_id);
    let saved = match (&args.output.database, &args.output.csv_dir) {
        (Some(database), _) => {
            let mut sink = SqliteSink::open(database)?;
            let outcome = score::run_and_save(&args.query_id, &loader, &mut sink, &stamp, &ctx);
            sink.clean_up();
            finish_stored_run(database, &args.query_id, &stamp, outcome)?
        }
        (None, Some(dir)) => {
            std::fs::create_dir_all(dir)?;
            let mut sink = CsvSink::create(dir)?;
            let outcome = score::run_and_save(&args.query_id, &loader, &mut sink, &stamp, &ctx);
            let marked = record_outcome(&mut sink, &args.query_id, &stamp, &outcome);
            let saved = outcome?;
            marked?;
            saved
        }
        (None, None) => {
            return Err(CliError::Argument(
                "Either --database or --csv-dir is required.".to_string(),
            ));
        }
    };

    println!(
        "✓ Saved {} loop result(s) for query '{}'.",
        saved, args.query_id
    );
    Ok(())
}

/// Registers the precomputed-score scorer for internal loops when a score table is configured.
fn build_registry(score_table: Option<&Path>) -> Result<ScorerRegistry> {
    let Some(path) = score_table else {
        warn!("No score table configured; every loop will yield an empty result.");
        return Ok(ScorerRegistry::new());
    };
    let scorer = PrecomputedScorer::from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    Ok(ScorerRegistry::new().with(LoopCategory::Internal, scorer))
}

/// Records the outcome of a database run through a freshly opened sink.
///
/// The run's own error takes precedence over any failure to open the store again.
fn finish_stored_run(
    database: &Path,
    query_id: &str,
    stamp: &RunStamp,
    outcome: std::result::Result<usize, PipelineError>,
) -> Result<usize> {
    let marked = SqliteSink::open(database)
        .map_err(CliError::from)
        .and_then(|mut marker| record_outcome(&mut marker, query_id, stamp, &outcome));
    if let (Err(e), Err(_)) = (&marked, &outcome) {
        warn!("Could not record failure of query '{}': {}", query_id, e);
    }
    let saved = outcome?;
    marked?;
    Ok(saved)
}

/// Translates the run's outcome into the query's status, then releases the sink.
///
/// A marking failure after a failed run is only logged, so the run's own error is
/// the one reported.
fn record_outcome<S: ResultSink + ?Sized>(
    sink: &mut S,
    query_id: &str,
    stamp: &RunStamp,
    outcome: &std::result::Result<usize, PipelineError>,
) -> Result<()> {
    let marked = match outcome {
        Ok(_) => sink.mark_all_done(query_id, stamp),
        Err(e) => {
            error!("Query '{}' failed: {}", query_id, e);
            sink.mark_failure(query_id, stamp)
        }
    };
    sink.clean_up();

    match marked {
        Err(e) if outcome.is_err() => {
            warn!("Could not record failure of query '{}': {}", query_id, e);
            Ok(())
        }
        other => other.map_err(CliError::from),
    }
}
