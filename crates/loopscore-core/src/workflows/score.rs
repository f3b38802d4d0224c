use crate::core::io::traits::QueryLoader;
use crate::core::models::query::{Loop, Query};
use crate::core::models::result::LoopResult;
use crate::core::repository::{ModelRepository, ModelSet};
use crate::engine::config::PipelineConfig;
use crate::engine::error::PipelineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scoring::registry::ScorerRegistry;
use crate::persistence::error::PersistenceError;
use crate::persistence::{ResultSink, RunStamp, SinkGuard};
use tracing::{debug, info, instrument};

/// Everything a scoring run reads but never owns.
pub struct ScoringContext<'a> {
    pub config: &'a PipelineConfig,
    pub repository: &'a dyn ModelRepository,
    pub registry: &'a ScorerRegistry,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(
        config: &'a PipelineConfig,
        repository: &'a dyn ModelRepository,
        registry: &'a ScorerRegistry,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            repository,
            registry,
            reporter,
        }
    }
}

/// Scores every loop of `query`.
///
/// Returns one list per loop, in the query's loop order. Loops whose category has no
/// registered scorer yield an empty list without their models being loaded. The first
/// model-loading or scoring failure aborts the whole run, so nothing is handed on to
/// persistence unless every loop was scored.
#[instrument(skip_all, name = "scoring_workflow", fields(query_id = %query.id()))]
pub fn run(query: &Query, ctx: &ScoringContext) -> Result<Vec<Vec<LoopResult>>, PipelineError> {
    ctx.reporter.report(Progress::PhaseStart { name: "Scoring" });
    info!("Scoring {} loop(s).", query.len());
    ctx.reporter.report(Progress::TaskStart {
        total_steps: query.len() as u64,
    });

    let mut results = Vec::with_capacity(query.len());
    for lp in query {
        ctx.reporter.report(Progress::LoopStart {
            loop_id: lp.id(),
            category: lp.category(),
        });
        results.push(score_loop(lp, ctx)?);
        ctx.reporter.report(Progress::TaskIncrement);
    }

    ctx.reporter.report(Progress::TaskFinish);
    ctx.reporter.report(Progress::PhaseFinish);
    info!(
        "Scoring complete: {} loop result(s).",
        results.iter().map(Vec::len).sum::<usize>()
    );
    Ok(results)
}

fn score_loop(lp: &Loop, ctx: &ScoringContext) -> Result<Vec<LoopResult>, PipelineError> {
    let Some(scorer) = ctx.registry.scorer_for(lp.category()) else {
        debug!(
            "No scorer registered for {} loops; loop {} yields no results.",
            lp.category(),
            lp.id()
        );
        return Ok(Vec::new());
    };

    let dir = ctx.config.model_dir(lp.category());
    let models = ModelSet::load(ctx.repository, &dir, &ctx.config.models.model_type)
        .map_err(|source| PipelineError::Models {
            dir: dir.clone(),
            source,
        })?;
    debug!(
        "Loop {} ({}): {} model(s) from {:?}",
        lp.id(),
        lp.category(),
        models.names.len(),
        dir
    );

    scorer
        .score(lp, &models, ctx.config.max_alignment_range)
        .map_err(|source| PipelineError::Scoring {
            loop_id: lp.id(),
            source,
        })
}

/// Writes `results` to `sink` and returns how many loop results were saved.
///
/// The header is written once, then each result in order. The sink is cleaned up
/// exactly once afterwards, also when a save fails; the first failure stops the
/// remaining saves and is returned. Status rows are left to the caller.
pub fn persist<S: ResultSink + ?Sized>(
    results: &[Vec<LoopResult>],
    sink: &mut S,
    stamp: &RunStamp,
    reporter: &ProgressReporter,
) -> Result<usize, PersistenceError> {
    let total: usize = results.iter().map(Vec::len).sum();
    reporter.report(Progress::PhaseStart { name: "Persisting" });
    reporter.report(Progress::TaskStart {
        total_steps: total as u64,
    });

    let mut guard = SinkGuard::new(sink);
    guard.write_header()?;

    let mut saved = 0;
    for result in results.iter().flatten() {
        guard.save(result, stamp)?;
        saved += 1;
        reporter.report(Progress::TaskIncrement);
    }
    drop(guard);

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    info!("Persisted {} loop result(s).", saved);
    Ok(saved)
}

/// Loads, scores and persists one query.
///
/// This never marks the query's status. Callers translate `Ok` into
/// [`ResultSink::mark_all_done`] and `Err` into [`ResultSink::mark_failure`],
/// using the same `stamp`. A load failure returns before the sink is touched.
pub fn run_and_save<S: ResultSink + ?Sized>(
    query_id: &str,
    loader: &dyn QueryLoader,
    sink: &mut S,
    stamp: &RunStamp,
    ctx: &ScoringContext,
) -> Result<usize, PipelineError> {
    let query = loader.load(query_id)?;
    let results = run(&query, ctx)?;
    Ok(persist(&results, sink, stamp, ctx.reporter)?)
}
