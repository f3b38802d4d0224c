use crate::cli::{MarkArgs, MarkStatus};
use crate::error::Result;
use loopscore::persistence::sqlite::SqliteSink;
use loopscore::persistence::{ResultSink, RunStamp, SinkGuard};
use tracing::info;

pub fn run(args: MarkArgs) -> Result<()> {
    let mut sink = SqliteSink::open(&args.database)?;
    let mut guard = SinkGuard::new(&mut sink);
    let stamp = RunStamp::now();

    match args.status {
        MarkStatus::Done => guard.mark_all_done(&args.query_id, &stamp)?,
        MarkStatus::Failed => guard.mark_failure(&args.query_id, &stamp)?,
    }
    info!("Marked query '{}' as {:?}.", args.query_id, args.status);
    println!("✓ Query '{}' marked as {:?}.", args.query_id, args.status);
    Ok(())
}
