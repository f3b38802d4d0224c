use crate::cli::StatusArgs;
use crate::error::Result;
use loopscore::persistence::SinkGuard;
use loopscore::persistence::sqlite::{QueryStatus, QueryStatusRecord, SqliteSink};

pub fn run(args: StatusArgs) -> Result<()> {
    let mut sink = SqliteSink::open(&args.database)?;
    let guard = SinkGuard::new(&mut sink);

    for query_id in &args.query_ids {
        let record = guard.query_status(query_id)?;
        println!("{}", describe(query_id, record.as_ref()));
    }
    Ok(())
}

fn describe(query_id: &str, record: Option<&QueryStatusRecord>) -> String {
    let Some(record) = record else {
        return format!("{query_id}\tnot registered");
    };
    let label = match record.status {
        QueryStatus::Pending => "pending",
        QueryStatus::Done => "done",
        QueryStatus::Failed => "failed",
    };
    match record.time_completed {
        Some(time) => format!("{query_id}\t{label}\t{}", time.to_rfc3339()),
        None => format!("{query_id}\t{label}"),
    }
}
