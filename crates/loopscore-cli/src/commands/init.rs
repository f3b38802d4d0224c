use crate::cli::InitArgs;
use crate::error::{CliError, Result};
use loopscore::core::io::query_file::TomlQueryLoader;
use loopscore::core::io::traits::QueryLoader;
use loopscore::engine::error::PipelineError;
use loopscore::persistence::SinkGuard;
use loopscore::persistence::sqlite::SqliteSink;
use tracing::info;

pub fn run(args: InitArgs) -> Result<()> {
    info!("Preparing result store at {:?}", &args.database);
    let mut sink = SqliteSink::create(&args.database)?;
    let mut guard = SinkGuard::new(&mut sink);

    if !args.query_ids.is_empty() {
        let dir = args.queries.as_ref().ok_or_else(|| {
            CliError::Argument(
                "A query directory (--queries) is required to register queries.".to_string(),
            )
        })?;
        let loader = TomlQueryLoader::new(dir);
        for query_id in &args.query_ids {
            let query = loader.load(query_id).map_err(PipelineError::from)?;
            guard.register_query(&query)?;
            println!(
                "Registered query '{}' with {} loop(s).",
                query_id,
                query.len()
            );
        }
    }
    drop(guard);

    println!("✓ Result store ready at {}", args.database.display());
    Ok(())
}
