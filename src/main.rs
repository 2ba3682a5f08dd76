use inrix_indexer::config::Config;
use inrix_indexer::db::PgConnector;
use inrix_indexer::indexer::IndexBuilder;
use inrix_indexer::utils::logging::{init_tracing, with_pretty_json_debug};
use mimalloc::MiMalloc;
use tracing::{debug, error, info};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    init_tracing(&cfg.basic.loglevel);

    info!(
        config = %Config::config_path().display(),
        host = %cfg.database.host,
        port = cfg.database.port,
        database = %cfg.database.database,
        schema = %cfg.indexing.schema,
        base_table = %cfg.indexing.base_table,
        partitions = cfg.indexing.partitions.len(),
        retry_interval_secs = cfg.indexing.retry_interval_secs,
        if_not_exists = cfg.indexing.if_not_exists,
        on_fatal = ?cfg.indexing.on_fatal,
        "Configuration loaded"
    );
    with_pretty_json_debug(&cfg.indexing.partitions, |json| {
        debug!(partitions = %json, "Partition plan");
    });

    let settings = cfg.indexing.builder_settings()?;
    let connector = PgConnector::new(&cfg.database);
    let builder = IndexBuilder::connect(connector, settings).await?;
    let report = builder
        .run(&cfg.indexing.partitions)
        .await
        .inspect_err(|e| error!(error = %e, "Index build aborted"))?;

    with_pretty_json_debug(&report, |json| debug!(report = %json, "Run report"));
    info!(
        indexed = report.indexed,
        skipped = report.skipped.len(),
        statements = report.statements,
        reconnects = report.reconnects,
        restarts = report.restarts,
        elapsed_secs = (report.finished_at - report.started_at).num_seconds(),
        "Index build finished"
    );
    Ok(())
}
