use tracing::{error, info};

use doc_indexer::{telemetry, Dependencies, IndexerError};

#[tokio::main]
async fn main() {
    telemetry::init();

    if let Err(e) = run().await {
        error!(error = %e, "Indexer failed to start");
        std::process::exit(1);
    }
}

/// Wire the pipeline against the configured backing stores.
///
/// Initialization verifies that Qdrant is reachable, so a successful run
/// doubles as a deployment health check.
async fn run() -> Result<(), IndexerError> {
    let _deps = Dependencies::new().await?;
    info!("Document indexer initialized, backing stores reachable");
    Ok(())
}
