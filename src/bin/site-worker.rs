//! Worker binary: load configuration, initialize logging, connect the queue
//! client, and run the dispatch loop until the process is killed.

use std::sync::Arc;
use std::time::Duration;

use site_worker::config::WorkerConfig;
use site_worker::dispatch::{OperationRegistry, ProcessInvoker};
use site_worker::error::WorkerError;
use site_worker::logging;
use site_worker::messaging::PgmqClient;
use site_worker::worker::{Worker, WorkerSettings};

#[tokio::main]
async fn main() -> site_worker::Result<()> {
    logging::init_logging();

    let config = WorkerConfig::load()?;

    let queue = PgmqClient::new(&config.database_url)
        .await
        .map_err(|source| WorkerError::Startup { source })?
        .with_queue_settings(&config.queue);
    queue.ensure_queue_exists(&config.queue.name).await;

    let registry = OperationRegistry::from_rows(&config.operations);
    let invoker = ProcessInvoker::new(Duration::from_secs(config.invocation.timeout_seconds));

    let worker = Worker::new(
        Arc::new(queue),
        Arc::new(invoker),
        registry,
        WorkerSettings::from_config(&config),
    );

    worker.run().await;
    Ok(())
}
