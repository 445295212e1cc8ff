//! `spacehubd` entry point. The wiring is described in the library crate docs.

use std::sync::Arc;

use spacehub_app::announcer::OccupancyAnnouncer;
use spacehub_app::event_bus::LogErrorSink;
use spacehub_app::model::collection::EntityModelCollection;
use spacehubd::config::Config;
use spacehubd::speaker::TracingSpeaker;
use spacehubd::{registry_file, signal};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.logging.filter)?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting spacehubd");

    let registry = registry_file::import(config.registry_path())?;
    let collection = EntityModelCollection::from_registry(&registry, Arc::new(LogErrorSink))?;

    if config.announcer.enabled {
        collection.subscribe_all(OccupancyAnnouncer::new(TracingSpeaker));
    }

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        stats = signal::run(stdin, &collection) => {
            let stats = stats?;
            tracing::info!(applied = stats.applied, rejected = stats.rejected, "input closed, shutting down");
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("received Ctrl-C, shutting down");
        }
    }

    collection.teardown();
    Ok(())
}
