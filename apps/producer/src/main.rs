mod config;
mod controller;
mod shutdown;

use std::sync::Arc;

use config::Config;
use controller::{Controller, ControllerSettings};
use pricebridge_broker::{KafkaConfig, KafkaSink};
use pricebridge_feed::CoinGeckoClient;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing();

    tracing::info!(
        brokers = %config.kafka_brokers,
        topic = %config.kafka_topic,
        interval_secs = config.poll_interval.as_secs(),
        assets = %config.asset_ids.join(","),
        "crypto price producer starting"
    );

    // Exhausting the bounded connection retries propagates here and exits
    // the process with a non-zero status.
    let sink = KafkaSink::connect(KafkaConfig {
        brokers: config.kafka_brokers.clone(),
        topic: config.kafka_topic.clone(),
    })
    .await?;

    let feed = CoinGeckoClient::new(config.api_base_url.clone());

    let (trigger, token) = shutdown::channel();
    shutdown::spawn_signal_listener(trigger);

    let settings = ControllerSettings {
        poll_interval: config.poll_interval,
        asset_ids: config.asset_ids.clone(),
        vs_currency: config.vs_currency.clone(),
    };
    Controller::new(Arc::new(feed), Arc::new(sink), settings, token)
        .run()
        .await;

    tracing::info!("producer shut down cleanly");
    Ok(())
}

fn init_tracing() {
    let log_format = std::env::var("BRIDGE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}
