use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::{
    admin::AdminCommands,
    announcements::{AnnouncementScheduler, AnnouncementStore},
    catalog::EventCatalog,
    config::{ConfigManager, Settings},
    dispatch::{EventDispatcher, SourceFilter},
    fanout::AlertRoute,
    model::InboundMessage,
    platform::ConsolePlatform,
    router::{Routed, Router},
    subscriptions::SubscriptionManager,
};

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Stdout carries the relayed alerts, logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn build_router(
    settings: &Settings,
    store: AnnouncementStore,
    platform: &Arc<ConsolePlatform>,
) -> (Arc<AnnouncementScheduler<ConsolePlatform>>, Router<ConsolePlatform>) {
    let route = AlertRoute {
        alerts_channel: settings.alerts_channel_name.clone(),
        source_group: Some(settings.source.group_id),
    };

    log::info!("Announcements stored at {}", store.path().display());
    let scheduler = Arc::new(
        AnnouncementScheduler::new(Arc::clone(platform), route.clone(), store)
            .with_interval(Duration::from_secs(settings.check_interval_seconds.max(1))),
    );

    let catalog = EventCatalog::standard(&settings.seasons);
    let dispatcher = EventDispatcher::new(catalog, Arc::clone(platform), Arc::clone(&scheduler), route)
        .with_source_filter(SourceFilter {
            channel: settings.source.channel_id,
            author: settings.source.author_id,
        });

    let router = Router::new(
        Arc::clone(platform),
        dispatcher,
        SubscriptionManager::new(Arc::clone(platform), settings.setup_channel_name.clone()),
        AdminCommands::new(Arc::clone(platform), settings.admin_user_id),
    );
    (scheduler, router)
}

/// Relay stdin lines as source-channel shouts until EOF or Ctrl-C.
async fn serve(settings: Settings, store: AnnouncementStore) -> io::Result<()> {
    let platform = Arc::new(ConsolePlatform::new(
        &settings.console_groups,
        settings.alerts_channel_name.clone(),
    ));
    let (scheduler, router) = build_router(&settings, store, &platform);
    log::info!(
        "Serving {} group(s) with {} event signatures",
        settings.console_groups.len(),
        router.dispatcher().catalog().signatures().len()
    );

    let ticker = scheduler.start();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let result = loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(text)) => {
                    let message = InboundMessage {
                        text,
                        group: Some(settings.source.group_id),
                        channel: settings.source.channel_id,
                        author: settings.source.author_id,
                    };
                    if let Routed::Relayed(report) = router.on_message(&message).await {
                        if report.matched.is_empty() {
                            log::debug!("No event matched: {}", message.text);
                        }
                    }
                }
                Ok(None) => {
                    log::info!("Input closed, shutting down");
                    break Ok(());
                }
                Err(e) => break Err(e),
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted, shutting down");
                break Ok(());
            }
        }
    };

    ticker.stop().await;
    result
}

pub fn run() {
    setup_logging();

    let config_manager = ConfigManager::from_env();
    let settings = config_manager.load();
    let store = AnnouncementStore::new(config_manager.storage_path(&settings));
    log::info!("Settings loaded from {}", config_manager.config_path().display());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            return;
        }
    };

    if let Err(e) = runtime.block_on(serve(settings, store)) {
        log::error!("Error reading input: {}", e);
    }
}
