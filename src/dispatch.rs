use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::gamerpower::{Giveaway, GiveawaySource};
use crate::store::SentStore;
use crate::telegram::Notifier;

/// Pause between consecutive Telegram calls, a courtesy to the API's
/// flood limits.
const DELIVERY_PAUSE: Duration = Duration::from_millis(500);

/// What one poll cycle did, for the logs and for assertions.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub delivered: usize,
    pub skipped_seen: usize,
    pub skipped_type: usize,
}

/// Drive the poll loop: one cycle in single-run mode, otherwise cycle
/// and sleep forever. Both modes share the same cycle logic.
pub async fn run(
    source: &dyn GiveawaySource,
    notifier: &dyn Notifier,
    store: &SentStore,
    config: &Config,
) -> Result<()> {
    loop {
        let report = run_cycle(source, notifier, store, config).await;
        info!(
            "Cycle done: {} fetched, {} delivered, {} already sent, {} wrong type",
            report.fetched, report.delivered, report.skipped_seen, report.skipped_type
        );

        if config.single_run {
            info!("Single-run mode, exiting after one cycle");
            return Ok(());
        }

        info!("Sleeping {}s until the next poll", config.poll_interval_secs);
        tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
    }
}

/// One full pass: load state, fetch the listing, deliver what is new,
/// persist the grown id set if anything went out. Every failure past
/// configuration is soft; the next cycle retries implicitly.
pub async fn run_cycle(
    source: &dyn GiveawaySource,
    notifier: &dyn Notifier,
    store: &SentStore,
    config: &Config,
) -> CycleReport {
    let mut sent_ids = store.load();

    let giveaways = match source.fetch().await {
        Ok(listing) => listing,
        Err(e) => {
            error!("Fetch failed, treating as an empty listing: {:#}", e);
            Vec::new()
        }
    };

    let mut report = CycleReport {
        fetched: giveaways.len(),
        ..CycleReport::default()
    };
    let mut newly_sent: HashSet<u64> = HashSet::new();

    // Oldest entries first so they end up at the top of the channel.
    for giveaway in giveaways.iter().rev() {
        let id = match giveaway.id {
            Some(id) => id,
            None => continue,
        };

        if sent_ids.contains(&id) {
            report.skipped_seen += 1;
            continue;
        }

        if !giveaway.is_game() {
            // Not recorded: the item stays eligible if its tag ever
            // matches on a later poll.
            report.skipped_type += 1;
            continue;
        }

        if deliver_to_all(notifier, &config.channel_ids, giveaway).await {
            info!("Sent: {}", title_of(giveaway));
            newly_sent.insert(id);
            report.delivered += 1;
        }
    }

    if newly_sent.is_empty() {
        info!("No new giveaways this cycle");
    } else {
        sent_ids.extend(newly_sent.iter().copied());
        if let Err(e) = store.save(&sent_ids) {
            warn!("Failed to persist sent-games list: {:#}", e);
        }
    }

    report
}

/// Deliver one item to every channel in configured order. True only
/// when every channel accepted it; a failed channel is logged and the
/// rest are still attempted.
async fn deliver_to_all(
    notifier: &dyn Notifier,
    channels: &[String],
    giveaway: &Giveaway,
) -> bool {
    let mut all_sent = true;

    for channel in channels {
        if let Err(e) = notifier.deliver(channel, giveaway).await {
            warn!(
                "Failed to deliver {:?} to {}: {:#}",
                title_of(giveaway),
                channel,
                e
            );
            all_sent = false;
        }
        tokio::time::sleep(DELIVERY_PAUSE).await;
    }

    all_sent
}

fn title_of(giveaway: &Giveaway) -> &str {
    giveaway.title.as_deref().unwrap_or("Unknown Game")
}
