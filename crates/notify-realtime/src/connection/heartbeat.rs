//! Liveness probe for the notification channel.
//!
//! While the channel is open, a `ping` frame goes out every probe interval.
//! The first probe is sent one full interval after the channel opens. The
//! server's `pong` replies are not required; the transport erroring or
//! closing is what surfaces a dead channel.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::message::types::OutboundMessage;

use super::handle::ConnectionHandle;

/// Heartbeat configuration.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatConfig {
    /// Interval between probes.
    pub interval: Duration,
}

/// Runs the probe loop until `shutdown` fires or the manager stops.
///
/// The cadence restarts on every open, so a probe never fires on a channel
/// younger than one interval. Opens are told apart by their connection
/// generation, which also catches a close and reopen coalesced into one
/// status update.
pub async fn run_heartbeat(
    handle: ConnectionHandle,
    config: HeartbeatConfig,
    shutdown: CancellationToken,
) {
    let mut status = handle.subscribe_status();

    loop {
        // Wait for an open channel.
        let opened = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = status.wait_for(|s| s.is_connected()) => result.is_ok(),
        };
        if !opened {
            break;
        }
        // Consume the change we just observed so `changed()` only wakes on
        // the next transition.
        let mut generation = status.borrow_and_update().connection_generation;

        debug!(interval_secs = config.interval.as_secs(), generation, "Heartbeat active");
        let mut ticker = probe_ticker(config.interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = ticker.tick() => {
                    if handle.send(OutboundMessage::Ping) {
                        trace!("Probe sent");
                    } else {
                        trace!("Probe dropped, channel not open");
                    }
                }
                changed = status.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let current = *status.borrow_and_update();
                    if !current.is_connected() {
                        debug!("Heartbeat paused");
                        break;
                    }
                    if current.connection_generation != generation {
                        debug!(
                            generation = current.connection_generation,
                            "Channel reopened, restarting probe cadence"
                        );
                        generation = current.connection_generation;
                        ticker = probe_ticker(config.interval);
                    }
                }
            }
        }
    }
}

/// First tick one full interval from now.
fn probe_ticker(interval: Duration) -> time::Interval {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
