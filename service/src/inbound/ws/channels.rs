//! In-process publish/subscribe channels for connected sockets.
//!
//! A socket subscribes to `(channel, event)` pairs; the `*` event matches
//! every event on the channel. Published events are serialised once and
//! queued on each subscriber's outbox, which its session loop drains. An
//! outbox holds at most [`OUTBOX_CAPACITY`] frames; events for a subscriber
//! that falls further behind are dropped.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};

use super::messages::ChannelEvent;

/// Event name matching every event of a channel.
pub const ANY_EVENT: &str = "*";

/// Frames a socket may have queued before further events are dropped.
pub const OUTBOX_CAPACITY: usize = 64;

/// Queue of text frames waiting to be written to one socket.
pub type Outbox = mpsc::Sender<String>;

/// A fresh outbox and the receiver its session drains.
pub fn outbox() -> (Outbox, mpsc::Receiver<String>) {
    mpsc::channel(OUTBOX_CAPACITY)
}

#[derive(Debug)]
struct Subscriber {
    events: HashSet<String>,
    outbox: Outbox,
}

impl Subscriber {
    fn wants(&self, event: &str) -> bool {
        self.events.contains(ANY_EVENT) || self.events.contains(event)
    }
}

/// Channel registry keyed by channel then socket id.
#[derive(Debug, Default)]
pub struct Channels {
    channels: RwLock<HashMap<String, HashMap<String, Subscriber>>>,
}

impl Channels {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `socket_id` to `event` on `channel`.
    pub async fn subscribe(&self, channel: &str, event: &str, socket_id: &str, outbox: Outbox) {
        let mut channels = self.channels.write().await;
        let subscriber = channels
            .entry(channel.to_owned())
            .or_default()
            .entry(socket_id.to_owned())
            .or_insert_with(|| Subscriber {
                events: HashSet::new(),
                outbox: outbox.clone(),
            });
        subscriber.outbox = outbox;
        subscriber.events.insert(event.to_owned());
        debug!(channel, event, socket_id, "subscribed");
    }

    /// Drop one subscription; `*` drops every event of the channel.
    pub async fn unsubscribe(&self, channel: &str, event: &str, socket_id: &str) {
        let mut channels = self.channels.write().await;
        let Some(subscribers) = channels.get_mut(channel) else {
            return;
        };
        if let Some(subscriber) = subscribers.get_mut(socket_id) {
            if event == ANY_EVENT {
                subscriber.events.clear();
            } else {
                subscriber.events.remove(event);
            }
            if subscriber.events.is_empty() {
                subscribers.remove(socket_id);
            }
        }
        if subscribers.is_empty() {
            channels.remove(channel);
        }
    }

    /// Forget every subscription held by `socket_id`.
    pub async fn remove_socket(&self, socket_id: &str) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, subscribers| {
            subscribers.remove(socket_id);
            !subscribers.is_empty()
        });
    }

    /// Deliver an event; returns how many sockets it was queued for.
    pub async fn publish(&self, channel: &str, event: &str, data: &Value) -> usize {
        let channels = self.channels.read().await;
        let Some(subscribers) = channels.get(channel) else {
            return 0;
        };
        let frame = match serde_json::to_string(&ChannelEvent {
            channel,
            event,
            data,
        }) {
            Ok(frame) => frame,
            Err(error) => {
                warn!(%error, channel, event, "failed to encode channel event");
                return 0;
            }
        };
        subscribers
            .iter()
            .filter(|(_, subscriber)| subscriber.wants(event))
            .filter(|(socket_id, subscriber)| match subscriber.outbox.try_send(frame.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(%socket_id, channel, event, "subscriber outbox full; dropping event");
                    false
                }
                Err(TrySendError::Closed(_)) => false,
            })
            .count()
    }

    /// Names of channels with at least one subscriber.
    #[cfg(test)]
    pub(crate) async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
