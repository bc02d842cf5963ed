//! Fan-out of workflow events to live subscribers.
//!
//! Each channel is a `tokio::sync::broadcast` created on first subscribe and
//! dropped once its last subscriber is gone. There is no backlog: a subscriber
//! only sees events published after it subscribed.

use dashmap::DashMap;
use futures::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use crate::models::{Channel, EventKind, NotificationEvent};
use crate::services::policy::{can_subscribe, Principal};
use crate::services::ServiceError;

pub struct NotificationDispatcher {
    channels: DashMap<Channel, broadcast::Sender<NotificationEvent>>,
    capacity: usize,
}

impl NotificationDispatcher {
    /// `capacity` is how many undelivered events a slow subscriber may fall
    /// behind before it starts skipping.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Deliver to every current subscriber of `channel`. Never blocks and never
    /// fails; returns how many subscribers the event was handed to.
    pub fn publish(&self, channel: Channel, kind: EventKind, payload: serde_json::Value) -> usize {
        let event = NotificationEvent::new(channel, kind, payload);

        let delivered = match self.channels.get(&channel) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };

        if delivered == 0 {
            self.channels
                .remove_if(&channel, |_, sender| sender.receiver_count() == 0);
            tracing::debug!(channel = %channel, event = kind.as_str(), "No subscribers for event");
        } else {
            tracing::info!(
                channel = %channel,
                event = kind.as_str(),
                subscribers = delivered,
                "Event published"
            );
        }

        metrics::counter!("notifications_published_total", "event" => kind.as_str()).increment(1);

        delivered
    }

    /// Open a subscription after checking the caller may listen on `channel`.
    pub fn subscribe(
        &self,
        principal: &Principal,
        channel: Channel,
    ) -> Result<Subscription, ServiceError> {
        if !can_subscribe(principal, &channel) {
            tracing::warn!(
                identity_id = %principal.identity_id,
                channel = %channel,
                "Subscription refused"
            );
            return Err(ServiceError::Forbidden);
        }

        let receiver = self
            .channels
            .entry(channel)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        tracing::debug!(identity_id = %principal.identity_id, channel = %channel, "Subscribed");

        Ok(Subscription { channel, receiver })
    }
}

/// One subscriber's view of a channel.
pub struct Subscription {
    channel: Channel,
    receiver: broadcast::Receiver<NotificationEvent>,
}

impl Subscription {
    /// Next event, or `None` once the channel is gone. Skips over events lost
    /// to lag.
    #[cfg(test)]
    async fn recv(&mut self) -> Option<NotificationEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %self.channel, skipped, "Subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// An already-delivered event, without waiting.
    pub fn try_recv(&mut self) -> Option<NotificationEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = NotificationEvent> + Send + 'static {
        let channel = self.channel;
        BroadcastStream::new(self.receiver).filter_map(move |result| async move {
            match result {
                Ok(event) => Some(event),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(channel = %channel, skipped, "Subscriber lagged");
                    None
                }
            }
        })
    }
}
