// crates/snare-bus/src/memory.rs
// ============================================================================
// Module: Snare In-Memory Topic Bus
// Description: Single-process TopicBus with ordered logs and consumer groups.
// Purpose: Back local deployments and tests without an external broker.
// Dependencies: snare-core, tokio
// ============================================================================

//! ## Overview
//! [`InMemoryTopicBus`] retains every published message in a per-topic log.
//! Subscribers join a consumer group; messages are partitioned across group
//! members by key hash so one member sees all messages for a given key in
//! publish order. Delivery is at-least-once: a member that joins with
//! `OffsetReset::Earliest` replays the retained log before receiving live
//! messages.
//! Invariants:
//! - Offsets are assigned in publish order per topic and never reused.
//! - A message for key `k` is delivered to exactly one member of each group.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use async_trait::async_trait;
use snare_core::BusError;
use snare_core::BusMessage;
use snare_core::OffsetReset;
use snare_core::Subscription;
use snare_core::TopicBus;
use tokio::sync::Mutex;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Channel capacity for each group member.
const MEMBER_CHANNEL_CAPACITY: usize = 1024;

// ============================================================================
// SECTION: Topic State
// ============================================================================

/// One consumer group member's delivery channel.
#[derive(Debug)]
struct Member {
    /// Sender feeding the member's subscription.
    sender: mpsc::Sender<BusMessage>,
}

/// Consumer group state for one topic.
#[derive(Debug, Default)]
struct Group {
    /// Live members in join order.
    members: Vec<Member>,
}

impl Group {
    /// Picks the member responsible for a key, if any member is alive.
    fn member_for_key(&self, key: &str) -> Option<&Member> {
        if self.members.is_empty() {
            return None;
        }
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "member index is bounded by the member count"
        )]
        let index = (hasher.finish() % self.members.len() as u64) as usize;
        self.members.get(index)
    }

    /// Drops members whose receivers have gone away.
    fn prune_closed(&mut self) {
        self.members.retain(|member| !member.sender.is_closed());
    }
}

/// Retained log and groups for one topic.
#[derive(Debug, Default)]
struct Topic {
    /// Ordered retained messages.
    log: Vec<BusMessage>,
    /// Consumer groups keyed by group name.
    groups: BTreeMap<String, Group>,
}

// ============================================================================
// SECTION: In-Memory Bus
// ============================================================================

/// Single-process topic bus.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTopicBus {
    /// Topics keyed by name.
    topics: Arc<Mutex<BTreeMap<String, Topic>>>,
}

impl InMemoryTopicBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of retained messages on a topic.
    pub async fn retained_len(&self, topic: &str) -> usize {
        let guard = self.topics.lock().await;
        guard.get(topic).map_or(0, |t| t.log.len())
    }
}

#[async_trait]
impl TopicBus for InMemoryTopicBus {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<(), BusError> {
        if topic.is_empty() {
            return Err(BusError::Publish("topic must be set".to_string()));
        }
        let mut guard = self.topics.lock().await;
        let state = guard.entry(topic.to_string()).or_default();
        let message = BusMessage {
            topic: topic.to_string(),
            key: key.to_string(),
            payload,
            offset: state.log.len() as u64,
        };
        state.log.push(message.clone());
        for group in state.groups.values_mut() {
            group.prune_closed();
            if let Some(member) = group.member_for_key(key) {
                // Best-effort delivery; a slow member sees the message again
                // only through an earliest replay, so the send failure is
                // surfaced to the publisher.
                member
                    .sender
                    .send(message.clone())
                    .await
                    .map_err(|_| BusError::Publish("group member channel closed".to_string()))?;
            }
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        topic: &str,
        group: &str,
        reset: OffsetReset,
    ) -> Result<Subscription, BusError> {
        if topic.is_empty() || group.is_empty() {
            return Err(BusError::Subscribe("topic and group must be set".to_string()));
        }
        let (sender, receiver) = mpsc::channel(MEMBER_CHANNEL_CAPACITY);
        let mut guard = self.topics.lock().await;
        let state = guard.entry(topic.to_string()).or_default();
        if reset == OffsetReset::Earliest {
            for message in &state.log {
                sender
                    .send(message.clone())
                    .await
                    .map_err(|_| BusError::Subscribe("subscriber channel closed".to_string()))?;
            }
        }
        state.groups.entry(group.to_string()).or_default().members.push(Member {
            sender,
        });
        Ok(Subscription::new(receiver))
    }
}
