//! Per-channel last-action-wins bookkeeping.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Independent stream of map actions, e.g. one per map widget.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Channel(String);

impl Channel {
    pub const DEFAULT: &'static str = "map";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Proof that an action was the newest on its channel when it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Ticket {
    pub channel: Channel,
    pub generation: u64,
    pub action_id: Uuid,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u64,
    action_id: Option<Uuid>,
}

/// Issued ids remembered for duplicate detection; older ids are forgotten.
const ISSUED_CAPACITY: usize = 1_024;

#[derive(Debug)]
pub(crate) struct ChannelRegistry {
    slots: HashMap<Channel, Slot>,
    issued: HashSet<Uuid>,
    /// Insertion order of `issued`, oldest first.
    issued_order: VecDeque<Uuid>,
    capacity: usize,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::with_capacity(ISSUED_CAPACITY)
    }
}

impl ChannelRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            issued: HashSet::new(),
            issued_order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Bumps the channel's generation for `action_id`. `None` if the id is
    /// among the most recently issued ids on any channel.
    pub fn begin(&mut self, channel: &Channel, action_id: Uuid) -> Option<Ticket> {
        if !self.remember(action_id) {
            return None;
        }
        let slot = self.slots.entry(channel.clone()).or_insert(Slot {
            generation: 0,
            action_id: None,
        });
        slot.generation += 1;
        slot.action_id = Some(action_id);
        Some(Ticket {
            channel: channel.clone(),
            generation: slot.generation,
            action_id,
        })
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.slots
            .get(&ticket.channel)
            .is_some_and(|s| s.generation == ticket.generation)
    }

    pub fn current_action(&self, channel: &Channel) -> Option<Uuid> {
        self.slots.get(channel).and_then(|s| s.action_id)
    }

    fn remember(&mut self, action_id: Uuid) -> bool {
        if !self.issued.insert(action_id) {
            return false;
        }
        self.issued_order.push_back(action_id);
        while self.issued_order.len() > self.capacity {
            if let Some(oldest) = self.issued_order.pop_front() {
                self.issued.remove(&oldest);
            }
        }
        true
    }

    /// Makes every in-flight action stale.
    pub fn invalidate_all(&mut self) {
        for slot in self.slots.values_mut() {
            slot.generation += 1;
            slot.action_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_action_supersedes_older() {
        let mut registry = ChannelRegistry::default();
        let map = Channel::default();
        let first = registry.begin(&map, Uuid::new_v4()).unwrap();
        let second = registry.begin(&map, Uuid::new_v4()).unwrap();

        assert!(!registry.is_current(&first));
        assert!(registry.is_current(&second));
        assert_eq!(registry.current_action(&map), Some(second.action_id));
    }

    #[test]
    fn channels_are_independent() {
        let mut registry = ChannelRegistry::default();
        let a = registry.begin(&"left".into(), Uuid::new_v4()).unwrap();
        let b = registry.begin(&"right".into(), Uuid::new_v4()).unwrap();
        assert!(registry.is_current(&a));
        assert!(registry.is_current(&b));
    }

    #[test]
    fn reissued_id_is_rejected() {
        let mut registry = ChannelRegistry::default();
        let id = Uuid::new_v4();
        assert!(registry.begin(&Channel::default(), id).is_some());
        assert!(registry.begin(&"other".into(), id).is_none());
    }

    #[test]
    fn issued_ids_are_bounded() {
        let mut registry = ChannelRegistry::with_capacity(3);
        let map = Channel::default();
        let first = Uuid::new_v4();
        assert!(registry.begin(&map, first).is_some());

        for _ in 0..3 {
            assert!(registry.begin(&map, Uuid::new_v4()).is_some());
        }

        assert_eq!(registry.issued.len(), 3);
        assert_eq!(registry.issued_order.len(), 3);
        assert!(!registry.issued.contains(&first));
        assert!(registry.begin(&map, first).is_some());
    }

    #[test]
    fn recent_ids_stay_rejected_at_capacity() {
        let mut registry = ChannelRegistry::with_capacity(2);
        let map = Channel::default();
        let older = Uuid::new_v4();
        let newer = Uuid::new_v4();
        registry.begin(&map, older).unwrap();
        registry.begin(&map, newer).unwrap();

        assert!(registry.begin(&map, newer).is_none());
        assert!(registry.begin(&map, older).is_none());
    }

    #[test]
    fn invalidate_all_stales_in_flight_tickets() {
        let mut registry = ChannelRegistry::default();
        let ticket = registry.begin(&Channel::default(), Uuid::new_v4()).unwrap();
        registry.invalidate_all();
        assert!(!registry.is_current(&ticket));
        assert_eq!(registry.current_action(&Channel::default()), None);
    }
}
