//! Work-history event ordering.
//!
//! Events that carry an `editid` are ordered by `(editid, ts)`; events
//! without one are ordered by `ts`. The two sorted groups are then merged
//! by timestamp, so a submission logged out of place still lands between
//! the edits it happened between. Equal timestamps across the groups keep
//! file order.

use progsnap_core::{EpochMillis, Event};

/// Sort key for one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderKey {
    /// Event with an editid
    Sequenced {
        /// Edit sequence number
        editid: i64,
        /// Timestamp tie-break
        ts: EpochMillis,
    },
    /// Event without an editid
    Timed {
        /// Timestamp
        ts: EpochMillis,
    },
}

impl OrderKey {
    /// Whether the event carried an editid
    #[must_use]
    pub const fn is_sequenced(&self) -> bool {
        matches!(self, Self::Sequenced { .. })
    }

    /// Timestamp of the event
    #[must_use]
    pub const fn ts(&self) -> EpochMillis {
        match self {
            Self::Sequenced { ts, .. } | Self::Timed { ts } => *ts,
        }
    }
}

/// Compute the ordering key of an event
#[must_use]
pub fn order_key(event: &Event) -> OrderKey {
    match event.editid() {
        Some(editid) => OrderKey::Sequenced {
            editid,
            ts: event.ts(),
        },
        None => OrderKey::Timed { ts: event.ts() },
    }
}

/// Sort events in place; ties keep file order
pub fn sort_events(events: &mut Vec<Event>) {
    let (mut sequenced, mut timed): (Vec<_>, Vec<_>) = std::mem::take(events)
        .into_iter()
        .enumerate()
        .map(|(slot, event)| (order_key(&event), slot, event))
        .partition(|(key, _, _)| key.is_sequenced());
    sequenced.sort_by_key(|(key, slot, _)| (*key, *slot));
    timed.sort_by_key(|(key, slot, _)| (*key, *slot));

    let mut sequenced = sequenced.into_iter().peekable();
    let mut timed = timed.into_iter().peekable();
    loop {
        let from_sequenced = match (sequenced.peek(), timed.peek()) {
            (Some((s_key, s_slot, _)), Some((t_key, t_slot, _))) => {
                (s_key.ts(), *s_slot) <= (t_key.ts(), *t_slot)
            }
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if from_sequenced {
            sequenced.next()
        } else {
            timed.next()
        };
        events.extend(next.map(|(_, _, event)| event));
    }
}
