//! The rotating presentation queue and "seen" tracking across refreshes.
//!
//! The queue is rebuilt from scratch on every refresh. Identity survives a
//! rebuild through [`AlertKey`]: the currently displayed alert keeps its place,
//! and alerts never seen before are inserted as a block right after it.

use std::collections::{HashMap, HashSet};

use alert_core::{AlertKey, ClassifiedAlert, GroupedAlerts, Palette};
use serde::Serialize;
use tracing::{debug, info};

/// One slot in the presentation queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueEntry {
    pub key: AlertKey,
    pub alert: ClassifiedAlert,
    /// Not yet displayed for a full window.
    pub is_new: bool,
}

/// Ordered, de-duplicated alerts ready for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentationQueue {
    entries: Vec<QueueEntry>,
}

impl PresentationQueue {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    /// Index of the entry with this key.
    pub fn position(&self, key: &AlertKey) -> Option<usize> {
        self.entries.iter().position(|e| &e.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AlertKey> {
        self.entries.iter().map(|e| &e.key)
    }
}

/// Flatten grouped alerts in category priority order, applying color overrides.
///
/// Alerts sharing a key collapse to one entry: the first position is kept and
/// the later alert's data replaces it.
pub fn flatten(grouped: &GroupedAlerts, palette: &Palette) -> Vec<(AlertKey, ClassifiedAlert)> {
    let mut flat: Vec<(AlertKey, ClassifiedAlert)> = Vec::with_capacity(grouped.len());
    let mut index_of: HashMap<AlertKey, usize> = HashMap::new();

    for (category, alerts) in grouped.iter() {
        let color = palette.color(category);
        for alert in alerts {
            let mut alert = alert.clone();
            alert.color = color.to_string();
            let key = alert.key();
            match index_of.get(&key) {
                Some(&i) => {
                    debug!(key = %key, "Duplicate alert key, replacing in place");
                    flat[i].1 = alert;
                }
                None => {
                    index_of.insert(key.clone(), flat.len());
                    flat.push((key, alert));
                }
            }
        }
    }
    flat
}

/// Owns the presentation queue and the session's seen set.
#[derive(Debug, Default)]
pub struct QueueManager {
    queue: PresentationQueue,
    seen: HashSet<AlertKey>,
    initialized: bool,
}

impl QueueManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self) -> &PresentationQueue {
        &self.queue
    }

    pub fn is_seen(&self, key: &AlertKey) -> bool {
        self.seen.contains(key)
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// True once a non-empty refresh has seeded the seen set.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Rebuild the queue from a filtered refresh.
    ///
    /// `current` is the key on display and `current_index` its index in the
    /// previous queue. The first non-empty refresh marks everything seen.
    pub fn rebuild(
        &mut self,
        grouped: &GroupedAlerts,
        palette: &Palette,
        current: Option<&AlertKey>,
        current_index: usize,
    ) -> &PresentationQueue {
        let flat = flatten(grouped, palette);

        if !self.initialized {
            if !flat.is_empty() {
                self.seen.extend(flat.iter().map(|(key, _)| key.clone()));
                self.initialized = true;
                info!(count = flat.len(), "Seeded seen set from first refresh");
            }
            self.queue = PresentationQueue {
                entries: flat
                    .into_iter()
                    .map(|(key, alert)| QueueEntry {
                        key,
                        alert,
                        is_new: false,
                    })
                    .collect(),
            };
            return &self.queue;
        }

        let (mut fresh, mut known): (Vec<_>, Vec<_>) = flat
            .into_iter()
            .map(|(key, alert)| QueueEntry {
                is_new: !self.seen.contains(&key),
                key,
                alert,
            })
            .partition(|entry| entry.is_new);

        let mut shown_fresh = None;
        let insert_at = match current {
            Some(key) => match known.iter().position(|e| &e.key == key) {
                Some(i) => i + 1,
                None => match fresh.iter().position(|e| &e.key == key) {
                    // The new alert on display keeps its offset; the rest follow it.
                    Some(i) => {
                        shown_fresh = Some(fresh.remove(i));
                        current_index.min(known.len())
                    }
                    None => 0,
                },
            },
            None => 0,
        };

        if !fresh.is_empty() {
            debug!(count = fresh.len(), insert_at, "Merging new alerts into queue");
        }

        let tail = known.split_off(insert_at);
        let mut entries = known;
        entries.extend(shown_fresh);
        entries.extend(fresh);
        entries.extend(tail);

        self.queue = PresentationQueue { entries };
        &self.queue
    }

    /// Record that an alert has been displayed for a full window.
    pub fn mark_seen(&mut self, key: &AlertKey) -> bool {
        let inserted = self.seen.insert(key.clone());
        for entry in self.queue.entries.iter_mut().filter(|e| &e.key == key) {
            entry.is_new = false;
        }
        if inserted {
            debug!(key = %key, "Marked alert seen");
        }
        inserted
    }
}
