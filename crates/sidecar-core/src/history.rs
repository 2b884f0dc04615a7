use crate::registry::{CategoryRegistry, UnknownCategory};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub category: String,
    pub payload: Value,
}

/// Bounded per-category retention of received payloads. Each category holds
/// at most its configured depth; overflow evicts the chronologically oldest
/// entry first.
#[derive(Debug)]
pub struct HistoryStore {
    depths: HashMap<String, usize>,
    entries: HashMap<String, VecDeque<HistoryEntry>>,
}

impl HistoryStore {
    pub fn new(registry: &CategoryRegistry) -> Self {
        let mut depths = HashMap::new();
        let mut entries = HashMap::new();
        for config in registry.configs() {
            depths.insert(config.name.clone(), config.history_depth);
            entries.insert(config.name.clone(), VecDeque::new());
        }
        Self { depths, entries }
    }

    /// Stamp and retain a payload; evicts the single oldest entry when the
    /// category would exceed its depth.
    pub fn append(&mut self, category: &str, payload: Value) -> Result<(), UnknownCategory> {
        let depth = *self
            .depths
            .get(category)
            .ok_or_else(|| UnknownCategory(category.to_string()))?;
        let queue = self
            .entries
            .get_mut(category)
            .ok_or_else(|| UnknownCategory(category.to_string()))?;
        queue.push_back(HistoryEntry {
            at: Utc::now(),
            category: category.to_string(),
            payload,
        });
        while queue.len() > depth {
            queue.pop_front();
        }
        Ok(())
    }

    /// Snapshot of a category's retained entries, oldest first. Unknown
    /// categories read as empty.
    pub fn get(&self, category: &str) -> Vec<HistoryEntry> {
        self.entries
            .get(category)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self, category: &str) -> usize {
        self.entries.get(category).map(VecDeque::len).unwrap_or(0)
    }

    pub fn is_empty(&self, category: &str) -> bool {
        self.len(category) == 0
    }

    pub fn clear(&mut self, category: &str) {
        if let Some(queue) = self.entries.get_mut(category) {
            queue.clear();
        }
    }

    pub fn clear_all(&mut self) {
        for queue in self.entries.values_mut() {
            queue.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> HistoryStore {
        HistoryStore::new(&CategoryRegistry::sidecar_default())
    }

    #[test]
    fn append_retains_in_chronological_order() {
        let mut history = store();
        for i in 0..3 {
            history
                .append("nodes", json!([{"id": i}]))
                .expect("append");
        }
        let entries = history.get("nodes");
        assert_eq!(entries.len(), 3);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.category, "nodes");
            assert_eq!(entry.payload, json!([{"id": i}]));
        }
        assert!(entries.windows(2).all(|pair| pair[0].at <= pair[1].at));
    }

    #[test]
    fn depth_bound_holds_after_any_sequence_of_appends() {
        let mut history = store();
        let registry = CategoryRegistry::sidecar_default();
        for category in ["nodes", "phones", "pdus", "leases"] {
            let depth = registry.get(category).expect("config").history_depth;
            for i in 0..(depth * 3 + 1) {
                history.append(category, json!(i)).expect("append");
                assert!(history.len(category) <= depth);
            }
        }
    }

    #[test]
    fn overflow_evicts_the_single_oldest_entry() {
        let mut history = store();
        let depth = 2; // leases
        for i in 0..=depth {
            history.append("leases", json!(i)).expect("append");
        }
        let entries = history.get("leases");
        assert_eq!(entries.len(), depth);
        // entry 0 is gone, the survivors keep their relative order
        assert_eq!(entries[0].payload, json!(1));
        assert_eq!(entries[1].payload, json!(2));
    }

    #[test]
    fn unknown_category_append_is_rejected_and_store_untouched() {
        let mut history = store();
        history.append("nodes", json!([])).expect("append");
        let err = history.append("usrps", json!([])).unwrap_err();
        assert_eq!(err, UnknownCategory("usrps".to_string()));
        assert_eq!(history.len("nodes"), 1);
        assert!(history.get("usrps").is_empty());
    }

    #[test]
    fn clear_is_per_category_and_clear_all_is_global() {
        let mut history = store();
        history.append("nodes", json!(1)).expect("append");
        history.append("leases", json!(2)).expect("append");

        history.clear("nodes");
        assert!(history.is_empty("nodes"));
        assert_eq!(history.len("leases"), 1);

        history.append("nodes", json!(3)).expect("append");
        history.clear_all();
        assert!(history.is_empty("nodes"));
        assert!(history.is_empty("leases"));
    }
}
