use std::collections::BTreeMap;

use crate::ids::AttributeId;

/// Attribute-keyed amounts used for both costs and requirement thresholds.
///
/// Entries on the same key are summed when maps are merged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ResourceMap(BTreeMap<AttributeId, i32>);

impl ResourceMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn with(mut self, attribute: AttributeId, amount: i32) -> Self {
        self.add(attribute, amount);
        self
    }

    pub fn add(&mut self, attribute: AttributeId, amount: i32) {
        let entry = self.0.entry(attribute).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    pub fn merge(&mut self, other: &ResourceMap) {
        for (&attribute, &amount) in &other.0 {
            self.add(attribute, amount);
        }
    }

    pub fn get(&self, attribute: AttributeId) -> i32 {
        self.0.get(&attribute).copied().unwrap_or(0)
    }

    /// Sum of all positive entries.
    pub fn total(&self) -> i64 {
        self.0.values().map(|&amount| i64::from(amount.max(0))).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeId, i32)> + '_ {
        self.0.iter().map(|(&attribute, &amount)| (attribute, amount))
    }

    pub fn keys(&self) -> impl Iterator<Item = AttributeId> + '_ {
        self.0.keys().copied()
    }

    /// Drops every entry whose key fails `keep`; returns the removed keys.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(AttributeId) -> bool) -> Vec<AttributeId> {
        let removed: Vec<AttributeId> = self.keys().filter(|&key| !keep(key)).collect();
        for key in &removed {
            self.0.remove(key);
        }
        removed
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(AttributeId, i32)> for ResourceMap {
    fn from_iter<I: IntoIterator<Item = (AttributeId, i32)>>(iter: I) -> Self {
        let mut map = ResourceMap::new();
        for (attribute, amount) in iter {
            map.add(attribute, amount);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_shared_keys() {
        let mut costs = ResourceMap::new().with(AttributeId(1), 10);
        costs.merge(&ResourceMap::new().with(AttributeId(1), 5).with(AttributeId(2), 3));
        assert_eq!(costs.get(AttributeId(1)), 15);
        assert_eq!(costs.get(AttributeId(2)), 3);
        assert_eq!(costs.total(), 18);
    }

    #[test]
    fn total_ignores_negative_entries() {
        let costs: ResourceMap = [(AttributeId(1), -4), (AttributeId(2), 6)].into_iter().collect();
        assert_eq!(costs.total(), 6);
    }

    #[test]
    fn retain_reports_dropped_keys() {
        let mut costs = ResourceMap::new().with(AttributeId(1), 1).with(AttributeId(9), 2);
        let dropped = costs.retain_keys(|key| key != AttributeId(9));
        assert_eq!(dropped, vec![AttributeId(9)]);
        assert_eq!(costs.len(), 1);
    }
}
