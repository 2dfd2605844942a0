use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum GroupType {
    Switch,
    State,
    #[default]
    Unknown,
}

/// One switch or state value.
///
/// Identity is `(group_type, group_id, id)`; `debug_name` is ignored by
/// equality, ordering and hashing.
#[derive(Debug, Clone, Default)]
pub struct GroupValueCookedData {
    pub group_type: GroupType,
    pub group_id: u32,
    pub id: u32,
    pub debug_name: String,
}

impl GroupValueCookedData {
    pub fn new(group_type: GroupType, group_id: u32, id: u32) -> Self {
        Self {
            group_type,
            group_id,
            id,
            debug_name: String::new(),
        }
    }

    pub fn switch(group_id: u32, id: u32) -> Self {
        Self::new(GroupType::Switch, group_id, id)
    }

    pub fn state(group_id: u32, id: u32) -> Self {
        Self::new(GroupType::State, group_id, id)
    }

    pub fn with_debug_name(mut self, debug_name: impl Into<String>) -> Self {
        self.debug_name = debug_name.into();
        self
    }

    /// A value with a zero group or value id cannot be loaded.
    pub fn is_valid(&self) -> bool {
        self.group_id != crate::INVALID_ID && self.id != crate::INVALID_ID
    }

    fn identity(&self) -> (GroupType, u32, u32) {
        (self.group_type, self.group_id, self.id)
    }

    pub fn debug_string(&self) -> String {
        let kind = match self.group_type {
            GroupType::Switch => "Switch",
            GroupType::State => "State",
            GroupType::Unknown => "GroupValue",
        };
        format!(
            "{} {} ({}:{})",
            kind, self.debug_name, self.group_id, self.id
        )
    }
}

impl PartialEq for GroupValueCookedData {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for GroupValueCookedData {}

impl Hash for GroupValueCookedData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for GroupValueCookedData {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroupValueCookedData {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

/// The set of group values that must all be loaded for a branch to load.
/// An empty set is unconditional.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GroupValueCookedDataSet {
    pub group_values: BTreeSet<GroupValueCookedData>,
}

impl GroupValueCookedDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.group_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group_values.is_empty()
    }

    pub fn contains(&self, value: &GroupValueCookedData) -> bool {
        self.group_values.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GroupValueCookedData> {
        self.group_values.iter()
    }
}

impl FromIterator<GroupValueCookedData> for GroupValueCookedDataSet {
    fn from_iter<I: IntoIterator<Item = GroupValueCookedData>>(iter: I) -> Self {
        Self {
            group_values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_debug_name() {
        let a = GroupValueCookedData::switch(1, 2).with_debug_name("Surface_Grass");
        let b = GroupValueCookedData::switch(1, 2);
        assert_eq!(a, b);
        assert_ne!(a, GroupValueCookedData::state(1, 2));
    }

    #[test]
    fn test_set_deduplicates() {
        let set: GroupValueCookedDataSet = [
            GroupValueCookedData::switch(1, 2),
            GroupValueCookedData::switch(1, 2).with_debug_name("dup"),
            GroupValueCookedData::state(4, 5),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_validity() {
        assert!(GroupValueCookedData::switch(1, 2).is_valid());
        assert!(!GroupValueCookedData::switch(0, 2).is_valid());
        assert!(!GroupValueCookedData::default().is_valid());
    }
}
