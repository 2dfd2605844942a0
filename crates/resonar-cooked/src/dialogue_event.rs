use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::audio_node::AudioNodeCookedData;
use crate::debug::DebugSummary;
use crate::group_value::{GroupType, GroupValueCookedData, GroupValueCookedDataSet};
use crate::language::LanguageMap;
use crate::leaf::SoundBankCookedData;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogueEventCookedData {
    pub dialogue_event_id: u32,
    pub sound_banks: Vec<SoundBankCookedData>,
    /// Candidate nodes keyed by the group values gating their leaves.
    ///
    /// Depending on how the project exposes nodes this is either every
    /// node, or a single node with id `0` that serves every resolution.
    pub audio_nodes: BTreeMap<GroupValueCookedDataSet, AudioNodeCookedData>,
    pub debug_name: String,
}

impl DialogueEventCookedData {
    pub fn new(dialogue_event_id: u32, debug_name: impl Into<String>) -> Self {
        Self {
            dialogue_event_id,
            debug_name: debug_name.into(),
            ..Default::default()
        }
    }

    pub fn debug_string(&self) -> String {
        DebugSummary::new("DialogueEvent", &self.debug_name, self.dialogue_event_id)
            .count(self.sound_banks.len(), "SoundBanks")
            .count(self.audio_nodes.len(), "AudioNodes")
            .finish()
    }
}

/// One argument of a dialogue event's resolution path.
///
/// Equality and ordering use `(group_type, group_id)` only.
#[derive(Debug, Clone, Default)]
pub struct DialogueArgumentItem {
    pub group_type: GroupType,
    pub group_id: u32,
    pub debug_name: String,
}

impl DialogueArgumentItem {
    pub fn new(group_type: GroupType, group_id: u32) -> Self {
        Self {
            group_type,
            group_id,
            debug_name: String::new(),
        }
    }

    /// The argument slot a supplied group value would fill.
    pub fn from_group_value(value: &GroupValueCookedData) -> Self {
        Self {
            group_type: value.group_type,
            group_id: value.group_id,
            debug_name: String::new(),
        }
    }

    fn identity(&self) -> (GroupType, u32) {
        (self.group_type, self.group_id)
    }
}

impl PartialEq for DialogueArgumentItem {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for DialogueArgumentItem {}

impl PartialOrd for DialogueArgumentItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DialogueArgumentItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

/// Maps each argument to the slot positions it fills in the resolution key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredArguments {
    pub positions: BTreeMap<DialogueArgumentItem, Vec<i32>>,
}

impl RequiredArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `item` at `position`.
    pub fn with(mut self, item: DialogueArgumentItem, position: i32) -> Self {
        self.positions.entry(item).or_default().push(position);
        self
    }

    /// Number of slots in the resolution key.
    pub fn required_count(&self) -> usize {
        self.positions.values().map(Vec::len).sum()
    }

    pub fn positions_of(&self, item: &DialogueArgumentItem) -> Option<&[i32]> {
        self.positions.get(item).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedDialogueEventCookedData {
    pub dialogue_event_language_map: LanguageMap<DialogueEventCookedData>,
    pub debug_name: String,
    pub dialogue_event_id: u32,
    pub required_arguments: RequiredArguments,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_count_sums_positions() {
        let required = RequiredArguments::new()
            .with(DialogueArgumentItem::new(GroupType::Switch, 1), 0)
            .with(DialogueArgumentItem::new(GroupType::Switch, 2), 1)
            .with(DialogueArgumentItem::new(GroupType::Switch, 2), 2);
        assert_eq!(required.required_count(), 3);
        assert_eq!(
            required.positions_of(&DialogueArgumentItem::new(GroupType::Switch, 2)),
            Some(&[1, 2][..])
        );
        assert_eq!(
            required.positions_of(&DialogueArgumentItem::new(GroupType::State, 2)),
            None
        );
    }

    #[test]
    fn test_argument_item_ignores_debug_name() {
        let mut named = DialogueArgumentItem::new(GroupType::State, 9);
        named.debug_name = "Mood".into();
        assert_eq!(named, DialogueArgumentItem::new(GroupType::State, 9));
        assert_eq!(
            DialogueArgumentItem::from_group_value(&GroupValueCookedData::state(9, 4)),
            named
        );
    }
}
