use std::collections::BTreeMap;

use crate::audio_node::{AudioNodeCookedData, DestroyOptions};
use crate::debug::DebugSummary;
use crate::group_value::GroupValueCookedDataSet;
use crate::language::LanguageMap;
use crate::leaf::{ExternalSourceCookedData, MediaCookedData, SoundBankCookedData};

/// An event cooked for one language.
///
/// `audio_nodes` holds the switch-container branches: each branch's leaves
/// are only needed while every group value in its key set is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCookedData {
    pub event_id: u32,
    pub sound_banks: Vec<SoundBankCookedData>,
    pub media: Vec<MediaCookedData>,
    pub external_sources: Vec<ExternalSourceCookedData>,
    pub audio_nodes: BTreeMap<GroupValueCookedDataSet, AudioNodeCookedData>,
    /// Group values the event loads alongside itself.
    pub required_group_value_set: GroupValueCookedDataSet,
    pub destroy_options: DestroyOptions,
    pub debug_name: String,
}

impl EventCookedData {
    pub fn new(event_id: u32, debug_name: impl Into<String>) -> Self {
        Self {
            event_id,
            debug_name: debug_name.into(),
            ..Default::default()
        }
    }

    pub fn debug_string(&self) -> String {
        DebugSummary::new("Event", &self.debug_name, self.event_id)
            .count(self.sound_banks.len(), "SoundBanks")
            .count(self.media.len(), "Media")
            .count(self.external_sources.len(), "ExternalSources")
            .count(self.audio_nodes.len(), "AudioNodes")
            .count(self.required_group_value_set.len(), "GroupValues")
            .suffix(&format!(" ({})", self.destroy_options.short()))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedEventCookedData {
    pub event_language_map: LanguageMap<EventCookedData>,
    pub debug_name: String,
    pub event_id: u32,
}
