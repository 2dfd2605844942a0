//! Lowering of cooked descriptors into one capability descriptor.
//!
//! Every node kind loads the same way: an optional group value to hold, a
//! set of group-value children, a set of leaves, and branches gated by
//! group-value conditions. [`CookedSource`] turns each cooked type into that
//! shape for one language.

use resonar_cooked::{
    AudioNodeCookedData, ExternalSourceCookedData, GroupValueCookedData, GroupValueCookedDataSet,
    InitBankCookedData, LanguageCookedData, LanguageMap, LocalizedAuxBusCookedData,
    LocalizedDialogueEventCookedData, LocalizedEventCookedData, LocalizedShareSetCookedData,
    LocalizedSoundBankCookedData, MediaCookedData, SoundBankCookedData, EventCookedData,
    select_language,
};

use crate::error::{LoaderError, LoaderResult};
use crate::handle::{NodeType, kind};

/// Leaves a node or branch needs resident.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeafSet {
    pub sound_banks: Vec<SoundBankCookedData>,
    pub media: Vec<MediaCookedData>,
    pub external_sources: Vec<ExternalSourceCookedData>,
}

impl LeafSet {
    pub fn of_audio_node(node: &AudioNodeCookedData) -> Self {
        Self {
            sound_banks: node.sound_banks.clone(),
            media: node.media.clone(),
            external_sources: node.external_sources.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.sound_banks.len() + self.media.len() + self.external_sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything the loader needs to know to load one node.
#[derive(Debug, Clone, Default)]
pub struct NodeDescriptor {
    pub language: LanguageCookedData,
    pub debug_string: String,
    pub leaves: LeafSet,
    /// Branches whose leaves load only while their condition is met.
    pub audio_nodes: Vec<(GroupValueCookedDataSet, AudioNodeCookedData)>,
    /// The group value this node holds a reference on.
    pub group_value: Option<GroupValueCookedData>,
    /// Group values loaded as child nodes.
    pub required_group_values: Vec<GroupValueCookedData>,
}

impl NodeDescriptor {
    fn new(language: LanguageCookedData, debug_string: String) -> Self {
        Self {
            language,
            debug_string,
            ..Default::default()
        }
    }

    pub fn has_dependencies(&self) -> bool {
        !self.leaves.is_empty()
            || !self.audio_nodes.is_empty()
            || self.group_value.is_some()
            || !self.required_group_values.is_empty()
    }
}

/// A cooked type the loader can create a node for.
pub trait CookedSource {
    type Kind: NodeType;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor>;
}

fn localized<'a, T>(
    map: &'a LanguageMap<T>,
    language: &LanguageCookedData,
    kind: &str,
    name: &str,
    id: u32,
) -> LoaderResult<(&'a LanguageCookedData, &'a T)> {
    select_language(map, language).ok_or_else(|| LoaderError::UnknownLanguage {
        name: format!("{} {} ({})", kind, name, id),
        language_id: language.language_id,
    })
}

fn in_language(debug: String, language: &LanguageCookedData) -> String {
    format!("{} in language {}", debug, language.debug_string())
}

impl CookedSource for AudioNodeCookedData {
    type Kind = kind::AudioNode;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let mut descriptor = NodeDescriptor::new(language.clone(), self.debug_string());
        descriptor.leaves = LeafSet::of_audio_node(self);
        Ok(descriptor)
    }
}

impl CookedSource for EventCookedData {
    type Kind = kind::Event;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let mut descriptor = NodeDescriptor::new(language.clone(), self.debug_string());
        descriptor.leaves = LeafSet {
            sound_banks: self.sound_banks.clone(),
            media: self.media.clone(),
            external_sources: self.external_sources.clone(),
        };
        descriptor.audio_nodes = self
            .audio_nodes
            .iter()
            .map(|(condition, node)| (condition.clone(), node.clone()))
            .collect();
        descriptor.required_group_values =
            self.required_group_value_set.iter().cloned().collect();
        Ok(descriptor)
    }
}

impl CookedSource for LocalizedEventCookedData {
    type Kind = kind::Event;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let (selected, event) = localized(
            &self.event_language_map,
            language,
            "Event",
            &self.debug_name,
            self.event_id,
        )?;
        let mut descriptor = event.describe(selected)?;
        descriptor.debug_string = in_language(descriptor.debug_string, selected);
        Ok(descriptor)
    }
}

impl CookedSource for LocalizedDialogueEventCookedData {
    type Kind = kind::DialogueEvent;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let (selected, dialogue) = localized(
            &self.dialogue_event_language_map,
            language,
            "DialogueEvent",
            &self.debug_name,
            self.dialogue_event_id,
        )?;
        let mut descriptor =
            NodeDescriptor::new(selected.clone(), in_language(dialogue.debug_string(), selected));
        descriptor.leaves.sound_banks = dialogue.sound_banks.clone();
        descriptor.audio_nodes = dialogue
            .audio_nodes
            .iter()
            .map(|(condition, node)| (condition.clone(), node.clone()))
            .collect();
        Ok(descriptor)
    }
}

impl CookedSource for LocalizedAuxBusCookedData {
    type Kind = kind::AuxBus;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let (selected, bus) = localized(
            &self.aux_bus_language_map,
            language,
            "AuxBus",
            &self.debug_name,
            self.aux_bus_id,
        )?;
        let mut descriptor =
            NodeDescriptor::new(selected.clone(), in_language(bus.debug_string(), selected));
        descriptor.leaves.sound_banks = bus.sound_banks.clone();
        descriptor.leaves.media = bus.media.clone();
        Ok(descriptor)
    }
}

impl CookedSource for LocalizedShareSetCookedData {
    type Kind = kind::ShareSet;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let (selected, share_set) = localized(
            &self.share_set_language_map,
            language,
            "ShareSet",
            &self.debug_name,
            self.share_set_id,
        )?;
        let mut descriptor = NodeDescriptor::new(
            selected.clone(),
            in_language(share_set.debug_string(), selected),
        );
        descriptor.leaves.sound_banks = share_set.sound_banks.clone();
        descriptor.leaves.media = share_set.media.clone();
        Ok(descriptor)
    }
}

impl CookedSource for LocalizedSoundBankCookedData {
    type Kind = kind::SoundBank;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let (selected, bank) = localized(
            &self.sound_bank_language_map,
            language,
            "SoundBank",
            &self.debug_name,
            self.sound_bank_id,
        )?;
        let mut descriptor =
            NodeDescriptor::new(selected.clone(), in_language(bank.debug_string(), selected));
        descriptor.leaves.sound_banks = vec![bank.clone()];
        Ok(descriptor)
    }
}

impl CookedSource for MediaCookedData {
    type Kind = kind::Media;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let mut descriptor = NodeDescriptor::new(language.clone(), self.debug_string());
        descriptor.leaves.media = vec![self.clone()];
        Ok(descriptor)
    }
}

impl CookedSource for ExternalSourceCookedData {
    type Kind = kind::ExternalSource;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let mut descriptor = NodeDescriptor::new(language.clone(), self.debug_string());
        descriptor.leaves.external_sources = vec![self.clone()];
        Ok(descriptor)
    }
}

impl CookedSource for InitBankCookedData {
    type Kind = kind::InitBank;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        let mut descriptor = NodeDescriptor::new(language.clone(), self.debug_string());
        descriptor.leaves.sound_banks = vec![self.sound_bank.clone()];
        descriptor.leaves.media = self.media.clone();
        Ok(descriptor)
    }
}

impl CookedSource for GroupValueCookedData {
    type Kind = kind::GroupValue;

    fn describe(&self, language: &LanguageCookedData) -> LoaderResult<NodeDescriptor> {
        if !self.is_valid() {
            return Err(LoaderError::EmptyDescriptor {
                name: self.debug_string(),
            });
        }
        let mut descriptor = NodeDescriptor::new(language.clone(), self.debug_string());
        descriptor.group_value = Some(self.clone());
        Ok(descriptor)
    }
}
