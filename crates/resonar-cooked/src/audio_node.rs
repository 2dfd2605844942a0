use crate::debug::DebugSummary;
use crate::leaf::{ExternalSourceCookedData, MediaCookedData, SoundBankCookedData};

/// When the leaves of an audio node are brought in by its runtime owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioNodeLoading {
    /// Loaded as soon as the owning dialogue event loads.
    AlwaysLoad,
    /// Loaded when something first references the node.
    LoadOnReference,
    /// Loaded when dialogue resolution picks the node.
    #[default]
    LoadOnResolve,
    /// Loaded by the playback layer when the node is enqueued.
    LoadOnEnqueue,
}

impl AudioNodeLoading {
    /// Whether a successful resolution should trigger a load.
    pub fn loads_on_resolve(self) -> bool {
        matches!(
            self,
            AudioNodeLoading::AlwaysLoad
                | AudioNodeLoading::LoadOnReference
                | AudioNodeLoading::LoadOnResolve
        )
    }
}

/// What happens to playing instances when the owning object goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DestroyOptions {
    StopEventOnDestroy,
    #[default]
    WaitForEventEnd,
}

impl DestroyOptions {
    pub(crate) fn short(self) -> &'static str {
        match self {
            DestroyOptions::StopEventOnDestroy => "sod",
            DestroyOptions::WaitForEventEnd => "wfe",
        }
    }
}

/// A composite node: a branch of a switch container or one dialogue line.
///
/// Two nodes with a valid id are equal when their ids match. When neither
/// has an id, equality compares the dependency lists in order.
#[derive(Debug, Clone, Default)]
pub struct AudioNodeCookedData {
    pub audio_node_id: u32,
    pub sound_banks: Vec<SoundBankCookedData>,
    pub media: Vec<MediaCookedData>,
    pub external_sources: Vec<ExternalSourceCookedData>,
    pub audio_node_loading: AudioNodeLoading,
    pub destroy_options: DestroyOptions,
    pub debug_name: String,
}

impl AudioNodeCookedData {
    pub fn new(audio_node_id: u32, debug_name: impl Into<String>) -> Self {
        Self {
            audio_node_id,
            debug_name: debug_name.into(),
            ..Default::default()
        }
    }

    /// True when the node references at least one leaf.
    pub fn is_initialized(&self) -> bool {
        !self.sound_banks.is_empty() || !self.media.is_empty() || !self.external_sources.is_empty()
    }

    /// A copy of this node standing in for another identity.
    pub fn with_id(&self, audio_node_id: u32) -> Self {
        Self {
            audio_node_id,
            ..self.clone()
        }
    }

    pub fn debug_string(&self) -> String {
        DebugSummary::new("AudioNode", &self.debug_name, self.audio_node_id)
            .count(self.sound_banks.len(), "SoundBanks")
            .count(self.media.len(), "Media")
            .count(self.external_sources.len(), "ExternalSources")
            .finish()
    }
}

impl PartialEq for AudioNodeCookedData {
    fn eq(&self, rhs: &Self) -> bool {
        if self.audio_node_id != crate::INVALID_ID || rhs.audio_node_id != crate::INVALID_ID {
            return self.audio_node_id == rhs.audio_node_id;
        }
        self.media == rhs.media
            && self.external_sources == rhs.external_sources
            && self.sound_banks == rhs.sound_banks
    }
}

impl Eq for AudioNodeCookedData {}
