//! Aux busses, share sets, sound-bank nodes and the init bank.

use crate::debug::DebugSummary;
use crate::language::LanguageMap;
use crate::leaf::{MediaCookedData, SoundBankCookedData};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxBusCookedData {
    pub aux_bus_id: u32,
    pub sound_banks: Vec<SoundBankCookedData>,
    pub media: Vec<MediaCookedData>,
    pub debug_name: String,
}

impl AuxBusCookedData {
    pub fn debug_string(&self) -> String {
        DebugSummary::new("AuxBus", &self.debug_name, self.aux_bus_id)
            .count(self.sound_banks.len(), "SoundBanks")
            .count(self.media.len(), "Media")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedAuxBusCookedData {
    pub aux_bus_language_map: LanguageMap<AuxBusCookedData>,
    pub debug_name: String,
    pub aux_bus_id: u32,
}

/// An effect or attenuation share set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareSetCookedData {
    pub share_set_id: u32,
    pub sound_banks: Vec<SoundBankCookedData>,
    pub media: Vec<MediaCookedData>,
    pub debug_name: String,
}

impl ShareSetCookedData {
    pub fn debug_string(&self) -> String {
        DebugSummary::new("ShareSet", &self.debug_name, self.share_set_id)
            .count(self.sound_banks.len(), "SoundBanks")
            .count(self.media.len(), "Media")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedShareSetCookedData {
    pub share_set_language_map: LanguageMap<ShareSetCookedData>,
    pub debug_name: String,
    pub share_set_id: u32,
}

/// A sound bank loaded explicitly rather than through an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedSoundBankCookedData {
    pub sound_bank_language_map: LanguageMap<SoundBankCookedData>,
    pub debug_name: String,
    pub sound_bank_id: u32,
}

/// The bank holding global engine state. Loaded before anything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitBankCookedData {
    pub sound_bank: SoundBankCookedData,
    pub media: Vec<MediaCookedData>,
    pub debug_name: String,
}

impl InitBankCookedData {
    pub fn debug_string(&self) -> String {
        DebugSummary::new("InitBank", &self.debug_name, self.sound_bank.sound_bank_id)
            .count(self.media.len(), "Media")
            .finish()
    }
}
