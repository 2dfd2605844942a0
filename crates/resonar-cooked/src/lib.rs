//! Cooked descriptors for Resonar audio assets.
//!
//! Descriptors are produced by an offline cooking step and are immutable at
//! runtime. They carry stable numeric identities plus the lists of leaf
//! resources (sound banks, media, external sources) and nested nodes each
//! loadable unit depends on.
//!
//! Nothing in this crate performs I/O; the loader consumes these values
//! read-only.

mod debug;

pub mod audio_node;
pub mod bus;
pub mod dialogue_event;
pub mod event;
pub mod group_value;
pub mod language;
pub mod leaf;

pub use audio_node::{AudioNodeCookedData, AudioNodeLoading, DestroyOptions};
pub use bus::{
    AuxBusCookedData, InitBankCookedData, LocalizedAuxBusCookedData, LocalizedShareSetCookedData,
    LocalizedSoundBankCookedData, ShareSetCookedData,
};
pub use dialogue_event::{
    DialogueArgumentItem, DialogueEventCookedData, LocalizedDialogueEventCookedData,
    RequiredArguments,
};
pub use event::{EventCookedData, LocalizedEventCookedData};
pub use group_value::{GroupType, GroupValueCookedData, GroupValueCookedDataSet};
pub use language::{LanguageCookedData, LanguageMap, LanguageRequirement, select_language};
pub use leaf::{
    ExternalSourceCookedData, MediaCookedData, PackagedFile, SoundBankCookedData, SoundBankType,
};

/// Identity value meaning "unset".
pub const INVALID_ID: u32 = 0;
