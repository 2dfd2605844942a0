//! Leaf resources: the physical units registered with the sound engine.

/// How a sound bank was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SoundBankType {
    #[default]
    User,
    Event,
    Bus,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SoundBankCookedData {
    pub sound_bank_id: u32,
    /// Language this bank was cooked for, `0` for SFX.
    pub language_id: u32,
    pub memory_alignment: u32,
    pub device_memory: bool,
    pub contains_media: bool,
    pub sound_bank_type: SoundBankType,
    pub debug_name: String,
}

impl SoundBankCookedData {
    pub fn new(sound_bank_id: u32, debug_name: impl Into<String>) -> Self {
        Self {
            sound_bank_id,
            debug_name: debug_name.into(),
            ..Default::default()
        }
    }

    pub fn debug_string(&self) -> String {
        format!("SoundBank {} ({})", self.debug_name, self.sound_bank_id)
    }
}

/// Where a media file lives in the packaged output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PackagedFile {
    pub path: String,
    pub offset: u64,
    pub size: u64,
    /// Bytes kept resident for streamed media.
    pub prefetch_size: u32,
    pub streaming: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct MediaCookedData {
    pub media_id: u32,
    pub packaged_file: PackagedFile,
    pub debug_name: String,
}

impl MediaCookedData {
    pub fn new(media_id: u32, debug_name: impl Into<String>) -> Self {
        Self {
            media_id,
            debug_name: debug_name.into(),
            ..Default::default()
        }
    }

    pub fn debug_string(&self) -> String {
        format!("Media {} ({})", self.debug_name, self.media_id)
    }
}

/// A source supplied by the game at runtime, identified by its cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ExternalSourceCookedData {
    pub cookie: u32,
    pub debug_name: String,
}

impl ExternalSourceCookedData {
    pub fn new(cookie: u32, debug_name: impl Into<String>) -> Self {
        Self {
            cookie,
            debug_name: debug_name.into(),
        }
    }

    pub fn debug_string(&self) -> String {
        format!("ExternalSource {} ({})", self.debug_name, self.cookie)
    }
}
