use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Whether content in a language must be present for the game to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageRequirement {
    #[default]
    IsDefault,
    IsOptional,
    SFX,
}

/// A language a descriptor can be cooked for.
///
/// Identity is the numeric `language_id`; the name is informational.
#[derive(Debug, Clone)]
pub struct LanguageCookedData {
    pub language_id: u32,
    pub language_name: String,
    pub requirement: LanguageRequirement,
}

impl LanguageCookedData {
    /// The language-agnostic entry every localized map falls back to.
    pub const SFX_ID: u32 = 0;

    pub fn new(language_id: u32, language_name: impl Into<String>) -> Self {
        Self {
            language_id,
            language_name: language_name.into(),
            requirement: LanguageRequirement::IsOptional,
        }
    }

    pub fn sfx() -> Self {
        Self {
            language_id: Self::SFX_ID,
            language_name: "SFX".to_string(),
            requirement: LanguageRequirement::SFX,
        }
    }

    pub fn is_sfx(&self) -> bool {
        self.language_id == Self::SFX_ID
    }

    pub fn debug_string(&self) -> String {
        format!("{} ({})", self.language_name, self.language_id)
    }
}

impl Default for LanguageCookedData {
    fn default() -> Self {
        Self::sfx()
    }
}

impl PartialEq for LanguageCookedData {
    fn eq(&self, other: &Self) -> bool {
        self.language_id == other.language_id
    }
}

impl Eq for LanguageCookedData {}

impl Hash for LanguageCookedData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.language_id.hash(state);
    }
}

impl PartialOrd for LanguageCookedData {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LanguageCookedData {
    fn cmp(&self, other: &Self) -> Ordering {
        self.language_id.cmp(&other.language_id)
    }
}

/// Per-language variants of one localized descriptor.
pub type LanguageMap<T> = BTreeMap<LanguageCookedData, T>;

/// Pick the entry for `language`, falling back to the SFX entry.
pub fn select_language<'a, T>(
    map: &'a LanguageMap<T>,
    language: &LanguageCookedData,
) -> Option<(&'a LanguageCookedData, &'a T)> {
    map.get_key_value(language)
        .or_else(|| map.get_key_value(&LanguageCookedData::sfx()))
}
