use resonar_cooked::LanguageCookedData;
use resonar_core::config::Config;

/// Settings for a [`crate::ResourceLoader`].
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Language used by `create_*_list_entry` when none is given.
    pub language: LanguageCookedData,

    /// Refuse to create nodes that reference nothing loadable. When off,
    /// such nodes load immediately with nothing to do.
    pub reject_empty_nodes: bool,

    /// Keep [`crate::LoaderEvent`]s for [`crate::ResourceLoader::drain_events`].
    pub record_events: bool,

    /// Worker pool settings.
    pub runtime: Config,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            language: LanguageCookedData::sfx(),
            reject_empty_nodes: false,
            record_events: false,
            runtime: Config::default(),
        }
    }
}

impl LoaderConfig {
    pub fn with_language(mut self, language: LanguageCookedData) -> Self {
        self.language = language;
        self
    }

    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.runtime.worker_threads = Some(threads);
        self
    }

    pub fn rejecting_empty_nodes(mut self) -> Self {
        self.reject_empty_nodes = true;
        self
    }

    pub fn recording_events(mut self) -> Self {
        self.record_events = true;
        self
    }
}
