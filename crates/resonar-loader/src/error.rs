//! Error types for the loader.

use std::fmt;

use resonar_test_utils::SoundEngineError;

/// Errors surfaced by synchronous loader entry points.
///
/// Asynchronous loads never return these; leaf failures show up as nodes
/// that are not fully loaded.
#[derive(Debug)]
pub enum LoaderError {
    /// Ordered dialogue resolution got the wrong number of arguments.
    ArgumentCountMismatch {
        /// Slots declared by the dialogue event.
        expected: usize,
        /// Arguments supplied by the caller.
        supplied: usize,
    },

    /// The engine could not resolve a dialogue path.
    ResolveFailed {
        /// The dialogue event being resolved.
        dialogue_event_id: u32,
    },

    /// No candidate audio node matched a resolved id.
    UnknownAudioNode {
        dialogue_event_id: u32,
        audio_node_id: u32,
    },

    /// The owning object has not been loaded.
    NotLoaded {
        /// Debug description of the object.
        name: String,
    },

    /// A localized descriptor has neither the requested language nor SFX.
    UnknownLanguage {
        name: String,
        language_id: u32,
    },

    /// A descriptor references nothing loadable and empty nodes are rejected.
    EmptyDescriptor {
        name: String,
    },

    /// The worker pool could not be started.
    Io(std::io::Error),

    /// The sound engine failed.
    Engine(SoundEngineError),
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::ArgumentCountMismatch { expected, supplied } => {
                write!(
                    f,
                    "Expected {} ordered arguments, {} supplied",
                    expected, supplied
                )
            }
            LoaderError::ResolveFailed { dialogue_event_id } => {
                write!(f, "Could not resolve dialogue event {}", dialogue_event_id)
            }
            LoaderError::UnknownAudioNode {
                dialogue_event_id,
                audio_node_id,
            } => {
                write!(
                    f,
                    "No audio node {} in dialogue event {}",
                    audio_node_id, dialogue_event_id
                )
            }
            LoaderError::NotLoaded { name } => write!(f, "{} is not loaded", name),
            LoaderError::UnknownLanguage { name, language_id } => {
                write!(f, "{} has no data for language {} or SFX", name, language_id)
            }
            LoaderError::EmptyDescriptor { name } => {
                write!(f, "{} references nothing loadable", name)
            }
            LoaderError::Io(e) => write!(f, "IO error: {}", e),
            LoaderError::Engine(e) => write!(f, "Sound engine error: {}", e),
        }
    }
}

impl std::error::Error for LoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoaderError::Io(e) => Some(e),
            LoaderError::Engine(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(err)
    }
}

impl From<SoundEngineError> for LoaderError {
    fn from(err: SoundEngineError) -> Self {
        LoaderError::Engine(err)
    }
}

/// Result type alias for loader operations.
pub type LoaderResult<T> = Result<T, LoaderError>;
