//! Opaque values exchanged with the sound engine.

use std::fmt;

/// Handle returned by a successful registration.
///
/// The loader treats it as a black box and hands it back on unregistration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineHandle(u64);

impl EngineHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// The three leaf resource kinds the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LeafKind {
    SoundBank,
    Media,
    ExternalSource,
}

impl LeafKind {
    pub fn name(self) -> &'static str {
        match self {
            LeafKind::SoundBank => "SoundBank",
            LeafKind::Media => "Media",
            LeafKind::ExternalSource => "ExternalSource",
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors reported by the sound engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundEngineError {
    /// The engine is not initialized or has been terminated.
    Unavailable,

    /// The engine ran out of memory for this resource.
    OutOfMemory {
        kind: LeafKind,
        id: u32,
    },

    /// The backing file could not be opened.
    FileNotFound {
        path: String,
    },

    /// The engine refused the resource for another reason.
    Rejected {
        kind: LeafKind,
        id: u32,
        reason: String,
    },
}

impl fmt::Display for SoundEngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoundEngineError::Unavailable => write!(f, "Sound engine unavailable"),
            SoundEngineError::OutOfMemory { kind, id } => {
                write!(f, "Out of memory registering {} {}", kind, id)
            }
            SoundEngineError::FileNotFound { path } => {
                write!(f, "File not found: {}", path)
            }
            SoundEngineError::Rejected { kind, id, reason } => {
                write!(f, "{} {} rejected: {}", kind, id, reason)
            }
        }
    }
}

impl std::error::Error for SoundEngineError {}

/// Result type alias for sound engine calls.
pub type SoundEngineResult<T> = Result<T, SoundEngineError>;
