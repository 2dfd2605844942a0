use std::fmt::Write;

/// Builds the `"<Kind> <name> (<id>) with 2 SoundBanks, 1 Media"` strings
/// shared by every descriptor. Empty lists are left out.
pub(crate) struct DebugSummary {
    text: String,
    first: bool,
}

impl DebugSummary {
    pub(crate) fn new(kind: &str, name: &str, id: u32) -> Self {
        let mut text = String::from(kind);
        if !name.is_empty() {
            text.push(' ');
            text.push_str(name);
        }
        if id != crate::INVALID_ID {
            let _ = write!(text, " ({})", id);
        }
        Self { text, first: true }
    }

    pub(crate) fn count(mut self, count: usize, label: &str) -> Self {
        if count == 0 {
            return self;
        }
        self.text.push_str(if self.first { " with " } else { ", " });
        self.first = false;
        let _ = write!(self.text, "{} {}", count, label);
        self
    }

    pub(crate) fn suffix(mut self, suffix: &str) -> Self {
        self.text.push_str(suffix);
        self
    }

    pub(crate) fn finish(self) -> String {
        self.text
    }
}
