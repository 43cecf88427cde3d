//! Manual entry: a plain text buffer that emits its trimmed value on an
//! explicit submit (Enter or button in the hosting UI).

use super::{Capture, CaptureMethod};

#[derive(Debug, Default)]
pub struct ManualEntry {
    value: String,
}

impl ManualEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the buffer (the UI binds its text field here).
    pub fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Emit the trimmed value and clear the field. Blank input emits nothing.
    pub fn submit(&mut self) -> Option<Capture> {
        let raw = std::mem::take(&mut self.value);
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Capture::new(trimmed, CaptureMethod::Manual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_trims_and_clears() {
        let mut entry = ManualEntry::new();
        entry.set("  8934673001234  ");
        let cap = entry.submit().unwrap();
        assert_eq!(cap.raw, "8934673001234");
        assert_eq!(cap.method, CaptureMethod::Manual);
        assert_eq!(entry.value(), "");
    }

    #[test]
    fn blank_submit_emits_nothing() {
        let mut entry = ManualEntry::new();
        entry.set("   ");
        assert!(entry.submit().is_none());
    }
}
