//! Keyboard-wedge buffer.
//!
//! Hardware scanners emulate a burst of keystrokes far faster than a human
//! types. The buffer accumulates characters while consecutive keys arrive
//! within a short gap; a longer gap means a person is typing and the buffer
//! restarts from the current key. Emission happens on the terminator key
//! (Enter), immediately when an all-digit buffer reaches the longest known
//! fixed barcode length (13, EAN-13), or via `poll` once a shorter known
//! length (12, UPC-A) has sat unchanged past the burst gap, since a 12-digit
//! prefix of an EAN-13 must not fire early.
//!
//! The buffer is pure state driven by injected `Instant`s, so tests fabricate
//! timing instead of sleeping.

use std::time::{Duration, Instant};

/// One key event from the wedge's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    /// The configured terminator (Enter on every scanner we have seen).
    Terminator,
}

#[derive(Debug, Clone)]
pub struct WedgeConfig {
    /// Gap above which the burst is considered broken (human typing).
    pub max_gap: Duration,
    /// All-digit buffer lengths that may emit without a terminator,
    /// ascending. The longest emits immediately; shorter ones emit from
    /// `poll` after the burst gap has passed with no further key.
    pub auto_emit_lengths: Vec<usize>,
}

impl Default for WedgeConfig {
    fn default() -> Self {
        Self {
            max_gap: Duration::from_millis(100),
            // UPC-A and EAN-13.
            auto_emit_lengths: vec![12, 13],
        }
    }
}

#[derive(Debug)]
pub struct WedgeBuffer {
    cfg: WedgeConfig,
    buf: String,
    last_key_at: Option<Instant>,
}

impl WedgeBuffer {
    pub fn new(cfg: WedgeConfig) -> Self {
        Self {
            cfg,
            buf: String::new(),
            last_key_at: None,
        }
    }

    /// Feed one key event observed at `at`. Returns the emitted barcode when
    /// the event completes a capture.
    pub fn push(&mut self, key: KeyInput, at: Instant) -> Option<String> {
        match key {
            KeyInput::Terminator => {
                self.last_key_at = None;
                let out = std::mem::take(&mut self.buf);
                if out.is_empty() {
                    None
                } else {
                    Some(out)
                }
            }
            KeyInput::Char(c) => {
                if let Some(prev) = self.last_key_at {
                    if at.saturating_duration_since(prev) > self.cfg.max_gap {
                        // Burst broken: start over from this key.
                        self.buf.clear();
                    }
                }
                self.last_key_at = Some(at);
                self.buf.push(c);

                if self.all_digits() && Some(&self.buf.len()) == self.cfg.auto_emit_lengths.last()
                {
                    self.last_key_at = None;
                    return Some(std::mem::take(&mut self.buf));
                }
                None
            }
        }
    }

    /// Timer-driven check: emit a shorter fixed-length code once the burst
    /// gap has passed with no further key. The hosting UI calls this on a
    /// modest tick (the gap threshold itself works fine).
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let last = self.last_key_at?;
        if now.saturating_duration_since(last) <= self.cfg.max_gap {
            return None;
        }
        if self.all_digits() && self.cfg.auto_emit_lengths.contains(&self.buf.len()) {
            self.last_key_at = None;
            return Some(std::mem::take(&mut self.buf));
        }
        None
    }

    /// Drop any partial burst (e.g. on focus loss).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.last_key_at = None;
    }

    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    fn all_digits(&self) -> bool {
        !self.buf.is_empty() && self.buf.chars().all(|c| c.is_ascii_digit())
    }
}

impl Default for WedgeBuffer {
    fn default() -> Self {
        Self::new(WedgeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(buf: &mut WedgeBuffer, s: &str, start: Instant, step: Duration) -> Option<String> {
        let mut out = None;
        for (i, c) in s.chars().enumerate() {
            out = buf.push(KeyInput::Char(c), start + step * (i as u32));
        }
        out
    }

    #[test]
    fn fast_13_digit_burst_auto_emits_without_terminator() {
        let mut buf = WedgeBuffer::default();
        let emitted = feed(
            &mut buf,
            "8934673001234",
            Instant::now(),
            Duration::from_millis(8),
        );
        assert_eq!(emitted.as_deref(), Some("8934673001234"));
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn twelve_digit_upc_a_emits_on_poll_after_the_gap() {
        let mut buf = WedgeBuffer::default();
        let start = Instant::now();
        assert!(feed(&mut buf, "036000291452", start, Duration::from_millis(5)).is_none());
        // Scanner went quiet: next poll past the gap emits.
        let quiet = start + Duration::from_millis(5 * 11);
        assert!(buf.poll(quiet + Duration::from_millis(60)).is_none());
        let emitted = buf.poll(quiet + Duration::from_millis(150));
        assert_eq!(emitted.as_deref(), Some("036000291452"));
    }

    #[test]
    fn twelve_digit_prefix_of_ean13_does_not_fire_early() {
        let mut buf = WedgeBuffer::default();
        let emitted = feed(
            &mut buf,
            "893467300123",
            Instant::now(),
            Duration::from_millis(8),
        );
        assert!(emitted.is_none());
        assert_eq!(buf.pending_len(), 12);
    }

    #[test]
    fn alphanumeric_code_waits_for_terminator() {
        let mut buf = WedgeBuffer::default();
        let start = Instant::now();
        assert!(feed(&mut buf, "SKU-00123456", start, Duration::from_millis(5)).is_none());
        let emitted = buf.push(KeyInput::Terminator, start + Duration::from_millis(80));
        assert_eq!(emitted.as_deref(), Some("SKU-00123456"));
    }

    #[test]
    fn slow_typing_resets_the_burst() {
        let mut buf = WedgeBuffer::default();
        let start = Instant::now();
        buf.push(KeyInput::Char('1'), start);
        buf.push(KeyInput::Char('2'), start + Duration::from_millis(50));
        // Human-speed pause: buffer restarts from the next key.
        buf.push(KeyInput::Char('3'), start + Duration::from_millis(400));
        assert_eq!(buf.pending_len(), 1);
    }

    #[test]
    fn terminator_on_empty_buffer_emits_nothing() {
        let mut buf = WedgeBuffer::default();
        assert!(buf.push(KeyInput::Terminator, Instant::now()).is_none());
    }

    #[test]
    fn gap_exactly_at_threshold_keeps_the_burst() {
        let mut buf = WedgeBuffer::default();
        let start = Instant::now();
        buf.push(KeyInput::Char('1'), start);
        buf.push(KeyInput::Char('2'), start + Duration::from_millis(100));
        assert_eq!(buf.pending_len(), 2);
    }

    #[test]
    fn poll_on_alphanumeric_buffer_emits_nothing() {
        let mut buf = WedgeBuffer::default();
        let start = Instant::now();
        feed(&mut buf, "SKU-00123456", start, Duration::from_millis(5));
        assert!(buf.poll(start + Duration::from_secs(1)).is_none());
    }
}
