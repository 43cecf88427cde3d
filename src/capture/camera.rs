//! Camera frame sampler.
//!
//! Grabs frames from a `FrameSource` on a fixed interval, reduces the band
//! around frame center to luminance, and asks a `PatternDecoder` for a
//! candidate barcode. The bundled `RunLengthDecoder` is a heuristic
//! stand-in, not a real symbology decoder: it recognizes "enough alternating
//! light/dark runs of plausible width" and derives a deterministic digit
//! string from the run pattern. It will false-positive on bar-like textures.
//! A real EAN/UPC/Code128 library belongs behind the `PatternDecoder` seam.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::{Capture, CaptureMethod};

/// One video frame, tightly packed RGBA.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize, rgba: Vec<u8>) -> Self {
        debug_assert_eq!(rgba.len(), width * height * 4, "rgba buffer size");
        Self {
            width,
            height,
            rgba,
        }
    }

    /// ITU-R BT.601 luma for one pixel.
    fn luma(&self, x: usize, y: usize) -> u8 {
        let i = (y * self.width + x) * 4;
        let r = self.rgba[i] as f32;
        let g = self.rgba[i + 1] as f32;
        let b = self.rgba[i + 2] as f32;
        (0.299 * r + 0.587 * g + 0.114 * b) as u8
    }

    /// Average luminance of the horizontal band centered on the frame,
    /// `band_rows` rows tall, one value per column.
    pub fn center_band_luma(&self, band_rows: usize) -> Vec<u8> {
        let rows = band_rows.clamp(1, self.height);
        let top = (self.height - rows) / 2;
        let mut out = Vec::with_capacity(self.width);
        for x in 0..self.width {
            let mut acc = 0u32;
            for y in top..top + rows {
                acc += self.luma(x, y) as u32;
            }
            out.push((acc / rows as u32) as u8);
        }
        out
    }
}

/// Supplies frames from whatever video stack the host app runs.
pub trait FrameSource: Send + Sync {
    /// Latest frame, or `None` when the stream has no new frame yet.
    fn grab(&self) -> Option<Frame>;
}

/// Detection hook so the UI can vibrate/beep. No-op by default.
pub trait ScanFeedback: Send + Sync {
    fn pattern_detected(&self);
}

pub struct NoFeedback;

impl ScanFeedback for NoFeedback {
    fn pattern_detected(&self) {}
}

/// Seam for real decoding libraries; `RunLengthDecoder` is the placeholder.
pub trait PatternDecoder: Send + Sync {
    fn decode(&self, frame: &Frame) -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct RunLengthDecoder {
    /// Luma below this is "dark".
    pub threshold: u8,
    /// Plausible bar widths in pixels.
    pub min_run: usize,
    pub max_run: usize,
    /// Minimum alternating runs for a pattern to count (EAN-13 has 59).
    pub min_runs: usize,
}

impl Default for RunLengthDecoder {
    fn default() -> Self {
        Self {
            threshold: 128,
            min_run: 2,
            max_run: 40,
            min_runs: 40,
        }
    }
}

impl RunLengthDecoder {
    /// Collapse a luminance row into run lengths of dark/light stretches,
    /// dropping the leading and trailing quiet zones.
    fn run_lengths(&self, band: &[u8]) -> Vec<usize> {
        let dark: Vec<bool> = band.iter().map(|&l| l < self.threshold).collect();
        let first = match dark.iter().position(|&d| d) {
            Some(i) => i,
            None => return Vec::new(),
        };
        let last = dark.iter().rposition(|&d| d).expect("seen a dark pixel");

        let mut runs = Vec::new();
        let mut current = dark[first];
        let mut len = 0usize;
        for &d in &dark[first..=last] {
            if d == current {
                len += 1;
            } else {
                runs.push(len);
                current = d;
                len = 1;
            }
        }
        runs.push(len);
        runs
    }

    /// Fold the run pattern into a 13-digit candidate. Deterministic for a
    /// given pattern so repeated frames of the same label agree.
    fn runs_to_candidate(runs: &[usize]) -> String {
        let mut digits = String::with_capacity(13);
        for chunk in runs.chunks(4).take(13) {
            let sum: usize = chunk.iter().sum();
            digits.push(char::from_digit((sum % 10) as u32, 10).expect("mod 10 digit"));
        }
        digits
    }
}

impl PatternDecoder for RunLengthDecoder {
    fn decode(&self, frame: &Frame) -> Option<String> {
        let band = frame.center_band_luma(frame.height.min(16));
        let runs = self.run_lengths(&band);
        if runs.len() < self.min_runs {
            return None;
        }
        if !runs
            .iter()
            .all(|&r| (self.min_run..=self.max_run).contains(&r))
        {
            return None;
        }
        // 4 runs fold into one digit; demand a full 13-digit candidate.
        if runs.len() < 13 * 4 {
            return None;
        }
        Some(Self::runs_to_candidate(&runs))
    }
}

/// Running sampler task. Dropping the handle does not stop the task; call
/// `stop` (in-flight work then winds down on its own, best effort).
pub struct SamplerHandle {
    stop: watch::Sender<bool>,
    pub task: JoinHandle<()>,
}

impl SamplerHandle {
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }
}

pub struct FrameSampler;

impl FrameSampler {
    /// Spawn the sampling loop: one `grab` + decode attempt per tick
    /// (default cadence ~500 ms). Detections go out on `tx`; consecutive
    /// identical candidates are suppressed so one steady label does not spam
    /// the orchestrator (its in-flight guard would drop them anyway).
    pub fn spawn(
        source: Arc<dyn FrameSource>,
        decoder: Arc<dyn PatternDecoder>,
        feedback: Arc<dyn ScanFeedback>,
        interval: Duration,
        tx: mpsc::Sender<Capture>,
    ) -> SamplerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut last_emitted: Option<String> = None;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = stop_rx.changed() => {
                        // Err means the handle is gone; stop either way.
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }
                let Some(frame) = source.grab() else { continue };
                let Some(candidate) = decoder.decode(&frame) else {
                    continue;
                };
                if last_emitted.as_deref() == Some(candidate.as_str()) {
                    continue;
                }
                tracing::debug!(target: "capture", candidate, "camera pattern detected");
                feedback.pattern_detected();
                last_emitted = Some(candidate.clone());
                if tx
                    .send(Capture::new(candidate, CaptureMethod::Camera))
                    .await
                    .is_err()
                {
                    // Receiver gone (UI unmounted): wind down quietly.
                    break;
                }
            }
        });
        SamplerHandle { stop: stop_tx, task }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Frame of vertical bars: alternating dark/light columns with the given
    /// widths, padded by a white quiet zone on both sides.
    fn bar_frame(runs: &[usize]) -> Frame {
        let quiet = 10usize;
        let width: usize = runs.iter().sum::<usize>() + 2 * quiet;
        let height = 32usize;
        let mut cols = vec![255u8; width];
        let mut x = quiet;
        let mut dark = true;
        for &r in runs {
            for c in cols.iter_mut().skip(x).take(r) {
                *c = if dark { 0 } else { 255 };
            }
            x += r;
            dark = !dark;
        }
        let mut rgba = Vec::with_capacity(width * height * 4);
        for _y in 0..height {
            for &c in &cols {
                rgba.extend_from_slice(&[c, c, c, 255]);
            }
        }
        Frame::new(width, height, rgba)
    }

    fn ean_like_runs() -> Vec<usize> {
        // 59 runs of widths 2..5, the shape of a real EAN-13 scan line.
        (0..59).map(|i| 2 + (i * 3) % 4).collect()
    }

    #[test]
    fn bar_pattern_yields_13_digit_candidate() {
        let decoder = RunLengthDecoder::default();
        let frame = bar_frame(&ean_like_runs());
        let candidate = decoder.decode(&frame).expect("pattern detected");
        assert_eq!(candidate.len(), 13);
        assert!(candidate.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn same_pattern_decodes_identically() {
        let decoder = RunLengthDecoder::default();
        let frame = bar_frame(&ean_like_runs());
        assert_eq!(decoder.decode(&frame), decoder.decode(&frame));
    }

    #[test]
    fn blank_frame_decodes_to_none() {
        let decoder = RunLengthDecoder::default();
        let frame = Frame::new(64, 16, vec![255u8; 64 * 16 * 4]);
        assert!(decoder.decode(&frame).is_none());
    }

    #[test]
    fn too_few_runs_is_not_a_pattern() {
        let decoder = RunLengthDecoder::default();
        let frame = bar_frame(&[4, 4, 4, 4, 4]);
        assert!(decoder.decode(&frame).is_none());
    }

    #[test]
    fn implausible_bar_width_is_rejected() {
        let decoder = RunLengthDecoder::default();
        let mut runs = ean_like_runs();
        runs[10] = 120; // a smear, not a bar
        let frame = bar_frame(&runs);
        assert!(decoder.decode(&frame).is_none());
    }

    struct OneShotSource {
        frame: std::sync::Mutex<Option<Frame>>,
    }

    impl FrameSource for OneShotSource {
        fn grab(&self) -> Option<Frame> {
            self.frame.lock().unwrap().take()
        }
    }

    #[tokio::test]
    async fn sampler_emits_capture_and_stops() {
        let source = Arc::new(OneShotSource {
            frame: std::sync::Mutex::new(Some(bar_frame(&ean_like_runs()))),
        });
        let (tx, mut rx) = mpsc::channel(4);
        let handle = FrameSampler::spawn(
            source,
            Arc::new(RunLengthDecoder::default()),
            Arc::new(NoFeedback),
            Duration::from_millis(5),
            tx,
        );

        let capture = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("sampler should emit within a second")
            .expect("channel open");
        assert_eq!(capture.method, CaptureMethod::Camera);
        assert_eq!(capture.raw.len(), 13);

        handle.stop();
        let _ = handle.task.await;
    }
}
