// src/capture/mod.rs
//! Input acquisition: three independent capture strategies (hardware
//! keyboard-wedge scanners, camera frames, manual entry) all funnel into the
//! same `Capture { raw, method }` value. Serialization of concurrent scans
//! is the orchestrator's job, not this layer's.

pub mod camera;
pub mod keyboard;
pub mod manual;

use serde::{Deserialize, Serialize};

/// How a barcode physically entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMethod {
    Keyboard,
    Camera,
    Manual,
}

impl CaptureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMethod::Keyboard => "keyboard",
            CaptureMethod::Camera => "camera",
            CaptureMethod::Manual => "manual",
        }
    }
}

/// One raw barcode capture, method-tagged, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub raw: String,
    pub method: CaptureMethod,
}

impl Capture {
    pub fn new(raw: impl Into<String>, method: CaptureMethod) -> Self {
        Self {
            raw: raw.into(),
            method,
        }
    }
}
