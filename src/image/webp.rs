//! WebP decode capability detection.
//!
//! A tiny lossy WebP (2x2 pixels) is decoded once per session. The result
//! is cached in a [`CapabilityFlag`] and published on the document root as
//! class `webp` or `no-webp`, so stylesheets can pick image formats.

use std::sync::OnceLock;

use image::ImageFormat;

use crate::debug;
use crate::dom::Document;

/// Lossy WebP probe image, 2x2 pixels.
pub const PROBE_WEBP: [u8; 66] = [
    0x52, 0x49, 0x46, 0x46, 0x3a, 0x00, 0x00, 0x00, 0x57, 0x45, 0x42, 0x50, 0x56, 0x50, 0x38, 0x20,
    0x2e, 0x00, 0x00, 0x00, 0xb2, 0x02, 0x00, 0x9d, 0x01, 0x2a, 0x02, 0x00, 0x02, 0x00, 0x2e, 0x69,
    0x34, 0x9a, 0x4d, 0x22, 0x22, 0x22, 0x22, 0x22, 0x00, 0x68, 0x4b, 0x28, 0x00, 0x05, 0xce, 0x96,
    0x5a, 0x00, 0x00, 0xfe, 0xf7, 0x9f, 0x7f, 0xfd, 0x0f, 0x3f, 0xc6, 0xc0, 0xff, 0xf2, 0xf0, 0x60,
    0x00, 0x00,
];

/// Decoded probe height that proves support.
const PROBE_HEIGHT: u32 = 2;

pub const CLASS_SUPPORTED: &str = "webp";
pub const CLASS_UNSUPPORTED: &str = "no-webp";

/// Attempts to decode WebP bytes.
pub trait DecodeProbe {
    /// Decoded `(width, height)`, or `None` when decoding fails.
    fn decode_dimensions(&self, bytes: &[u8]) -> Option<(u32, u32)>;
}

/// Probe backed by the `image` crate's WebP codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateProbe;

impl DecodeProbe for ImageCrateProbe {
    fn decode_dimensions(&self, bytes: &[u8]) -> Option<(u32, u32)> {
        image::load_from_memory_with_format(bytes, ImageFormat::WebP)
            .ok()
            .map(|img| (img.width(), img.height()))
    }
}

/// Write-once boolean.
#[derive(Debug, Default)]
pub struct CapabilityFlag(OnceLock<bool>);

impl CapabilityFlag {
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    pub fn get(&self) -> Option<bool> {
        self.0.get().copied()
    }

    /// Store `value` unless already set; returns the stored value.
    pub fn set(&self, value: bool) -> bool {
        *self.0.get_or_init(|| value)
    }

    pub fn is_resolved(&self) -> bool {
        self.0.get().is_some()
    }
}

/// Runs the probe once and marks documents with the outcome.
#[derive(Debug, Default)]
pub struct WebpDetector<P = ImageCrateProbe> {
    probe: P,
    flag: CapabilityFlag,
}

impl WebpDetector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P: DecodeProbe> WebpDetector<P> {
    pub fn with_probe(probe: P) -> Self {
        Self {
            probe,
            flag: CapabilityFlag::new(),
        }
    }

    /// Cached result, `None` before [`detect`](Self::detect) ran.
    pub fn is_supported(&self) -> Option<bool> {
        self.flag.get()
    }

    /// Probe once and toggle the root marker classes.
    ///
    /// Later calls return the cached flag without touching the document.
    pub fn detect(&self, doc: &mut Document) -> bool {
        if let Some(supported) = self.flag.get() {
            return supported;
        }

        let dimensions = self.probe.decode_dimensions(&PROBE_WEBP);
        let supported = self
            .flag
            .set(dimensions.is_some_and(|(_, height)| height == PROBE_HEIGHT));
        debug!("probe"; "webp decode {:?}, supported: {}", dimensions, supported);

        let root = doc.root_element_mut();
        root.toggle_class(CLASS_SUPPORTED, supported);
        root.toggle_class(CLASS_UNSUPPORTED, !supported);
        supported
    }
}
