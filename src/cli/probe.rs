//! `probe` command.

use anyhow::Result;

use crate::dom::Document;
use crate::image::webp::WebpDetector;
use crate::log;

pub fn run() -> Result<()> {
    let detector = WebpDetector::new();
    let supported = detector.detect(&mut Document::new());
    if supported {
        log!("probe"; "webp decoding supported");
    } else {
        log!("probe"; "webp decoding not supported");
    }
    Ok(())
}
