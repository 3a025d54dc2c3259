//! Compression of images picked through file inputs.
//!
//! Each `input[type=file][accept*=image]` becomes an [`UploadField`]. When a
//! selection changes, the first file is compressed if it is an image and
//! the field's selection is replaced with the JPEG result. A notice next to
//! the input reports progress and disappears after a delay.
//!
//! Selections are numbered: a result is applied only while its selection
//! is still the latest one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::compress::{CompressError, ImageCompressor};
use crate::dom::{Document, Element, NodeId, Selector};
use crate::utils::mime;
use crate::{debug, log};

/// Inputs that get compression wired in.
pub const FILE_INPUT_SELECTOR: &str = "input[type=file][accept*=image]";
pub const NOTICE_CLASS: &str = "image-progress";
pub const PROGRESS_TEXT: &str = "Optimizing image...";
pub const FAILURE_TEXT: &str = "Error optimizing image";

// ============================================================================
// Files and notices
// ============================================================================

/// A file held by an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub bytes: Arc<[u8]>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_image(&self) -> bool {
        mime::is_image(&self.mime)
    }

    /// Whether the compressor can decode this file's type.
    pub fn is_compressible(&self) -> bool {
        mime::is_decodable_image(&self.mime)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Progress,
    Success,
    Failure,
}

impl Tone {
    fn color(self) -> Option<&'static str> {
        match self {
            Self::Progress => None,
            Self::Success => Some("green"),
            Self::Failure => Some("red"),
        }
    }
}

/// Status text shown next to an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub tone: Tone,
}

impl Notice {
    pub fn progress() -> Self {
        Self {
            text: PROGRESS_TEXT.into(),
            tone: Tone::Progress,
        }
    }

    pub fn success(original: usize, compressed: usize) -> Self {
        Self {
            text: format!("Optimized: {} → {}", format_mb(original), format_mb(compressed)),
            tone: Tone::Success,
        }
    }

    pub fn failure() -> Self {
        Self {
            text: FAILURE_TEXT.into(),
            tone: Tone::Failure,
        }
    }
}

/// Size in megabytes with one decimal, e.g. `2.4MB`.
pub fn format_mb(bytes: usize) -> String {
    format!("{:.1}MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Result of one selection change.
#[derive(Debug)]
pub enum ChangeOutcome {
    /// Empty selection, not an image, or an image type without a codec;
    /// the selection is kept as is.
    Skipped,
    /// The selection was replaced with the compressed file.
    Applied { original: usize, compressed: usize },
    /// A newer selection arrived while compressing; result dropped.
    Superseded,
    Failed(CompressError),
}

// ============================================================================
// UploadField
// ============================================================================

/// A selection that passed the image guard and awaits compression.
#[derive(Debug)]
pub struct PendingUpload {
    generation: u64,
    file: UploadFile,
}

#[derive(Debug, Default)]
struct FieldState {
    files: Vec<UploadFile>,
    notice: Option<Notice>,
    /// Rendered notice element, if any.
    notice_node: Option<NodeId>,
}

/// Compression state of one file input.
#[derive(Debug)]
pub struct UploadField {
    input: NodeId,
    compressor: ImageCompressor,
    notice_delay: Duration,
    generation: AtomicU64,
    state: Mutex<FieldState>,
}

impl UploadField {
    pub fn new(input: NodeId, compressor: ImageCompressor, notice_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            input,
            compressor,
            notice_delay,
            generation: AtomicU64::new(0),
            state: Mutex::new(FieldState::default()),
        })
    }

    pub fn input(&self) -> NodeId {
        self.input
    }

    /// Current selection.
    pub fn files(&self) -> Vec<UploadFile> {
        self.state.lock().files.clone()
    }

    pub fn notice(&self) -> Option<Notice> {
        self.state.lock().notice.clone()
    }

    /// Number of selections seen so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Handle a new selection.
    pub async fn on_change(self: &Arc<Self>, files: Vec<UploadFile>) -> ChangeOutcome {
        match self.begin(files) {
            Some(pending) => self.finish(pending).await,
            None => ChangeOutcome::Skipped,
        }
    }

    /// Record a new selection and show the progress notice.
    ///
    /// Returns `None` when there is nothing to compress; the notice is
    /// cleared in that case.
    pub fn begin(&self, files: Vec<UploadFile>) -> Option<PendingUpload> {
        let mut state = self.state.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        state.files = files;

        let Some(file) = state.files.first().filter(|f| f.is_compressible()).cloned() else {
            if let Some(file) = state.files.first().filter(|f| f.is_image()) {
                debug!("upload"; "{}: no codec for {}, kept as is", file.name, file.mime);
            }
            state.notice = None;
            return None;
        };
        state.notice = Some(Notice::progress());
        Some(PendingUpload { generation, file })
    }

    /// Compress a selection recorded by [`begin`](Self::begin) and apply
    /// the result if the selection is still current.
    pub async fn finish(self: &Arc<Self>, pending: PendingUpload) -> ChangeOutcome {
        let PendingUpload { generation, file } = pending;
        let result = self.compressor.compress(&file).await;

        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("upload"; "dropping result for {}, selection changed", file.name);
            return ChangeOutcome::Superseded;
        }

        let outcome = match result {
            Ok(image) => {
                let (original, compressed) = (file.size(), image.size());
                state.files = vec![UploadFile::new(file.name, mime::types::JPEG, image.bytes)];
                state.notice = Some(Notice::success(original, compressed));
                ChangeOutcome::Applied {
                    original,
                    compressed,
                }
            }
            Err(e) => {
                log!("upload"; "{}: {}", file.name, e);
                state.notice = Some(Notice::failure());
                ChangeOutcome::Failed(e)
            }
        };
        drop(state);

        self.schedule_clear(generation);
        outcome
    }

    /// Remove the notice after the configured delay, unless another
    /// selection happened meanwhile.
    fn schedule_clear(self: &Arc<Self>, generation: u64) -> tokio::task::JoinHandle<()> {
        let field = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(field.notice_delay).await;
            let mut state = field.state.lock();
            if field.generation.load(Ordering::SeqCst) == generation {
                state.notice = None;
            }
        })
    }

    /// Mirror the current notice into the document as
    /// `div.image-progress`, appended to the input's parent.
    pub fn render(&self, doc: &mut Document) {
        let mut state = self.state.lock();

        let Some(notice) = state.notice.clone() else {
            if let Some(node) = state.notice_node.take() {
                doc.detach(node);
            }
            return;
        };

        let node = match state.notice_node.filter(|&n| doc.is_attached(n)) {
            Some(node) => node,
            None => {
                let Some(parent) = doc.parent(self.input) else {
                    return;
                };
                let node = doc.create_element(Element::new("div").with_attr("class", NOTICE_CLASS));
                doc.append_child(parent, node);
                node
            }
        };

        doc.set_text(node, &notice.text);
        if let Some(el) = doc.element_mut(node) {
            match notice.tone.color() {
                Some(color) => el.set_style("color", color),
                None => {
                    el.remove_attr("style");
                }
            }
        }
        state.notice_node = Some(node);
    }
}

/// Create an [`UploadField`] for every image file input in `doc`.
pub fn wire_file_inputs(
    doc: &Document,
    compressor: ImageCompressor,
    notice_delay: Duration,
) -> Vec<Arc<UploadField>> {
    let Ok(selector) = Selector::parse(FILE_INPUT_SELECTOR) else {
        return Vec::new();
    };
    doc.select_all(&selector)
        .into_iter()
        .map(|input| UploadField::new(input, compressor, notice_delay))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    use super::*;

    const FORM: &str = r#"<html><body><form>
<p id="photo"><input id="a" type="file" accept="image/*" name="photo"></p>
<p><input id="b" type="file" accept="image/png,image/jpeg"></p>
<p><input id="doc" type="file" accept=".pdf"></p>
<p><input id="name" type="text"></p>
</form></body></html>"#;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        encoded(width, height, ImageFormat::Png)
    }

    fn field(delay: Duration) -> Arc<UploadField> {
        let doc = Document::parse(FORM).unwrap();
        let input = doc.get_element_by_id("a").unwrap();
        UploadField::new(input, ImageCompressor::new(64, 48, 0.8), delay)
    }

    #[test]
    fn test_wire_file_inputs() {
        let doc = Document::parse(FORM).unwrap();
        let fields = wire_file_inputs(&doc, ImageCompressor::default(), Duration::from_secs(3));
        let ids: Vec<_> = fields.iter().map(|f| f.input()).collect();
        assert_eq!(
            ids,
            [
                doc.get_element_by_id("a").unwrap(),
                doc.get_element_by_id("b").unwrap()
            ]
        );
    }

    #[test]
    fn test_format_mb() {
        assert_eq!(format_mb(0), "0.0MB");
        assert_eq!(format_mb(2 * 1024 * 1024), "2.0MB");
        assert_eq!(format_mb(5_452_595), "5.2MB");
        assert_eq!(format_mb(300 * 1024), "0.3MB");
    }

    #[tokio::test]
    async fn test_non_image_is_not_compressed() {
        let field = field(Duration::from_secs(3));
        let pdf = UploadFile::new("manual.pdf", "application/pdf", b"%PDF-1.7".to_vec());

        let outcome = field.on_change(vec![pdf.clone()]).await;
        assert!(matches!(outcome, ChangeOutcome::Skipped));
        assert_eq!(field.notice(), None);
        assert_eq!(field.files(), [pdf]);
    }

    #[tokio::test]
    async fn test_gif_and_bmp_are_compressed() {
        for (name, mime, format) in [
            ("banner.gif", "image/gif", ImageFormat::Gif),
            ("scan.bmp", "image/bmp", ImageFormat::Bmp),
        ] {
            let field = field(Duration::from_secs(3));
            let file = UploadFile::new(name, mime, encoded(128, 96, format));

            let outcome = field.on_change(vec![file]).await;
            assert!(matches!(outcome, ChangeOutcome::Applied { .. }), "{name}: {outcome:?}");
            let files = field.files();
            assert_eq!(files[0].name, name);
            assert_eq!(files[0].mime, "image/jpeg");
        }
    }

    #[tokio::test]
    async fn test_image_without_codec_is_kept() {
        let field = field(Duration::from_secs(3));
        let svg = UploadFile::new(
            "logo.svg",
            "image/svg+xml",
            br#"<svg xmlns="http://www.w3.org/2000/svg"/>"#.to_vec(),
        );

        let outcome = field.on_change(vec![svg.clone()]).await;
        assert!(matches!(outcome, ChangeOutcome::Skipped));
        assert_eq!(field.notice(), None);
        assert_eq!(field.files(), [svg]);
    }

    #[tokio::test]
    async fn test_progress_rendered_before_compression() {
        let mut doc = Document::parse(FORM).unwrap();
        let input = doc.get_element_by_id("a").unwrap();
        let field = UploadField::new(input, ImageCompressor::new(64, 48, 0.8), Duration::from_secs(3));
        let selector = Selector::parse("div.image-progress").unwrap();

        let pending = field
            .begin(vec![UploadFile::new("cama.png", "image/png", png(200, 100))])
            .unwrap();
        field.render(&mut doc);
        let notices = doc.select_all(&selector);
        assert_eq!(notices.len(), 1);
        assert_eq!(doc.text_content(notices[0]), PROGRESS_TEXT);
        assert_eq!(doc.element(notices[0]).unwrap().style("color"), None);

        assert!(matches!(field.finish(pending).await, ChangeOutcome::Applied { .. }));
        field.render(&mut doc);
        assert!(doc.text_content(notices[0]).starts_with("Optimized: "));
        assert_eq!(doc.element(notices[0]).unwrap().style("color"), Some("green"));
    }

    #[tokio::test]
    async fn test_empty_selection_is_skipped() {
        let field = field(Duration::from_secs(3));
        assert!(matches!(field.on_change(Vec::new()).await, ChangeOutcome::Skipped));
        assert!(field.files().is_empty());
    }

    #[tokio::test]
    async fn test_image_is_replaced_with_jpeg() {
        let field = field(Duration::from_secs(3));
        let bytes = png(640, 480);
        let size = bytes.len();

        let outcome = field
            .on_change(vec![UploadFile::new("cama.png", "image/png", bytes)])
            .await;
        let ChangeOutcome::Applied {
            original,
            compressed,
        } = outcome
        else {
            panic!("expected Applied, got {outcome:?}");
        };
        assert_eq!(original, size);

        let files = field.files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "cama.png");
        assert_eq!(files[0].mime, "image/jpeg");
        assert_eq!(files[0].size(), compressed);

        let notice = field.notice().unwrap();
        assert_eq!(notice.tone, Tone::Success);
        assert_eq!(
            notice.text,
            format!("Optimized: {} → {}", format_mb(original), format_mb(compressed))
        );
    }

    #[tokio::test]
    async fn test_failure_notice() {
        let field = field(Duration::from_secs(3));
        let broken = UploadFile::new("broken.jpg", "image/jpeg", b"not really a jpeg".to_vec());

        let outcome = field.on_change(vec![broken.clone()]).await;
        assert!(matches!(outcome, ChangeOutcome::Failed(CompressError::Decode(_))));
        assert_eq!(field.notice().map(|n| n.text).as_deref(), Some(FAILURE_TEXT));
        assert_eq!(field.files(), [broken]);
    }

    #[tokio::test]
    async fn test_stale_result_is_dropped() {
        let field = field(Duration::from_secs(3));
        let first = UploadFile::new("first.png", "image/png", png(320, 240));
        let second = UploadFile::new("second.png", "image/png", png(200, 100));

        let (a, b) = tokio::join!(field.on_change(vec![first]), field.on_change(vec![second]));
        assert!(matches!(a, ChangeOutcome::Superseded));
        assert!(matches!(b, ChangeOutcome::Applied { .. }));

        let files = field.files();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "second.png");
        assert_eq!(field.generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_cleared_after_delay() {
        let field = field(Duration::from_secs(3));
        field.state.lock().notice = Some(Notice::failure());

        let handle = field.schedule_clear(field.generation());
        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert!(field.notice().is_some());

        handle.await.unwrap();
        assert_eq!(field.notice(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notice_kept_for_newer_selection() {
        let field = field(Duration::from_secs(3));
        field.state.lock().notice = Some(Notice::progress());

        let handle = field.schedule_clear(field.generation());
        field.generation.fetch_add(1, Ordering::SeqCst);
        handle.await.unwrap();
        assert_eq!(field.notice(), Some(Notice::progress()));
    }

    #[test]
    fn test_render_notice_next_to_input() {
        let mut doc = Document::parse(FORM).unwrap();
        let input = doc.get_element_by_id("a").unwrap();
        let field = UploadField::new(input, ImageCompressor::default(), Duration::from_secs(3));
        let selector = Selector::parse("div.image-progress").unwrap();

        field.state.lock().notice = Some(Notice::progress());
        field.render(&mut doc);
        let notices = doc.select_all(&selector);
        assert_eq!(notices.len(), 1);
        assert_eq!(doc.parent(notices[0]), doc.get_element_by_id("photo"));
        assert_eq!(doc.text_content(notices[0]), PROGRESS_TEXT);

        field.state.lock().notice = Some(Notice::failure());
        field.render(&mut doc);
        assert_eq!(doc.select_all(&selector), notices);
        let el = doc.element(notices[0]).unwrap();
        assert_eq!(el.style("color"), Some("red"));
        assert_eq!(doc.text_content(notices[0]), FAILURE_TEXT);

        field.state.lock().notice = None;
        field.render(&mut doc);
        assert!(doc.select_all(&selector).is_empty());
    }
}
