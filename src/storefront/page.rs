//! Page session: startup sequence and event routing.
//!
//! ```text
//! Page::boot ─► webp probe ─► preloads ─► lazy loader ─► comparison widget
//!                                                      └► file inputs
//! click / scroll / resource_loaded / select_files ─► widgets ─► toasts
//! ```

use std::sync::Arc;

use super::compare::{ADD_BUTTON_CLASS, ComparisonList, install_buttons};
use super::favorites::{self, toggle_favorite};
use super::gallery::{THUMBNAIL_CLASS, change_main_image};
use super::toast::{Toast, ToastKind, ToastStack};
use crate::config::VitrineConfig;
use crate::dom::{Document, DomError, NodeId};
use crate::image::lazy::{LayoutSource, LazyLoader, Rect};
use crate::image::preload::inject_preloads;
use crate::image::upload::{ChangeOutcome, UploadField, UploadFile, wire_file_inputs};
use crate::image::webp::WebpDetector;
use crate::store::{KeyValueStore, StorageError};
use crate::{debug, log};

/// Attribute routing clicks to comparison actions (`clear`, `toggle`,
/// `remove`).
pub const COMPARE_ACTION_ATTR: &str = "data-compare-action";
pub const COMPARISON_MODAL_ID: &str = "comparisonModal";

/// What the host environment offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub intersection_observer: bool,
    /// Probe WebP decoding and mark the root. Off when the markup is
    /// rendered ahead of time, since the marker describes the client.
    pub webp_probe: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            intersection_observer: true,
            webp_probe: true,
        }
    }
}

pub struct Page {
    doc: Document,
    store: Box<dyn KeyValueStore>,
    webp: WebpDetector,
    loader: LazyLoader,
    comparison: ComparisonList,
    toasts: ToastStack,
    uploads: Vec<Arc<UploadField>>,
}

impl Page {
    /// Run the startup sequence on a parsed document.
    pub fn boot(
        mut doc: Document,
        config: &VitrineConfig,
        store: Box<dyn KeyValueStore>,
        capabilities: Capabilities,
    ) -> Result<Self, DomError> {
        let webp = WebpDetector::new();
        if capabilities.webp_probe {
            webp.detect(&mut doc);
        }

        if config.lazy.preload {
            let links = inject_preloads(&mut doc);
            debug!("page"; "{} preload links", links);
        }

        let loader = LazyLoader::init(&mut doc, &config.lazy, capabilities.intersection_observer)?;

        let comparison = ComparisonList::load(store.as_ref(), config.compare.max_items);
        comparison.update_widget(&mut doc);
        install_buttons(&mut doc);

        let uploads = wire_file_inputs(
            &doc,
            config.compress.compressor(),
            config.compress.notice_delay(),
        );
        debug!("page"; "{} upload fields", uploads.len());

        Ok(Self {
            doc,
            store,
            webp,
            loader,
            comparison,
            toasts: ToastStack::new(),
            uploads,
        })
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn webp_supported(&self) -> Option<bool> {
        self.webp.is_supported()
    }

    pub fn loader(&self) -> &LazyLoader {
        &self.loader
    }

    pub fn comparison(&self) -> &ComparisonList {
        &self.comparison
    }

    pub fn toasts(&self) -> &ToastStack {
        &self.toasts
    }

    pub fn uploads(&self) -> &[Arc<UploadField>] {
        &self.uploads
    }

    // ========================================================================
    // events
    // ========================================================================

    /// Route a click on `target` (or its nearest handled ancestor).
    /// Returns whether any widget handled it.
    pub fn click(&mut self, target: NodeId) -> bool {
        let mut current = Some(target);
        while let Some(node) = current {
            if self.handle_click(node) {
                self.toasts.render(&mut self.doc);
                return true;
            }
            current = self.doc.parent(node);
        }
        false
    }

    fn handle_click(&mut self, node: NodeId) -> bool {
        let Some(el) = self.doc.element(node) else {
            return false;
        };
        let product_id = el.attr("data-product-id").map(str::to_owned);
        let action = el.attr(COMPARE_ACTION_ATTR).map(str::to_owned);
        let is_add = el.has_class(ADD_BUTTON_CLASS);
        let is_favorite = el.has_class(favorites::BUTTON_CLASS);
        let is_thumbnail = el.has_class(THUMBNAIL_CLASS);

        if is_add {
            let Some(id) = product_id else {
                return false;
            };
            let result = self.comparison.add(&id, self.store.as_mut());
            self.after_comparison(result);
            return true;
        }

        if let Some(action) = action {
            match (action.as_str(), product_id) {
                ("clear", _) => {
                    let result = self.comparison.clear(self.store.as_mut());
                    self.after_comparison(result);
                }
                ("remove", Some(id)) => {
                    let result = self.comparison.remove(&id, self.store.as_mut());
                    self.after_comparison(result);
                }
                ("toggle", _) => match self.comparison.toggle() {
                    Some(toast) => self.toasts.push(toast),
                    None => self.open_comparison_modal(),
                },
                _ => return false,
            }
            return true;
        }

        if is_favorite {
            if let Some(toast) = toggle_favorite(&mut self.doc, node) {
                self.toasts.push(toast);
            }
            return true;
        }

        is_thumbnail && change_main_image(&mut self.doc, node)
    }

    fn after_comparison(&mut self, result: Result<Toast, StorageError>) {
        match result {
            Ok(toast) => self.toasts.push(toast),
            Err(e) => {
                log!("compare"; "{}", e);
                self.toasts
                    .push(Toast::new("Could not save the comparison", ToastKind::Danger));
            }
        }
        self.comparison.update_widget(&mut self.doc);
    }

    fn open_comparison_modal(&mut self) {
        let Some(modal) = self.doc.get_element_by_id(COMPARISON_MODAL_ID) else {
            return;
        };
        if let Some(el) = self.doc.element_mut(modal) {
            el.add_class("show");
            el.set_style("display", "block");
        }
    }

    /// Viewport moved or resized. Returns how many elements loaded.
    pub fn scroll(&mut self, viewport: Rect, layout: &dyn LayoutSource) -> usize {
        self.loader.on_viewport_change(&mut self.doc, viewport, layout)
    }

    /// An element's resource finished loading.
    pub fn resource_loaded(&mut self, id: NodeId) -> bool {
        self.loader.on_resource_loaded(&mut self.doc, id)
    }

    /// Files were selected on `input`. `None` when the input is not wired.
    pub async fn select_files(
        &mut self,
        input: NodeId,
        files: Vec<UploadFile>,
    ) -> Option<ChangeOutcome> {
        let field = self.uploads.iter().find(|f| f.input() == input)?.clone();
        let pending = field.begin(files);
        field.render(&mut self.doc);

        let outcome = match pending {
            Some(pending) => field.finish(pending).await,
            None => ChangeOutcome::Skipped,
        };
        field.render(&mut self.doc);
        Some(outcome)
    }

    /// Toasts finished showing; take them out of the page.
    pub fn dismiss_toasts(&mut self) -> usize {
        self.toasts.dismiss(&mut self.doc)
    }

    /// Re-render upload notices, e.g. after their display delay elapsed.
    pub fn refresh_notices(&mut self) {
        for field in &self.uploads {
            field.render(&mut self.doc);
        }
    }
}
