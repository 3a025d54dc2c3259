//! Intersection observation and one-shot dispatch.
//!
//! ```text
//! viewport change ──► IntersectionObserver ──► entries ──► Dispatcher
//!                     (ratio per target)                   (one-shot handler
//!                                                           per NodeId, removed
//!                                                           before it runs)
//! ```
//!
//! Layout is supplied by the caller through [`LayoutSource`], so the whole
//! flow runs without a rendering engine.

use rustc_hash::FxHashMap;

use super::geometry::{Margin, Rect};
use crate::dom::{Document, NodeId};

/// Observer configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Growth applied to the viewport before testing targets.
    pub root_margin: Margin,
    /// Minimum visible fraction of a target to count as intersecting.
    pub threshold: f64,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            root_margin: Margin::vertical(50.0),
            threshold: 0.01,
        }
    }
}

impl ObserverOptions {
    /// No root margin, any overlap counts.
    pub const fn plain() -> Self {
        Self {
            root_margin: Margin::uniform(0.0),
            threshold: 0.0,
        }
    }
}

/// Where elements currently sit on the page.
pub trait LayoutSource {
    /// Bounding box in the same coordinate space as the viewport, or `None`
    /// if the element is not rendered.
    fn bounding_rect(&self, id: NodeId) -> Option<Rect>;
}

impl LayoutSource for FxHashMap<NodeId, Rect> {
    fn bounding_rect(&self, id: NodeId) -> Option<Rect> {
        self.get(&id).copied()
    }
}

/// One intersection state change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeId,
    pub bounds: Rect,
    /// Visible fraction of the target within the expanded root.
    pub ratio: f64,
    pub is_intersecting: bool,
}

/// Compute the entry for one target against an already expanded root.
pub fn measure(target: NodeId, bounds: Rect, root: &Rect, threshold: f64) -> IntersectionEntry {
    let overlap = bounds.intersection(root);
    let ratio = match overlap {
        // Zero-area targets (e.g. images without dimensions yet) count as
        // fully visible once they touch the root.
        Some(_) if bounds.area() == 0.0 => 1.0,
        Some(rect) => (rect.area() / bounds.area()).min(1.0),
        None => 0.0,
    };

    IntersectionEntry {
        target,
        bounds,
        ratio,
        is_intersecting: overlap.is_some() && ratio >= threshold,
    }
}

#[derive(Debug)]
struct Target {
    id: NodeId,
    /// Last reported state; `None` until the first measurement.
    last: Option<bool>,
}

/// Tracks a set of targets and reports state changes against a viewport.
#[derive(Debug)]
pub struct IntersectionObserver {
    options: ObserverOptions,
    targets: Vec<Target>,
}

impl IntersectionObserver {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            options,
            targets: Vec::new(),
        }
    }

    pub fn options(&self) -> &ObserverOptions {
        &self.options
    }

    /// Start observing. Observing the same element twice is a no-op.
    pub fn observe(&mut self, id: NodeId) {
        if !self.is_observing(id) {
            self.targets.push(Target { id, last: None });
        }
    }

    /// Stop observing. Returns whether the element was observed.
    pub fn unobserve(&mut self, id: NodeId) -> bool {
        let before = self.targets.len();
        self.targets.retain(|t| t.id != id);
        self.targets.len() != before
    }

    pub fn is_observing(&self, id: NodeId) -> bool {
        self.targets.iter().any(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Measure every target and return those whose state changed since the
    /// last call (every measurable target on its first measurement).
    ///
    /// Targets without layout are skipped and keep their previous state.
    pub fn take_records(&mut self, viewport: Rect, layout: &dyn LayoutSource) -> Vec<IntersectionEntry> {
        let root = viewport.expand(&self.options.root_margin);
        let threshold = self.options.threshold;

        self.targets
            .iter_mut()
            .filter_map(|target| {
                let bounds = layout.bounding_rect(target.id)?;
                let entry = measure(target.id, bounds, &root, threshold);
                if target.last == Some(entry.is_intersecting) {
                    return None;
                }
                target.last = Some(entry.is_intersecting);
                Some(entry)
            })
            .collect()
    }
}

/// Handler run at most once, when its element first intersects.
pub type OneShot<T> = Box<dyn FnOnce(&mut Document, &IntersectionEntry) -> T>;

/// Registry of one-shot handlers keyed by element, owning the single
/// shared observer.
///
/// Subscribing observes; firing removes the handler and unobserves before
/// the handler runs, so no element can fire twice.
pub struct Dispatcher<T> {
    observer: IntersectionObserver,
    handlers: FxHashMap<NodeId, OneShot<T>>,
}

impl<T> Dispatcher<T> {
    pub fn new(options: ObserverOptions) -> Self {
        Self {
            observer: IntersectionObserver::new(options),
            handlers: FxHashMap::default(),
        }
    }

    /// Register (or replace) the handler for an element.
    pub fn subscribe(&mut self, id: NodeId, handler: OneShot<T>) {
        self.handlers.insert(id, handler);
        self.observer.observe(id);
    }

    /// Drop the handler without running it.
    pub fn unsubscribe(&mut self, id: NodeId) -> bool {
        self.observer.unobserve(id);
        self.handlers.remove(&id).is_some()
    }

    pub fn is_subscribed(&self, id: NodeId) -> bool {
        self.handlers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn observer(&self) -> &IntersectionObserver {
        &self.observer
    }

    /// Measure against `viewport` and fire handlers of newly intersecting
    /// elements, in observation order.
    pub fn dispatch(
        &mut self,
        doc: &mut Document,
        viewport: Rect,
        layout: &dyn LayoutSource,
    ) -> Vec<(NodeId, T)> {
        let entries = self.observer.take_records(viewport, layout);

        let mut fired = Vec::new();
        for entry in entries.iter().filter(|e| e.is_intersecting) {
            let Some(handler) = self.handlers.remove(&entry.target) else {
                continue;
            };
            self.observer.unobserve(entry.target);
            fired.push((entry.target, handler(doc, entry)));
        }
        fired
    }
}
