//! Deferred loading of tagged media.
//!
//! Elements carry their real URL in `data-lazy`. Loading copies it into
//! `src` (and `srcset` for `img`/`source`), then swaps class `lazy` for
//! `loaded`. With intersection observation the copy happens once an element
//! nears the viewport and fades in; without it everything loads at once.
//!
//! Embedded media (`iframe`, `video`) follow a lighter path: a separate
//! observer with no root margin, and loading only sets `src`.

use rustc_hash::FxHashSet;

use super::geometry::Rect;
use super::observer::{Dispatcher, LayoutSource, ObserverOptions};
use crate::config::LazyConfig;
use crate::debug;
use crate::dom::{Document, DomError, NodeId, Selector};

/// Attribute holding the deferred source URL.
pub const LAZY_ATTR: &str = "data-lazy";
/// Class present until the element is loaded.
pub const CLASS_PENDING: &str = "lazy";
/// Class added once the element is loaded.
pub const CLASS_LOADED: &str = "loaded";

pub struct LazyLoader {
    /// `None` when the eager fallback ran at init.
    dispatcher: Option<Dispatcher<bool>>,
    /// Embedded media, observed with [`ObserverOptions::plain`].
    media: Option<Dispatcher<bool>>,
    /// Loaded elements waiting for their resource to finish.
    fading: FxHashSet<NodeId>,
    transition: String,
}

impl LazyLoader {
    /// Collect tagged elements and start observing them.
    ///
    /// When `intersection_supported` is false every tagged element is loaded
    /// immediately without fading.
    pub fn init(
        doc: &mut Document,
        config: &LazyConfig,
        intersection_supported: bool,
    ) -> Result<Self, DomError> {
        let selector = Selector::parse(&config.selector)?;
        let media_selector = Selector::parse(&config.media_selector)?;
        let mut loader = Self {
            dispatcher: None,
            media: None,
            fading: FxHashSet::default(),
            transition: config.transition.trim().to_owned(),
        };

        if !intersection_supported {
            let loaded = load_all(doc, &selector);
            let media = doc
                .select_all(&media_selector)
                .into_iter()
                .filter(|&id| load_media(doc, id))
                .count();
            debug!(
                "lazy";
                "intersection observation unavailable, loaded {} images and {} media eagerly",
                loaded, media
            );
            return Ok(loader);
        }

        let mut dispatcher = Dispatcher::new(config.observer_options());
        for id in doc.select_all(&selector) {
            dispatcher.subscribe(id, Box::new(|doc, entry| load_element(doc, entry.target)));
        }
        let mut media = Dispatcher::new(ObserverOptions::plain());
        for id in doc.select_all(&media_selector) {
            if !dispatcher.is_subscribed(id) {
                media.subscribe(id, Box::new(|doc, entry| load_media(doc, entry.target)));
            }
        }
        debug!("lazy"; "observing {} images, {} media", dispatcher.len(), media.len());
        loader.dispatcher = Some(dispatcher);
        loader.media = Some(media);
        Ok(loader)
    }

    /// Re-measure after a scroll or resize. Returns how many elements loaded.
    pub fn on_viewport_change(
        &mut self,
        doc: &mut Document,
        viewport: Rect,
        layout: &dyn LayoutSource,
    ) -> usize {
        let Some(dispatcher) = self.dispatcher.as_mut() else {
            return 0;
        };

        let mut count = 0;
        for (id, loaded) in dispatcher.dispatch(doc, viewport, layout) {
            if !loaded {
                continue;
            }
            count += 1;
            if !self.transition.is_empty() {
                begin_fade(doc, id, &self.transition);
                self.fading.insert(id);
            }
        }
        if let Some(media) = self.media.as_mut() {
            count += media
                .dispatch(doc, viewport, layout)
                .into_iter()
                .filter(|&(_, loaded)| loaded)
                .count();
        }
        count
    }

    /// Completion of an element's resource fetch. Returns whether the element
    /// was fading in.
    pub fn on_resource_loaded(&mut self, doc: &mut Document, id: NodeId) -> bool {
        if !self.fading.remove(&id) {
            return false;
        }
        if let Some(el) = doc.element_mut(id) {
            el.set_style("opacity", "1");
        }
        true
    }

    pub fn is_observing(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Elements still waiting to intersect.
    pub fn pending(&self) -> usize {
        self.dispatcher.as_ref().map_or(0, Dispatcher::len)
            + self.media.as_ref().map_or(0, Dispatcher::len)
    }

    /// Elements loaded but not yet faded in.
    pub fn fading(&self) -> usize {
        self.fading.len()
    }
}

/// Load every matching element now, without fading.
///
/// Running it twice leaves the document unchanged.
pub fn load_all(doc: &mut Document, selector: &Selector) -> usize {
    doc.select_all(selector)
        .into_iter()
        .filter(|&id| load_element(doc, id))
        .count()
}

/// Copy `data-lazy` into the source attributes and mark the element loaded.
///
/// Returns false for non-elements and elements without `data-lazy`.
pub fn load_element(doc: &mut Document, id: NodeId) -> bool {
    let Some(el) = doc.element_mut(id) else {
        return false;
    };
    let Some(source) = el.attr(LAZY_ATTR).filter(|s| !s.is_empty()).map(str::to_owned) else {
        return false;
    };

    if el.is("img") || el.is("source") {
        el.set_attr("srcset", source.as_str());
    }
    el.set_attr("src", source);
    el.remove_class(CLASS_PENDING);
    el.add_class(CLASS_LOADED);
    true
}

/// Copy `data-lazy` into `src` of an embedded media element. Classes and
/// style are left alone.
pub fn load_media(doc: &mut Document, id: NodeId) -> bool {
    let Some(el) = doc.element_mut(id) else {
        return false;
    };
    let Some(source) = el.attr(LAZY_ATTR).filter(|s| !s.is_empty()).map(str::to_owned) else {
        return false;
    };
    el.set_attr("src", source);
    true
}

fn begin_fade(doc: &mut Document, id: NodeId, transition: &str) {
    if let Some(el) = doc.element_mut(id) {
        el.set_style("opacity", "0");
        el.set_style("transition", transition);
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashMap;

    use super::*;

    const VIEWPORT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

    const PAGE: &str = r#"<html><head></head><body>
<img id="a" class="lazy" data-lazy="/media/a.jpg">
<img id="b" class="lazy" data-lazy="/media/b.jpg">
<picture><source id="s" data-lazy="/media/a.webp"></picture>
<iframe id="f" data-lazy="https://video.example/embed/1"></iframe>
<img id="plain" src="/media/logo.png">
</body></html>"#;

    fn id(doc: &Document, name: &str) -> NodeId {
        doc.get_element_by_id(name).unwrap()
    }

    fn attr(doc: &Document, name: &str, attr: &str) -> Option<String> {
        doc.element(id(doc, name))
            .and_then(|el| el.attr(attr))
            .map(str::to_owned)
    }

    fn layout(doc: &Document, rows: &[(&str, f64)]) -> FxHashMap<NodeId, Rect> {
        rows.iter()
            .map(|&(name, y)| (id(doc, name), Rect::new(0.0, y, 300.0, 200.0)))
            .collect()
    }

    #[test]
    fn test_load_element_img() {
        let mut doc = Document::parse(PAGE).unwrap();
        let a = id(&doc, "a");
        assert!(load_element(&mut doc, a));

        let el = doc.element(a).unwrap();
        assert_eq!(el.attr("src"), Some("/media/a.jpg"));
        assert_eq!(el.attr("srcset"), Some("/media/a.jpg"));
        assert!(!el.has_class("lazy"));
        assert!(el.has_class("loaded"));
    }

    #[test]
    fn test_load_element_iframe_has_no_srcset() {
        let mut doc = Document::parse(PAGE).unwrap();
        let f = id(&doc, "f");
        assert!(load_element(&mut doc, f));
        assert_eq!(attr(&doc, "f", "src").as_deref(), Some("https://video.example/embed/1"));
        assert_eq!(attr(&doc, "f", "srcset"), None);
    }

    #[test]
    fn test_load_element_skips_untagged() {
        let mut doc = Document::parse(PAGE).unwrap();
        let plain = id(&doc, "plain");
        let before = doc.to_html();
        let body = doc.body().unwrap();
        assert!(!load_element(&mut doc, plain));
        assert!(!load_element(&mut doc, body));
        assert_eq!(doc.to_html(), before);
    }

    #[test]
    fn test_fallback_loads_everything_without_fade() {
        let mut doc = Document::parse(PAGE).unwrap();
        let loader = LazyLoader::init(&mut doc, &LazyConfig::default(), false).unwrap();

        assert!(!loader.is_observing());
        assert_eq!(loader.pending(), 0);
        for name in ["a", "b", "s", "f"] {
            assert!(attr(&doc, name, "src").is_some(), "{name} not loaded");
            assert_eq!(attr(&doc, name, "style"), None);
        }
        assert_eq!(attr(&doc, "plain", "src").as_deref(), Some("/media/logo.png"));
    }

    #[test]
    fn test_fallback_is_idempotent() {
        let mut doc = Document::parse(PAGE).unwrap();
        let selector = Selector::parse(&LazyConfig::default().selector).unwrap();

        assert_eq!(load_all(&mut doc, &selector), 3);
        let once = doc.to_html();
        load_all(&mut doc, &selector);
        assert_eq!(doc.to_html(), once);
    }

    #[test]
    fn test_observer_loads_near_viewport_only() {
        let mut doc = Document::parse(PAGE).unwrap();
        let mut loader = LazyLoader::init(&mut doc, &LazyConfig::default(), true).unwrap();
        assert_eq!(loader.pending(), 4);

        // `a` on screen, `b` 40px below the fold (inside the 50px margin),
        // the rest far below
        let layout = layout(&doc, &[("a", 100.0), ("b", 640.0), ("s", 2000.0), ("f", 3000.0)]);
        assert_eq!(loader.on_viewport_change(&mut doc, VIEWPORT, &layout), 2);

        assert!(attr(&doc, "a", "src").is_some());
        assert!(attr(&doc, "b", "src").is_some());
        assert_eq!(attr(&doc, "s", "src"), None);
        assert_eq!(loader.pending(), 2);
    }

    #[test]
    fn test_media_uses_plain_observer_and_sets_src_only() {
        let mut doc = Document::parse(PAGE).unwrap();
        let mut loader = LazyLoader::init(&mut doc, &LazyConfig::default(), true).unwrap();

        // 40px below the fold: inside the image margin, outside the viewport
        let below = layout(&doc, &[("b", 640.0), ("f", 640.0)]);
        assert_eq!(loader.on_viewport_change(&mut doc, VIEWPORT, &below), 1);
        assert!(attr(&doc, "b", "src").is_some());
        assert_eq!(attr(&doc, "f", "src"), None);

        let on_screen = layout(&doc, &[("f", 500.0)]);
        assert_eq!(loader.on_viewport_change(&mut doc, VIEWPORT, &on_screen), 1);
        assert_eq!(attr(&doc, "f", "src").as_deref(), Some("https://video.example/embed/1"));
        assert_eq!(attr(&doc, "f", "srcset"), None);
        assert_eq!(attr(&doc, "f", "class"), None);
        assert_eq!(attr(&doc, "f", "style"), None);

        let f = id(&doc, "f");
        assert!(!loader.on_resource_loaded(&mut doc, f));
        assert_eq!(loader.pending(), 2);
    }

    #[test]
    fn test_observer_loads_at_most_once() {
        let mut doc = Document::parse(PAGE).unwrap();
        let mut loader = LazyLoader::init(&mut doc, &LazyConfig::default(), true).unwrap();
        let layout = layout(&doc, &[("a", 100.0)]);

        assert_eq!(loader.on_viewport_change(&mut doc, VIEWPORT, &layout), 1);
        // Scroll away and back again
        let away = Rect::new(0.0, 5000.0, 800.0, 600.0);
        assert_eq!(loader.on_viewport_change(&mut doc, away, &layout), 0);
        assert_eq!(loader.on_viewport_change(&mut doc, VIEWPORT, &layout), 0);
        assert_eq!(loader.pending(), 3);
    }

    #[test]
    fn test_fade_in_on_resource_loaded() {
        let mut doc = Document::parse(PAGE).unwrap();
        let mut loader = LazyLoader::init(&mut doc, &LazyConfig::default(), true).unwrap();
        let layout = layout(&doc, &[("a", 0.0)]);
        loader.on_viewport_change(&mut doc, VIEWPORT, &layout);

        let a = id(&doc, "a");
        let el = doc.element(a).unwrap();
        assert_eq!(el.style("opacity"), Some("0"));
        assert_eq!(el.style("transition"), Some("opacity 0.3s ease"));
        assert_eq!(loader.fading(), 1);

        assert!(loader.on_resource_loaded(&mut doc, a));
        assert_eq!(doc.element(a).unwrap().style("opacity"), Some("1"));
        assert!(!loader.on_resource_loaded(&mut doc, a));

        let b = id(&doc, "b");
        assert!(!loader.on_resource_loaded(&mut doc, b));
        assert_eq!(doc.element(b).unwrap().style("opacity"), None);
    }

    #[test]
    fn test_empty_transition_disables_fade() {
        let mut doc = Document::parse(PAGE).unwrap();
        let config = LazyConfig {
            transition: String::new(),
            ..LazyConfig::default()
        };
        let mut loader = LazyLoader::init(&mut doc, &config, true).unwrap();
        let layout = layout(&doc, &[("a", 0.0)]);
        assert_eq!(loader.on_viewport_change(&mut doc, VIEWPORT, &layout), 1);
        assert_eq!(attr(&doc, "a", "style"), None);
        assert_eq!(loader.fading(), 0);
    }

    #[test]
    fn test_tag_removed_before_intersection_is_skipped() {
        let mut doc = Document::parse(PAGE).unwrap();
        let mut loader = LazyLoader::init(&mut doc, &LazyConfig::default(), true).unwrap();
        let a = id(&doc, "a");
        doc.element_mut(a).unwrap().remove_attr("data-lazy");

        let layout = layout(&doc, &[("a", 0.0)]);
        assert_eq!(loader.on_viewport_change(&mut doc, VIEWPORT, &layout), 0);
        assert_eq!(attr(&doc, "a", "src"), None);
        assert!(doc.element(a).unwrap().has_class("lazy"));
        // Handler fired and was dropped; the element is not re-observed
        assert_eq!(loader.pending(), 3);
    }

    #[test]
    fn test_invalid_selector() {
        let mut doc = Document::parse(PAGE).unwrap();
        let config = LazyConfig {
            selector: "body img".into(),
            ..LazyConfig::default()
        };
        assert!(LazyLoader::init(&mut doc, &config, true).is_err());
    }
}
