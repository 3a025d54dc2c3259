//! Preload hints for critical images.

use rustc_hash::FxHashSet;

use crate::dom::{Document, Element, Selector};

pub const PRELOAD_ATTR: &str = "data-preload";

/// Append `<link rel="preload" as="image">` to `<head>` for every element
/// carrying `data-preload`. Hrefs already preloaded are skipped.
///
/// Returns the number of links added.
pub fn inject_preloads(doc: &mut Document) -> usize {
    let Some(head) = doc.head() else {
        return 0;
    };
    let (Ok(tagged), Ok(existing)) = (
        Selector::parse("[data-preload]"),
        Selector::parse("link[rel=preload][as=image]"),
    ) else {
        return 0;
    };

    let mut seen: FxHashSet<String> = doc
        .select_within(head, &existing)
        .into_iter()
        .filter_map(|id| doc.element(id)?.attr("href").map(str::to_owned))
        .collect();

    let hrefs: Vec<String> = doc
        .select_all(&tagged)
        .into_iter()
        .filter_map(|id| doc.element(id)?.attr(PRELOAD_ATTR).map(str::to_owned))
        .filter(|href| !href.is_empty())
        .collect();

    let mut added = 0;
    for href in hrefs {
        if !seen.insert(href.clone()) {
            continue;
        }
        let link = Element::new("link")
            .with_attr("rel", "preload")
            .with_attr("as", "image")
            .with_attr("href", href);
        let link = doc.create_element(link);
        doc.append_child(head, link);
        added += 1;
    }
    added
}
