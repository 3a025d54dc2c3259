//! Product image gallery.

use crate::dom::{Document, NodeId, Selector};

pub const MAIN_IMAGE_ID: &str = "mainImage";
pub const THUMBNAIL_CLASS: &str = "thumbnail";
pub const ACTIVE_CLASS: &str = "active";

/// Show `thumbnail` in `#mainImage` and mark it active.
///
/// Returns false, leaving the document untouched, when `#mainImage` is
/// missing or `thumbnail` is not a `.thumbnail`.
pub fn change_main_image(doc: &mut Document, thumbnail: NodeId) -> bool {
    let Some(main) = doc.get_element_by_id(MAIN_IMAGE_ID) else {
        return false;
    };
    let Some(src) = doc
        .element(thumbnail)
        .filter(|el| el.has_class(THUMBNAIL_CLASS))
        .map(|el| el.attr("src").unwrap_or_default().to_owned())
    else {
        return false;
    };
    let Ok(thumbnails) = Selector::parse(&format!(".{THUMBNAIL_CLASS}")) else {
        return false;
    };

    if let Some(el) = doc.element_mut(main) {
        el.set_attr("src", src);
    }
    for id in doc.select_all(&thumbnails) {
        if let Some(el) = doc.element_mut(id) {
            el.toggle_class(ACTIVE_CLASS, id == thumbnail);
        }
    }
    true
}
