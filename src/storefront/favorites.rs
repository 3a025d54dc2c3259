//! Favorite buttons.

use super::toast::Toast;
use crate::dom::{Document, NodeId};

pub const BUTTON_CLASS: &str = "favorite-btn";
pub const FAVORITED_CLASS: &str = "favorited";

/// Flip the `favorited` state of a `.favorite-btn`.
///
/// Returns `None` when `button` is not a favorite button.
pub fn toggle_favorite(doc: &mut Document, button: NodeId) -> Option<Toast> {
    let el = doc.element_mut(button).filter(|el| el.has_class(BUTTON_CLASS))?;

    if el.remove_class(FAVORITED_CLASS) {
        Some(Toast::info("Removed from favorites"))
    } else {
        el.add_class(FAVORITED_CLASS);
        Some(Toast::success("Added to favorites"))
    }
}
