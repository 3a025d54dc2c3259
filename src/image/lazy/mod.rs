//! Deferred media loading.
//!
//! | Module     | Purpose                                       |
//! |------------|-----------------------------------------------|
//! | `geometry` | Rectangles and root margins                   |
//! | `observer` | Intersection observer and one-shot dispatcher |
//! | `loader`   | `data-lazy` loading, fade-in, eager fallback  |

mod geometry;
mod loader;
mod observer;

pub use geometry::{Margin, Rect};
pub use loader::LazyLoader;
pub use observer::{LayoutSource, ObserverOptions};

#[cfg(test)]
pub use loader::CLASS_LOADED;
