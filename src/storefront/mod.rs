//! Storefront widgets built on the document model.
//!
//! | Module      | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `toast`     | Toast notifications                              |
//! | `compare`   | Comparison list backed by local storage          |
//! | `favorites` | Favorite button toggling                         |
//! | `gallery`   | Main image switching from thumbnails             |
//! | `page`      | Startup sequence and event routing               |

pub mod compare;
pub mod favorites;
pub mod gallery;
pub mod page;
pub mod toast;

pub use page::{Capabilities, Page};
