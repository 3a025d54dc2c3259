//! Storefront image pipeline.
//!
//! # Modules
//!
//! - [`lazy`]: deferred loading of `data-lazy` media
//! - [`webp`]: one-time WebP decode capability probe
//! - [`compress`]: downscale and JPEG re-encode before upload
//! - [`upload`]: file input integration for the compressor
//! - [`preload`]: `<link rel="preload">` injection for critical images

pub mod compress;
pub mod lazy;
pub mod preload;
pub mod upload;
pub mod webp;
