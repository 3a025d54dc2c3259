//! Configuration section definitions.
//!
//! Each module corresponds to a section in `vitrine.toml`:
//!
//! | Module     | TOML Section   | Purpose                                |
//! |------------|----------------|----------------------------------------|
//! | `lazy`     | `[lazy]`       | Deferred media loading and preloads    |
//! | `compress` | `[compress]`   | Upload compression bounds and timing   |
//! | `compare`  | `[compare]`    | Comparison list storage and capacity   |

mod compare;
mod compress;
mod lazy;

pub use compare::CompareConfig;
pub use compress::CompressConfig;
pub use lazy::LazyConfig;
