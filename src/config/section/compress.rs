//! `[compress]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [compress]
//! max_width = 1200
//! max_height = 900
//! quality = 0.85            # JPEG quality factor in (0, 1]
//! decode_timeout_ms = 10000 # give up on decodes that never settle
//! notice_ms = 3000          # how long the result notice stays visible
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::image::compress::ImageCompressor;

/// Upload compression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
    pub decode_timeout_ms: u64,
    pub notice_ms: u64,
}

impl CompressConfig {
    const MAX_WIDTH: FieldPath = FieldPath::new("compress.max_width");
    const MAX_HEIGHT: FieldPath = FieldPath::new("compress.max_height");
    const QUALITY: FieldPath = FieldPath::new("compress.quality");
    const DECODE_TIMEOUT: FieldPath = FieldPath::new("compress.decode_timeout_ms");

    pub fn compressor(&self) -> ImageCompressor {
        ImageCompressor {
            max_width: self.max_width,
            max_height: self.max_height,
            quality: self.quality,
            decode_timeout: Duration::from_millis(self.decode_timeout_ms),
        }
    }

    pub fn notice_delay(&self) -> Duration {
        Duration::from_millis(self.notice_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.max_width == 0 {
            diag.error(Self::MAX_WIDTH, "must be at least 1");
        }
        if self.max_height == 0 {
            diag.error(Self::MAX_HEIGHT, "must be at least 1");
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            diag.error_with_hint(
                Self::QUALITY,
                format!("{} is out of range", self.quality),
                "quality is a factor in (0, 1], e.g. 0.85",
            );
        }
        if self.decode_timeout_ms == 0 {
            diag.error(Self::DECODE_TIMEOUT, "must be positive");
        }
    }
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            max_width: 1200,
            max_height: 900,
            quality: 0.85,
            decode_timeout_ms: 10_000,
            notice_ms: 3_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_compress_config_defaults() {
        let config = test_parse_config("");
        let compressor = config.compress.compressor();
        assert_eq!(compressor.max_width, 1200);
        assert_eq!(compressor.max_height, 900);
        assert_eq!(compressor.quality, 0.85);
        assert_eq!(compressor.decode_timeout, Duration::from_secs(10));
        assert_eq!(config.compress.notice_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_compress_config_custom() {
        let config = test_parse_config("[compress]\nmax_width = 800\nquality = 0.5");
        assert_eq!(config.compress.max_width, 800);
        assert_eq!(config.compress.max_height, 900);
        assert_eq!(config.compress.quality, 0.5);
    }

    #[test]
    fn test_compress_config_validation() {
        let config = CompressConfig {
            max_width: 0,
            quality: 1.5,
            ..CompressConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert_eq!(diag.len(), 2);

        let mut diag = ConfigDiagnostics::new();
        CompressConfig::default().validate(&mut diag);
        assert!(diag.is_empty());
    }
}
