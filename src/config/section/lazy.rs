//! `[lazy]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [lazy]
//! selector = "img[data-lazy], source[data-lazy]"
//! media_selector = "iframe[data-lazy], video[data-lazy]"   # src only, no margin
//! root_margin = "50px 0px"      # CSS shorthand, px only
//! threshold = 0.01              # visible fraction that triggers a load
//! transition = "opacity 0.3s ease"
//! preload = true                # inject <link rel="preload"> for data-preload
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::dom::Selector;
use crate::image::lazy::{Margin, ObserverOptions};

/// Deferred loading settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyConfig {
    /// Images handled by the loader.
    pub selector: String,

    /// Embedded media, loaded when actually visible without fading.
    pub media_selector: String,

    /// Growth applied to the viewport before intersection tests.
    pub root_margin: Margin,

    /// Minimum visible fraction, in `[0, 1]`.
    pub threshold: f64,

    /// CSS `transition` applied while an element fades in.
    pub transition: String,

    /// Append `<link rel="preload">` for elements carrying `data-preload`.
    pub preload: bool,
}

impl LazyConfig {
    const SELECTOR: FieldPath = FieldPath::new("lazy.selector");
    const MEDIA_SELECTOR: FieldPath = FieldPath::new("lazy.media_selector");
    const THRESHOLD: FieldPath = FieldPath::new("lazy.threshold");
    const TRANSITION: FieldPath = FieldPath::new("lazy.transition");

    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            root_margin: self.root_margin,
            threshold: self.threshold,
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, selector) in [
            (Self::SELECTOR, &self.selector),
            (Self::MEDIA_SELECTOR, &self.media_selector),
        ] {
            if let Err(e) = Selector::parse(selector) {
                diag.error_with_hint(
                    field,
                    e.to_string(),
                    "use tag, #id, .class and [attr] tests separated by commas",
                );
            }
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            diag.error(Self::THRESHOLD, "must be between 0 and 1");
        }
        if self.transition.trim().is_empty() {
            diag.warn(Self::TRANSITION, "empty, images will appear without fading in");
        }
    }
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            selector: "img[data-lazy], source[data-lazy]".into(),
            media_selector: "iframe[data-lazy], video[data-lazy]".into(),
            root_margin: Margin::vertical(50.0),
            threshold: 0.01,
            transition: "opacity 0.3s ease".into(),
            preload: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_lazy_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.lazy.root_margin, Margin::vertical(50.0));
        assert_eq!(config.lazy.threshold, 0.01);
        assert_eq!(config.lazy.transition, "opacity 0.3s ease");
        assert!(config.lazy.preload);
        assert!(Selector::parse(&config.lazy.selector).is_ok());
        assert!(Selector::parse(&config.lazy.media_selector).is_ok());
    }

    #[test]
    fn test_lazy_config_custom() {
        let config = test_parse_config(
            "[lazy]\nselector = \"img[data-lazy]\"\nroot_margin = \"100px\"\nthreshold = 0.5",
        );
        assert_eq!(config.lazy.selector, "img[data-lazy]");
        assert_eq!(config.lazy.root_margin, Margin::uniform(100.0));
        assert_eq!(config.lazy.observer_options().threshold, 0.5);
    }

    #[test]
    fn test_lazy_config_rejects_bad_margin() {
        let result: Result<crate::config::VitrineConfig, _> =
            toml::from_str("[lazy]\nroot_margin = \"10%\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_lazy_config_validation() {
        let config = LazyConfig {
            selector: "div > img".into(),
            media_selector: "body iframe".into(),
            threshold: 1.5,
            ..LazyConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert_eq!(diag.len(), 3);

        let config = LazyConfig {
            transition: String::new(),
            ..LazyConfig::default()
        };
        let mut diag = ConfigDiagnostics::new();
        config.validate(&mut diag);
        assert!(!diag.has_errors());
        assert_eq!(diag.warnings().len(), 1);
    }
}
