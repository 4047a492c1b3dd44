//! Visualization configuration.
//!
//! ```toml
//! interactive = false
//! view = "xy"
//! single_window = false
//! two_dimensional_renderer = "headless"
//! three_dimensional_renderer = "headless"
//! output_dir = "frames"
//! ```
//!
//! Every key is optional. Setting `FLUXVIEW_BLOCKING=1` in the environment
//! forces `interactive = false` regardless of the file.

use crate::error::{ConfigError, ConfigResult};
use fluxview_objects::Dimension;
use fluxview_render::{RendererRegistry, View, HEADLESS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that forces non-interactive mode.
pub const BLOCKING_ENV: &str = "FLUXVIEW_BLOCKING";

/// Visualization settings shared by every window of a manager.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VizConfig {
    /// Open on-screen windows on `show`.
    pub interactive: bool,
    /// Initial camera view of 3D scenes.
    pub view: View,
    /// Showing a window closes every other registered window.
    pub single_window: bool,
    /// Backend for XY and monitor plots.
    pub two_dimensional_renderer: String,
    /// Backend for meshes, contours, vectors, pathlines and surfaces.
    pub three_dimensional_renderer: String,
    /// Where animations are written.
    pub output_dir: PathBuf,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            interactive: true,
            view: View::Isometric,
            single_window: false,
            two_dimensional_renderer: HEADLESS.to_string(),
            three_dimensional_renderer: HEADLESS.to_string(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl VizConfig {
    /// Parses TOML text and applies the environment override.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed text or unknown keys.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config.with_blocking_flag(std::env::var(BLOCKING_ENV).ok().as_deref()))
    }

    /// Loads a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded visualization config");
        Ok(config)
    }

    /// Applies the value of [`BLOCKING_ENV`]. `"1"` forces non-interactive
    /// mode; anything else leaves the setting alone.
    #[must_use]
    pub fn with_blocking_flag(mut self, flag: Option<&str>) -> Self {
        if flag.map(str::trim) == Some("1") {
            self.interactive = false;
        }
        self
    }

    /// Checks both renderer names against `registry`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownRenderer`] naming the first bad setting.
    pub fn validate(&self, registry: &RendererRegistry) -> ConfigResult<()> {
        for (setting, name) in [
            ("two_dimensional_renderer", &self.two_dimensional_renderer),
            ("three_dimensional_renderer", &self.three_dimensional_renderer),
        ] {
            if !registry.contains(name) {
                return Err(ConfigError::UnknownRenderer {
                    setting,
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Renderer configured for `dimension`.
    #[must_use]
    pub fn renderer_for(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::TwoD => &self.two_dimensional_renderer,
            Dimension::ThreeD => &self.three_dimensional_renderer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config: VizConfig = toml::from_str("").unwrap();
        assert_eq!(config, VizConfig::default());
        assert_eq!(config.renderer_for(Dimension::TwoD), HEADLESS);
    }

    #[test]
    fn test_parse_all_keys() {
        let config: VizConfig = toml::from_str(
            r#"
            interactive = false
            view = "zy"
            single_window = true
            two_dimensional_renderer = "plotter"
            three_dimensional_renderer = "headless"
            output_dir = "frames"
            "#,
        )
        .unwrap();
        assert!(!config.interactive);
        assert_eq!(config.view, View::Zy);
        assert!(config.single_window);
        assert_eq!(config.renderer_for(Dimension::TwoD), "plotter");
        assert_eq!(config.output_dir, PathBuf::from("frames"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(matches!(
            VizConfig::from_toml_str("colour = \"red\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(VizConfig::from_toml_str("view = \"diagonal\"").is_err());
    }

    #[test]
    fn test_blocking_flag() {
        let config = VizConfig::default();
        assert!(config.clone().with_blocking_flag(None).interactive);
        assert!(config.clone().with_blocking_flag(Some("0")).interactive);
        assert!(!config.with_blocking_flag(Some("1")).interactive);
    }

    #[test]
    fn test_validate_renderer_names() {
        let registry = RendererRegistry::new();
        let mut config = VizConfig::default();
        assert!(config.validate(&registry).is_ok());

        config.three_dimensional_renderer = "vtk".to_string();
        assert!(matches!(
            config.validate(&registry),
            Err(ConfigError::UnknownRenderer {
                setting: "three_dimensional_renderer",
                ..
            })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            VizConfig::load(dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
