//! Output file formats.

use crate::error::{RenderError, RenderResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Image or document format for `save`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Scalable vector graphics.
    Svg,
    /// Encapsulated PostScript.
    Eps,
    /// PostScript.
    Ps,
    /// PDF.
    Pdf,
    /// LaTeX / PGF.
    Tex,
    /// PNG raster.
    Png,
    /// JPEG raster.
    Jpg,
}

impl ImageFormat {
    /// Every format, in declaration order.
    pub const ALL: [Self; 7] = [Self::Svg, Self::Eps, Self::Ps, Self::Pdf, Self::Tex, Self::Png, Self::Jpg];

    /// Canonical file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Eps => "eps",
            Self::Ps => "ps",
            Self::Pdf => "pdf",
            Self::Tex => "tex",
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }

    /// Vector (resolution independent) format.
    #[must_use]
    pub const fn is_vector(self) -> bool {
        !matches!(self, Self::Png | Self::Jpg)
    }

    /// Parses an extension, case-insensitively. `jpeg` is accepted.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if ext == "jpeg" {
            return Some(Self::Jpg);
        }
        Self::ALL.into_iter().find(|format| format.extension() == ext)
    }

    /// Format from a file name's extension.
    ///
    /// # Errors
    ///
    /// [`RenderError::UnsupportedFormat`] for a missing or unknown extension.
    pub fn from_path(path: &Path) -> RenderResult<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .ok_or_else(|| RenderError::UnsupportedFormat(path.display().to_string()))
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
