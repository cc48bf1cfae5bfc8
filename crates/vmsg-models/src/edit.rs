//! Edit parameter definitions: crop aspect, color filter, text overlay.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Named crop aspect ratios selectable in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CropAspect {
    /// Full frame, no cropping
    #[default]
    Free,
    /// Square (1:1)
    Square,
    /// Instagram portrait (4:5)
    Portrait45,
    /// Story/Reels portrait (9:16)
    Portrait916,
    /// Landscape (16:9)
    Landscape169,
}

impl CropAspect {
    /// All selectable aspects, in picker order.
    pub const ALL: &'static [CropAspect] = &[
        CropAspect::Free,
        CropAspect::Square,
        CropAspect::Portrait45,
        CropAspect::Portrait916,
        CropAspect::Landscape169,
    ];

    /// Target ratio as `(width, height)` terms; `None` for free.
    pub fn ratio(&self) -> Option<(u32, u32)> {
        match self {
            CropAspect::Free => None,
            CropAspect::Square => Some((1, 1)),
            CropAspect::Portrait45 => Some((4, 5)),
            CropAspect::Portrait916 => Some((9, 16)),
            CropAspect::Landscape169 => Some((16, 9)),
        }
    }

    /// Whether selecting this aspect requires a re-encode on export.
    pub fn requires_crop(&self) -> bool {
        !matches!(self, CropAspect::Free)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CropAspect::Free => "free",
            CropAspect::Square => "1:1",
            CropAspect::Portrait45 => "4:5",
            CropAspect::Portrait916 => "9:16",
            CropAspect::Landscape169 => "16:9",
        }
    }
}

impl fmt::Display for CropAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for CropAspect {
    type Err = CropAspectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(CropAspect::Free),
            "1:1" | "square" => Ok(CropAspect::Square),
            "4:5" => Ok(CropAspect::Portrait45),
            "9:16" => Ok(CropAspect::Portrait916),
            "16:9" => Ok(CropAspect::Landscape169),
            _ => Err(CropAspectParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown crop aspect: {0}")]
pub struct CropAspectParseError(String);

/// Named color filters applied as a translucent tint over the frame.
///
/// The same tint is rendered over the live camera feed and the recorded
/// preview so the user sees the identical treatment in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorFilter {
    /// No tint
    #[default]
    None,
    /// Warm amber tint
    Warm,
    /// Cool blue tint
    Cool,
    /// Desaturated sepia tint
    Sepia,
    /// Soft rose tint
    Rose,
    /// Dimmed monochrome tint
    Mono,
}

impl ColorFilter {
    pub const ALL: &'static [ColorFilter] = &[
        ColorFilter::None,
        ColorFilter::Warm,
        ColorFilter::Cool,
        ColorFilter::Sepia,
        ColorFilter::Rose,
        ColorFilter::Mono,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorFilter::None => "none",
            ColorFilter::Warm => "warm",
            ColorFilter::Cool => "cool",
            ColorFilter::Sepia => "sepia",
            ColorFilter::Rose => "rose",
            ColorFilter::Mono => "mono",
        }
    }
}

impl fmt::Display for ColorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vertical anchor for the text overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Light-on-dark or dark-on-light text treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlayTone {
    #[default]
    Light,
    Dark,
}

/// Text overlay size steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlaySize {
    S,
    #[default]
    M,
    L,
}

/// A text overlay shown during preview.
///
/// Preview-only decoration: the export pipeline addresses crop and trim
/// only. The placement tables in [`crate::render`] stay usable for a
/// future burned-in variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TextOverlay {
    /// Overlay text content
    pub content: String,
    /// Vertical anchor
    #[serde(default)]
    pub position: OverlayPosition,
    /// Color treatment
    #[serde(default)]
    pub tone: OverlayTone,
    /// Size step
    #[serde(default)]
    pub size: OverlaySize,
}

impl TextOverlay {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            position: OverlayPosition::default(),
            tone: OverlayTone::default(),
            size: OverlaySize::default(),
        }
    }
}
