//! Pure render model shared by the live camera view and recorded preview.
//!
//! Everything here is a side-effect-free mapping from edit selections to
//! render parameters. The live feed and the playback preview both
//! consume these functions, and the transcode engine derives its crop
//! expression from the same [`crop_rect`] geometry, so the exported
//! file is bit-accurate to what the user previewed.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::edit::{ColorFilter, OverlayPosition, OverlaySize};

/// An RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A pixel-space rectangle within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CropRect {
    /// X coordinate of the top-left corner
    pub x: f64,
    /// Y coordinate of the top-left corner
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Full-frame rect.
    pub fn full(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Check the rect stays within the frame (small epsilon for float
    /// precision).
    pub fn fits_within(&self, frame_width: f64, frame_height: f64) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.x + self.width <= frame_width + 0.001
            && self.y + self.height <= frame_height + 0.001
    }
}

/// Translucent tint for a named color filter. `None` is fully
/// transparent so the untinted frame shows through.
pub fn overlay_color(filter: ColorFilter) -> Rgba {
    match filter {
        ColorFilter::None => Rgba::TRANSPARENT,
        ColorFilter::Warm => Rgba::new(255, 166, 77, 46),
        ColorFilter::Cool => Rgba::new(77, 144, 255, 46),
        ColorFilter::Sepia => Rgba::new(112, 66, 20, 64),
        ColorFilter::Rose => Rgba::new(255, 128, 171, 46),
        ColorFilter::Mono => Rgba::new(40, 40, 40, 77),
    }
}

/// Centered crop rectangle for a target aspect within a frame.
///
/// `Free` returns the full frame. For a target ratio `a:b`, the frame
/// dimension that would overflow the ratio is trimmed: a relatively
/// wider frame keeps its height (`width = height * a/b`), a relatively
/// taller frame keeps its width (`height = width * b/a`). The rect is
/// centered in both axes.
pub fn crop_rect(aspect: crate::edit::CropAspect, frame_width: f64, frame_height: f64) -> CropRect {
    let Some((a, b)) = aspect.ratio() else {
        return CropRect::full(frame_width, frame_height);
    };
    let target = a as f64 / b as f64;
    let frame = frame_width / frame_height;

    let (width, height) = if frame > target {
        // Frame is relatively wider: height is the limiting dimension
        (frame_height * target, frame_height)
    } else {
        (frame_width, frame_width / target)
    };

    CropRect::new(
        (frame_width - width) / 2.0,
        (frame_height - height) / 2.0,
        width,
        height,
    )
}

/// Resolved text overlay placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextPlacement {
    /// Vertical offset from frame center in points (negative = up)
    pub y_offset: f32,
    /// Font size in points
    pub font_size: f32,
}

/// Map the three vertical anchors and three size steps to fixed render
/// values. Purely presentational; also usable to burn the overlay into
/// the export if a target format ever requires it.
pub fn text_placement(position: OverlayPosition, size: OverlaySize) -> TextPlacement {
    let y_offset = match position {
        OverlayPosition::Top => -280.0,
        OverlayPosition::Center => 0.0,
        OverlayPosition::Bottom => 280.0,
    };
    let font_size = match size {
        OverlaySize::S => 18.0,
        OverlaySize::M => 24.0,
        OverlaySize::L => 32.0,
    };
    TextPlacement { y_offset, font_size }
}
