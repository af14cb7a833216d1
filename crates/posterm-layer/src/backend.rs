//! Drawing backend boundary
//!
//! The compositor never touches pixels. Everything it paints goes through
//! [`DrawBackend`] in screen coordinates; [`Painter`] wraps a backend with a
//! layer origin and clip so layers and their objects can draw in their own
//! coordinates.

use crate::region::Region;
use crate::LayerError;
use tracing::warn;

/// Fill colour used when a texture cannot be resolved
pub const DEFAULT_FILL: u8 = 0;
/// Font used when the requested one cannot be resolved
pub const DEFAULT_FONT: u8 = 0;

/// Horizontal anchoring of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// One line of text to draw.
///
/// `x` is the left edge, centre or right edge depending on `align`; `y` is
/// the top of the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun<'a> {
    pub x: i32,
    pub y: i32,
    pub text: &'a str,
    pub font: u8,
    pub color: u8,
    pub align: Align,
    /// Text beyond this width is cut off
    pub max_width: Option<i32>,
}

/// Rendering surface the compositor draws onto.
///
/// Coordinates are screen pixels. Colours, textures, fonts and frame styles
/// are palette indices whose meaning belongs to the backend. Operations that
/// depend on loaded resources report a [`LayerError`] when the resource is
/// missing and draw nothing; callers fall back to defaults.
pub trait DrawBackend {
    /// Screen size in pixels
    fn size(&self) -> (i32, i32);

    /// Restrict subsequent drawing to `clip`
    fn set_clip(&mut self, clip: Region);

    fn fill_rect(&mut self, region: Region, color: u8);

    fn outline_rect(&mut self, region: Region, color: u8, thickness: u8);

    fn draw_text(&mut self, run: &TextRun<'_>) -> Result<(), LayerError>;

    /// Bevelled border `width` pixels wide
    fn draw_frame(&mut self, region: Region, width: u8, style: u8);

    fn fill_texture(&mut self, region: Region, texture: u8) -> Result<(), LayerError>;

    fn draw_shadow(&mut self, region: Region, size: u8, shape: u8);

    /// Scale the named image into `region`
    fn draw_image(&mut self, region: Region, name: &str) -> Result<(), LayerError>;

    /// Make everything drawn inside `region` visible
    fn present(&mut self, region: Region);

    fn set_cursor(&mut self, shape: u8);

    fn bell(&mut self, volume: u8);

    fn iconify(&mut self);
}

/// Backend view translated to a layer origin and clipped to a screen area
pub struct Painter<'a> {
    backend: &'a mut dyn DrawBackend,
    origin_x: i32,
    origin_y: i32,
    bounds: Region,
}

impl<'a> Painter<'a> {
    /// Painter whose `(0, 0)` is `(origin_x, origin_y)` on screen and whose
    /// drawing never leaves `bounds` (screen coordinates)
    pub fn new(
        backend: &'a mut dyn DrawBackend,
        origin_x: i32,
        origin_y: i32,
        bounds: Region,
    ) -> Self {
        backend.set_clip(bounds);
        Self {
            backend,
            origin_x,
            origin_y,
            bounds,
        }
    }

    /// Screen area this painter may touch
    pub fn bounds(&self) -> Region {
        self.bounds
    }

    /// Further restrict drawing to `clip` (painter coordinates), or lift the
    /// restriction back to the painter bounds with `None`
    pub fn set_clip(&mut self, clip: Option<Region>) {
        let clip = match clip {
            Some(c) => self.to_screen(c).intersect(&self.bounds),
            None => self.bounds,
        };
        self.backend.set_clip(clip);
    }

    fn to_screen(&self, region: Region) -> Region {
        region.translate(self.origin_x, self.origin_y)
    }

    pub fn fill_rect(&mut self, region: Region, color: u8) {
        let r = self.to_screen(region);
        self.backend.fill_rect(r, color);
    }

    pub fn outline_rect(&mut self, region: Region, color: u8, thickness: u8) {
        let r = self.to_screen(region);
        self.backend.outline_rect(r, color, thickness);
    }

    pub fn hline(&mut self, x: i32, y: i32, len: i32, thickness: u8, color: u8) {
        self.fill_rect(Region::new(x, y, len, i32::from(thickness.max(1))), color);
    }

    pub fn vline(&mut self, x: i32, y: i32, len: i32, thickness: u8, color: u8) {
        self.fill_rect(Region::new(x, y, i32::from(thickness.max(1)), len), color);
    }

    /// Draw text, retrying with [`DEFAULT_FONT`] when the font is unknown
    pub fn text(&mut self, run: &TextRun<'_>) {
        let run = TextRun {
            x: run.x + self.origin_x,
            y: run.y + self.origin_y,
            ..run.clone()
        };
        if let Err(e) = self.backend.draw_text(&run) {
            warn!("{}, using default font", e);
            let fallback = TextRun {
                font: DEFAULT_FONT,
                ..run
            };
            if let Err(e) = self.backend.draw_text(&fallback) {
                warn!("Text dropped: {}", e);
            }
        }
    }

    pub fn frame(&mut self, region: Region, width: u8, style: u8) {
        let r = self.to_screen(region);
        self.backend.draw_frame(r, width, style);
    }

    /// Fill with a texture, or [`DEFAULT_FILL`] when it is unknown
    pub fn texture(&mut self, region: Region, texture: u8) {
        let r = self.to_screen(region);
        if let Err(e) = self.backend.fill_texture(r, texture) {
            warn!("{}, using solid fill", e);
            self.backend.fill_rect(r, DEFAULT_FILL);
        }
    }

    pub fn shadow(&mut self, region: Region, size: u8, shape: u8) {
        let r = self.to_screen(region);
        self.backend.draw_shadow(r, size, shape);
    }

    /// Draw an image, blanking its area when it cannot be loaded
    pub fn image(&mut self, region: Region, name: &str) {
        let r = self.to_screen(region);
        if let Err(e) = self.backend.draw_image(r, name) {
            warn!("{}, blanking instead", e);
            self.backend.fill_rect(r, DEFAULT_FILL);
        }
    }
}
