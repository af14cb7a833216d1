use posterm_layer::{Align, DrawBackend, LayerError, Region, TextRun};
use std::collections::HashSet;

/// One call made on a [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCall {
    SetClip(Region),
    FillRect {
        region: Region,
        color: u8,
    },
    OutlineRect {
        region: Region,
        color: u8,
        thickness: u8,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        font: u8,
        color: u8,
        align: Align,
    },
    Frame {
        region: Region,
        width: u8,
        style: u8,
    },
    Texture {
        region: Region,
        texture: u8,
    },
    Shadow {
        region: Region,
        size: u8,
        shape: u8,
    },
    Image {
        region: Region,
        name: String,
    },
    Present(Region),
    Cursor(u8),
    Bell(u8),
    Iconify,
}

/// Backend that records every call instead of drawing.
///
/// Textures and fonts below the configured counts and images added with
/// [`with_image`](Self::with_image) resolve; anything else fails the way a
/// real backend reports a missing resource, and nothing is recorded.
#[derive(Debug, Clone)]
pub struct RecordingBackend {
    width: i32,
    height: i32,
    calls: Vec<DrawCall>,
    textures: u8,
    fonts: u8,
    images: HashSet<String>,
}

impl RecordingBackend {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
            textures: 16,
            fonts: 4,
            images: HashSet::new(),
        }
    }

    pub fn with_textures(mut self, count: u8) -> Self {
        self.textures = count;
        self
    }

    pub fn with_fonts(mut self, count: u8) -> Self {
        self.fonts = count;
        self
    }

    pub fn with_image(mut self, name: &str) -> Self {
        self.images.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Strings drawn, in order
    pub fn texts(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Areas presented, in order
    pub fn presents(&self) -> Vec<Region> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Present(r) => Some(*r),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Image { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&DrawCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl DrawBackend for RecordingBackend {
    fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn set_clip(&mut self, clip: Region) {
        self.calls.push(DrawCall::SetClip(clip));
    }

    fn fill_rect(&mut self, region: Region, color: u8) {
        self.calls.push(DrawCall::FillRect { region, color });
    }

    fn outline_rect(&mut self, region: Region, color: u8, thickness: u8) {
        self.calls.push(DrawCall::OutlineRect {
            region,
            color,
            thickness,
        });
    }

    fn draw_text(&mut self, run: &TextRun<'_>) -> Result<(), LayerError> {
        if run.font >= self.fonts {
            return Err(LayerError::UnknownFont(run.font));
        }
        self.calls.push(DrawCall::Text {
            x: run.x,
            y: run.y,
            text: run.text.to_string(),
            font: run.font,
            color: run.color,
            align: run.align,
        });
        Ok(())
    }

    fn draw_frame(&mut self, region: Region, width: u8, style: u8) {
        self.calls.push(DrawCall::Frame {
            region,
            width,
            style,
        });
    }

    fn fill_texture(&mut self, region: Region, texture: u8) -> Result<(), LayerError> {
        if texture >= self.textures {
            return Err(LayerError::UnknownTexture(texture));
        }
        self.calls.push(DrawCall::Texture { region, texture });
        Ok(())
    }

    fn draw_shadow(&mut self, region: Region, size: u8, shape: u8) {
        self.calls.push(DrawCall::Shadow {
            region,
            size,
            shape,
        });
    }

    fn draw_image(&mut self, region: Region, name: &str) -> Result<(), LayerError> {
        if !self.images.contains(name) {
            return Err(LayerError::MissingImage(name.to_string()));
        }
        self.calls.push(DrawCall::Image {
            region,
            name: name.to_string(),
        });
        Ok(())
    }

    fn present(&mut self, region: Region) {
        self.calls.push(DrawCall::Present(region));
    }

    fn set_cursor(&mut self, shape: u8) {
        self.calls.push(DrawCall::Cursor(shape));
    }

    fn bell(&mut self, volume: u8) {
        self.calls.push(DrawCall::Bell(volume));
    }

    fn iconify(&mut self) {
        self.calls.push(DrawCall::Iconify);
    }
}
