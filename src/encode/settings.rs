use crate::{
    foundation::core::{Canvas, GIF_MAX_DIMENSION},
    foundation::error::{GifloomError, GifloomResult},
    render::composite::ChromaKey,
    render::compositor::ComposeOpts,
    render::pipeline::RenderThreading,
    render::raster::Resample,
};

/// Global palette capacity. Serialized as the plain integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum PaletteSize {
    #[default]
    C256,
    C128,
    C64,
    C32,
    C16,
}

impl PaletteSize {
    pub const ALL: [Self; 5] = [Self::C256, Self::C128, Self::C64, Self::C32, Self::C16];

    pub fn colors(self) -> usize {
        match self {
            Self::C256 => 256,
            Self::C128 => 128,
            Self::C64 => 64,
            Self::C32 => 32,
            Self::C16 => 16,
        }
    }
}

impl TryFrom<u16> for PaletteSize {
    type Error = GifloomError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|p| p.colors() == usize::from(value))
            .ok_or_else(|| {
                GifloomError::invalid_input(format!(
                    "palette size must be one of 256, 128, 64, 32, 16; got {value}"
                ))
            })
    }
}

impl From<PaletteSize> for u16 {
    fn from(value: PaletteSize) -> Self {
        value.colors() as u16
    }
}

/// Everything that shapes an exported GIF.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GifSettings {
    /// Final pixel size of the file.
    pub output_size: Canvas,
    /// Compositing resolution; `None` composes directly at `output_size`.
    pub canvas_size: Option<Canvas>,
    /// Netscape loop count; `0` loops forever.
    pub loop_count: u16,
    /// Reserve a transparent palette slot for fully transparent pixels.
    pub transparent_background: bool,
    pub palette_size: PaletteSize,
    /// Straight RGBA that frames are flattened over when transparency is off.
    pub background_rgba: [u8; 4],
    pub chroma_key: Option<ChromaKey>,
    /// Changed-area fraction of the canvas above which a frame is written in full.
    pub diff_threshold: f32,
    pub resample: Resample,
    pub threading: RenderThreading,
}

impl Default for GifSettings {
    fn default() -> Self {
        Self {
            output_size: Canvas {
                width: 256,
                height: 256,
            },
            canvas_size: None,
            loop_count: 0,
            transparent_background: false,
            palette_size: PaletteSize::default(),
            background_rgba: [255, 255, 255, 255],
            chroma_key: None,
            diff_threshold: 0.75,
            resample: Resample::default(),
            threading: RenderThreading::default(),
        }
    }
}

impl GifSettings {
    pub fn with_output_size(mut self, width: u32, height: u32) -> Self {
        self.output_size = Canvas { width, height };
        self
    }

    pub fn validate(&self) -> GifloomResult<()> {
        for (what, size) in [("output", Some(self.output_size)), ("canvas", self.canvas_size)] {
            let Some(size) = size else { continue };
            size.validate()?;
            if size.width > GIF_MAX_DIMENSION || size.height > GIF_MAX_DIMENSION {
                return Err(GifloomError::invalid_input(format!(
                    "{what} size {}x{} exceeds GIF limit {GIF_MAX_DIMENSION}",
                    size.width, size.height
                )));
            }
        }
        if !self.diff_threshold.is_finite() || !(0.0..=1.0).contains(&self.diff_threshold) {
            return Err(GifloomError::invalid_input(format!(
                "diff_threshold must be within [0, 1], got {}",
                self.diff_threshold
            )));
        }
        if let Some(n) = self.threading.threads
            && n == 0
        {
            return Err(GifloomError::invalid_input("threads must be >= 1 when set"));
        }
        Ok(())
    }

    pub fn compose_canvas(&self) -> Canvas {
        self.canvas_size.unwrap_or(self.output_size)
    }

    pub fn compose_opts(&self) -> ComposeOpts {
        ComposeOpts {
            resample: self.resample,
            chroma_key: self.chroma_key,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/settings.rs"]
mod tests;
