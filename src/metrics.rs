use std::path::{Path, PathBuf};

use crate::error::LayoutError;

/// Identifies a font face registered with a [`FontMetrics`] provider.
///
/// Ids are only meaningful for the provider that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(u32);

impl FaceId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// A face sized to a whole pixel height.
///
/// Handles are plain values; resizing produces a new handle and never
/// touches the face itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontHandle {
    face: FaceId,
    pixel_height: u32,
}

impl FontHandle {
    pub fn new(face: FaceId, pixel_height: u32) -> Self {
        Self { face, pixel_height }
    }

    pub fn face(&self) -> FaceId {
        self.face
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }
}

/// Measures text for the layout engine.
///
/// The layout code never rasterizes anything; it only needs advance widths
/// at a given pixel height. Methods take `&mut self` so implementations can
/// load face data lazily.
pub trait FontMetrics {
    /// Registers the font at `path` and returns a handle at `pixel_height`.
    fn load(&mut self, path: &Path, pixel_height: u32) -> Result<FontHandle, LayoutError>;

    /// Horizontal advance of `text` rendered with `font`, in pixels.
    fn advance_width(&mut self, font: FontHandle, text: &str) -> f32;

    /// Advance of a single space character.
    fn space_advance(&mut self, font: FontHandle) -> f32 {
        self.advance_width(font, " ")
    }

    /// Returns a handle to the same face at a different pixel height.
    fn resize(&mut self, font: FontHandle, pixel_height: u32) -> FontHandle {
        FontHandle::new(font.face(), pixel_height)
    }
}

#[derive(Clone, Debug)]
struct FixedFace {
    path: Option<PathBuf>,
    advance_ratio: f32,
    space_ratio: f32,
}

/// Deterministic metrics where every glyph advances by a fixed fraction of
/// the pixel height.
///
/// Useful for previews without font files and for reproducible layouts in
/// tests. Faces loaded by path get [`FixedMetrics::DEFAULT_RATIO`].
#[derive(Clone, Debug, Default)]
pub struct FixedMetrics {
    faces: Vec<FixedFace>,
}

impl FixedMetrics {
    pub const DEFAULT_RATIO: f32 = 0.5;

    pub fn new() -> Self {
        Self { faces: Vec::new() }
    }

    /// Adds a face whose glyphs advance by `advance_ratio * pixel_height`
    /// and whose space advances by `space_ratio * pixel_height`.
    pub fn add_face(&mut self, advance_ratio: f32, space_ratio: f32) -> FaceId {
        self.faces.push(FixedFace {
            path: None,
            advance_ratio,
            space_ratio,
        });
        FaceId::new((self.faces.len() - 1) as u32)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

impl FontMetrics for FixedMetrics {
    fn load(&mut self, path: &Path, pixel_height: u32) -> Result<FontHandle, LayoutError> {
        let existing = self
            .faces
            .iter()
            .position(|face| face.path.as_deref() == Some(path));

        let index = match existing {
            Some(index) => index,
            None => {
                self.faces.push(FixedFace {
                    path: Some(path.to_path_buf()),
                    advance_ratio: Self::DEFAULT_RATIO,
                    space_ratio: Self::DEFAULT_RATIO,
                });
                self.faces.len() - 1
            }
        };

        Ok(FontHandle::new(FaceId::new(index as u32), pixel_height))
    }

    fn advance_width(&mut self, font: FontHandle, text: &str) -> f32 {
        let Some(face) = self.faces.get(font.face().index()) else {
            log::warn!("Measuring with unknown face {:?}", font.face());
            return 0.0;
        };

        let px = font.pixel_height() as f32;
        text.chars()
            .map(|ch| {
                if ch == ' ' {
                    face.space_ratio * px
                } else {
                    face.advance_ratio * px
                }
            })
            .sum()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_metrics_measures_per_char() {
        let mut metrics = FixedMetrics::new();
        let face = metrics.add_face(0.5, 0.25);
        let font = FontHandle::new(face, 16);

        assert_eq!(metrics.advance_width(font, "Hello"), 40.0);
        assert_eq!(metrics.advance_width(font, "a b"), 20.0);
        assert_eq!(metrics.space_advance(font), 4.0);
    }

    #[test]
    fn test_fixed_metrics_load_reuses_path() {
        let mut metrics = FixedMetrics::new();
        let a = metrics.load(Path::new("fonts/A.ttf"), 12).unwrap();
        let b = metrics.load(Path::new("fonts/A.ttf"), 20).unwrap();
        let c = metrics.load(Path::new("fonts/B.ttf"), 20).unwrap();

        assert_eq!(a.face(), b.face());
        assert_ne!(a.face(), c.face());
        assert_eq!(b.pixel_height(), 20);
        assert_eq!(metrics.len(), 2);
    }

    #[test]
    fn test_resize_keeps_face() {
        let mut metrics = FixedMetrics::new();
        let face = metrics.add_face(0.5, 0.5);
        let font = metrics.resize(FontHandle::new(face, 10), 30);

        assert_eq!(font.face(), face);
        assert_eq!(font.pixel_height(), 30);
        assert_eq!(metrics.advance_width(font, "ab"), 30.0);
    }
}
