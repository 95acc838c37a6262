//! Speaker styles and the shared font registry.
//!
//! Every styled run of text refers to its font through a [`FontKey`]. The
//! [`FontRegistry`] owns the resolved fonts, so resizing a font is one
//! operation no matter how many runs use it.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    error::LayoutError,
    metrics::{FaceId, FontHandle, FontMetrics},
    text::markup::STRUCTURAL_CHARS,
};

/// Emphasis combination selected by the bold and italic flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emphasis {
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl Emphasis {
    pub const ALL: [Emphasis; 4] = [
        Emphasis::Plain,
        Emphasis::Bold,
        Emphasis::Italic,
        Emphasis::BoldItalic,
    ];

    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => Emphasis::Plain,
            (true, false) => Emphasis::Bold,
            (false, true) => Emphasis::Italic,
            (true, true) => Emphasis::BoldItalic,
        }
    }

    /// Position of this variant in a speaker's font array.
    pub fn index(self) -> usize {
        match self {
            Emphasis::Plain => 0,
            Emphasis::Bold => 1,
            Emphasis::Italic => 2,
            Emphasis::BoldItalic => 3,
        }
    }

    /// File name suffix used when looking for a sibling font file.
    fn file_suffix(self) -> &'static str {
        match self {
            Emphasis::Plain => "-Regular",
            Emphasis::Bold => "-Bold",
            Emphasis::Italic => "-Italic",
            Emphasis::BoldItalic => "-BoldItalic",
        }
    }
}

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);

    /// Parses `#RRGGBB` or `#RRGGBBAA` (case-insensitive).
    pub fn from_hex(hex: &str) -> Result<Self, LayoutError> {
        let invalid = || LayoutError::InvalidStyle(format!("invalid hex color '{hex}'"));

        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.is_ascii() || !(digits.len() == 6 || digits.len() == 8) {
            return Err(invalid());
        }

        let mut rgba = [255u8; 4];
        for (i, channel) in rgba.iter_mut().enumerate().take(digits.len() / 2) {
            *channel = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self(rgba))
    }
}

/// Where a speaker's font comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontSource {
    File(PathBuf),
    /// A face already registered with the metrics provider.
    Face(FaceId),
}

/// One entry of the style table: a speaker name with its four emphasis
/// fonts and paint attributes.
///
/// `relative_height` and `stroke_width` are multiples of the base font
/// height handed to [`FontRegistry::new`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpeakerStyle {
    pub name: String,
    /// Indexed by [`Emphasis::index`].
    pub fonts: [FontSource; 4],
    pub relative_height: f32,
    pub color: Rgba,
    pub stroke_width: f32,
    pub stroke_color: Rgba,
}

impl SpeakerStyle {
    /// Uses `regular` for every emphasis variant.
    pub fn new(name: impl Into<String>, regular: FontSource) -> Self {
        Self {
            name: name.into(),
            fonts: [
                regular.clone(),
                regular.clone(),
                regular.clone(),
                regular,
            ],
            relative_height: 1.0,
            color: Rgba::BLACK,
            stroke_width: 0.0,
            stroke_color: Rgba::BLACK,
        }
    }

    /// Uses `regular` and looks for `-Bold`, `-Italic` and `-BoldItalic`
    /// siblings of it on disk. Missing variants fall back to `regular`.
    pub fn from_font_file(name: impl Into<String>, regular: impl Into<PathBuf>) -> Self {
        let regular = regular.into();
        let mut style = Self::new(name, FontSource::File(regular.clone()));
        for emphasis in [Emphasis::Bold, Emphasis::Italic, Emphasis::BoldItalic] {
            if let Some(path) = find_variant_file(&regular, emphasis) {
                log::debug!(
                    "Using '{}' as {:?} variant of '{}'",
                    path.display(),
                    emphasis,
                    regular.display()
                );
                style.fonts[emphasis.index()] = FontSource::File(path);
            }
        }
        style
    }

    pub fn with_variant(mut self, emphasis: Emphasis, source: FontSource) -> Self {
        self.fonts[emphasis.index()] = source;
        self
    }

    pub fn with_relative_height(mut self, relative_height: f32) -> Self {
        self.relative_height = relative_height;
        self
    }

    pub fn with_color(mut self, color: Rgba) -> Self {
        self.color = color;
        self
    }

    pub fn with_stroke(mut self, width: f32, color: Rgba) -> Self {
        self.stroke_width = width;
        self.stroke_color = color;
        self
    }
}

/// Finds the font file for `emphasis` next to `regular`.
///
/// `Family-Regular.ttf` first tries `Family-Bold.ttf`, then any file under
/// the same directory whose name ends with `-Bold.ttf`.
fn find_variant_file(regular: &Path, emphasis: Emphasis) -> Option<PathBuf> {
    let parent = regular.parent()?;
    let stem = regular.file_stem()?.to_str()?;
    let ext = regular
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("ttf");
    let family = stem.rsplit_once('-').map_or(stem, |(family, _)| family);
    let suffix = emphasis.file_suffix();

    let sibling = parent.join(format!("{family}{suffix}.{ext}"));
    if sibling.is_file() {
        return Some(sibling);
    }

    find_file_with_suffix(parent, &format!("{suffix}.{ext}").to_lowercase())
}

fn find_file_with_suffix(dir: &Path, suffix: &str) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();
    entries.sort();

    let mut subdirs = Vec::new();
    for path in entries {
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.to_lowercase().ends_with(suffix));
        if matches {
            return Some(path);
        }
    }

    subdirs
        .iter()
        .find_map(|subdir| find_file_with_suffix(subdir, suffix))
}

/// Index of a speaker inside a [`FontRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpeakerId(usize);

impl SpeakerId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Stable reference to one resolved font: a speaker and an emphasis.
///
/// The key survives rescaling; only the font it points at changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontKey {
    pub speaker: SpeakerId,
    pub emphasis: Emphasis,
}

/// A font sized for the current layout, plus how to paint it.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedFont {
    handle: FontHandle,
    /// Unrounded height; repeated rescales multiply this, not the rounded one.
    nominal_height: f32,
    space_advance: f32,
    color: Rgba,
    stroke_width: f32,
    stroke_color: Rgba,
}

impl ResolvedFont {
    pub fn handle(&self) -> FontHandle {
        self.handle
    }

    pub fn pixel_height(&self) -> u32 {
        self.handle.pixel_height()
    }

    pub fn space_advance(&self) -> f32 {
        self.space_advance
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn stroke_color(&self) -> Rgba {
        self.stroke_color
    }
}

#[derive(Clone, Debug)]
struct SpeakerFonts {
    name: String,
    fonts: [ResolvedFont; 4],
}

fn pixel_height_for(nominal: f32) -> u32 {
    nominal.round().max(1.0) as u32
}

/// All fonts of a caption, resolved against one base height.
///
/// The first speaker of the table is the speaker in effect before any
/// `[name]` switch.
#[derive(Clone, Debug)]
pub struct FontRegistry {
    speakers: Vec<SpeakerFonts>,
    by_name: HashMap<String, SpeakerId, fxhash::FxBuildHasher>,
    base_height: f32,
    generation: u32,
}

impl FontRegistry {
    /// Resolves every speaker's fonts at `base_height * relative_height`.
    pub fn new<M: FontMetrics>(
        styles: &[SpeakerStyle],
        base_height: u32,
        metrics: &mut M,
    ) -> Result<Self, LayoutError> {
        if styles.is_empty() {
            return Err(LayoutError::InvalidStyle(
                "at least one speaker is required".into(),
            ));
        }
        if base_height == 0 {
            return Err(LayoutError::InvalidStyle(
                "base font height must be greater than 0".into(),
            ));
        }

        let mut speakers = Vec::with_capacity(styles.len());
        let mut by_name = HashMap::with_hasher(fxhash::FxBuildHasher::default());

        for style in styles {
            if style.name.is_empty() {
                return Err(LayoutError::InvalidStyle("speaker name is empty".into()));
            }
            if let Some(ch) = style.name.chars().find(|ch| STRUCTURAL_CHARS.contains(ch)) {
                return Err(LayoutError::InvalidStyle(format!(
                    "special character {ch:?} not allowed in name '{}'",
                    style.name
                )));
            }
            if !(style.relative_height.is_finite() && style.relative_height > 0.0) {
                return Err(LayoutError::InvalidStyle(format!(
                    "relative height of '{}' must be greater than 0, got {}",
                    style.name, style.relative_height
                )));
            }
            if by_name.contains_key(&style.name) {
                return Err(LayoutError::InvalidStyle(format!(
                    "found multiple speakers named '{}'",
                    style.name
                )));
            }

            let nominal_height = base_height as f32 * style.relative_height;
            let stroke_width = base_height as f32 * style.stroke_width.max(0.0);
            let mut resolve = |source: &FontSource| -> Result<ResolvedFont, LayoutError> {
                let pixel_height = pixel_height_for(nominal_height);
                let handle = match source {
                    FontSource::File(path) => metrics.load(path, pixel_height)?,
                    FontSource::Face(face) => FontHandle::new(*face, pixel_height),
                };
                Ok(ResolvedFont {
                    handle,
                    nominal_height,
                    space_advance: metrics.space_advance(handle),
                    color: style.color,
                    stroke_width,
                    stroke_color: style.stroke_color,
                })
            };

            let [plain, bold, italic, bold_italic] = &style.fonts;
            let fonts = [
                resolve(plain)?,
                resolve(bold)?,
                resolve(italic)?,
                resolve(bold_italic)?,
            ];

            by_name.insert(style.name.clone(), SpeakerId(speakers.len()));
            speakers.push(SpeakerFonts {
                name: style.name.clone(),
                fonts,
            });
        }

        log::debug!(
            "Resolved fonts for {} speaker(s) at base height {}",
            speakers.len(),
            base_height
        );

        Ok(Self {
            speakers,
            by_name,
            base_height: base_height as f32,
            generation: 0,
        })
    }

    /// Looks up a speaker by name.
    pub fn speaker(&self, name: &str) -> Option<SpeakerId> {
        self.by_name.get(name).copied()
    }

    /// The speaker in effect at the start of every parse.
    pub fn default_speaker(&self) -> SpeakerId {
        SpeakerId(0)
    }

    /// Speaker names in table order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.speakers.iter().map(|speaker| speaker.name.as_str())
    }

    pub fn speaker_name(&self, speaker: SpeakerId) -> &str {
        &self.speakers[speaker.0].name
    }

    pub fn key(&self, speaker: SpeakerId, emphasis: Emphasis) -> FontKey {
        FontKey { speaker, emphasis }
    }

    /// Returns the resolved font for `key`.
    ///
    /// # Panics
    /// If `key` was produced by a different registry with more speakers.
    pub fn get(&self, key: FontKey) -> &ResolvedFont {
        &self.speakers[key.speaker.0].fonts[key.emphasis.index()]
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    /// Current (unrounded) base font height.
    pub fn base_height(&self) -> f32 {
        self.base_height
    }

    /// Number of rescales applied so far.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Resizes every font by `factor`.
    ///
    /// Each resolved font is resized once and every [`FontKey`] sees the new
    /// size. Text measured before the call must be remeasured afterwards.
    pub fn rescale<M: FontMetrics>(
        &mut self,
        factor: f32,
        metrics: &mut M,
    ) -> Result<(), LayoutError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(LayoutError::Precondition(
                "rescale factor must be positive and finite",
            ));
        }

        for font in self
            .speakers
            .iter_mut()
            .flat_map(|speaker| speaker.fonts.iter_mut())
        {
            font.nominal_height *= factor;
            font.stroke_width *= factor;
            let pixel_height = pixel_height_for(font.nominal_height);
            if pixel_height != font.handle.pixel_height() {
                font.handle = metrics.resize(font.handle, pixel_height);
            }
            font.space_advance = metrics.space_advance(font.handle);
        }

        self.base_height *= factor;
        self.generation += 1;
        log::debug!(
            "Rescaled fonts by {:.4} (generation {})",
            factor,
            self.generation
        );
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::FixedMetrics;

    fn registry(metrics: &mut FixedMetrics) -> FontRegistry {
        let regular = metrics.add_face(0.5, 0.5);
        let bold = metrics.add_face(0.6, 0.5);
        let styles = [
            SpeakerStyle::new("alice", FontSource::Face(regular))
                .with_variant(Emphasis::Bold, FontSource::Face(bold)),
            SpeakerStyle::new("bob", FontSource::Face(regular)).with_relative_height(1.5),
        ];
        FontRegistry::new(&styles, 16, metrics).unwrap()
    }

    #[test]
    fn test_emphasis_from_flags() {
        assert_eq!(Emphasis::from_flags(false, false), Emphasis::Plain);
        assert_eq!(Emphasis::from_flags(true, false), Emphasis::Bold);
        assert_eq!(Emphasis::from_flags(false, true), Emphasis::Italic);
        assert_eq!(Emphasis::from_flags(true, true), Emphasis::BoldItalic);
    }

    #[test]
    fn test_rgba_from_hex() {
        assert_eq!(Rgba::from_hex("#FF0080").unwrap(), Rgba([255, 0, 128, 255]));
        assert_eq!(Rgba::from_hex("#ff008040").unwrap(), Rgba([255, 0, 128, 64]));
        assert!(Rgba::from_hex("FF0080").is_err());
        assert!(Rgba::from_hex("#FF00").is_err());
        assert!(Rgba::from_hex("#GG0080").is_err());
    }

    #[test]
    fn test_registry_resolves_relative_heights() {
        let mut metrics = FixedMetrics::new();
        let fonts = registry(&mut metrics);

        let alice = fonts.speaker("alice").unwrap();
        let bob = fonts.speaker("bob").unwrap();
        assert_eq!(fonts.default_speaker(), alice);
        assert_eq!(fonts.get(fonts.key(alice, Emphasis::Plain)).pixel_height(), 16);
        assert_eq!(fonts.get(fonts.key(bob, Emphasis::Bold)).pixel_height(), 24);
        assert_eq!(fonts.get(fonts.key(alice, Emphasis::Plain)).space_advance(), 8.0);
        assert_ne!(
            fonts.get(fonts.key(alice, Emphasis::Bold)).handle(),
            fonts.get(fonts.key(alice, Emphasis::Plain)).handle()
        );
        assert_eq!(fonts.names().collect::<Vec<_>>(), ["alice", "bob"]);
    }

    #[test]
    fn test_registry_rejects_bad_tables() {
        let mut metrics = FixedMetrics::new();
        let face = metrics.add_face(0.5, 0.5);

        assert!(FontRegistry::new(&[], 16, &mut metrics).is_err());

        let duplicate = [
            SpeakerStyle::new("a", FontSource::Face(face)),
            SpeakerStyle::new("a", FontSource::Face(face)),
        ];
        assert!(FontRegistry::new(&duplicate, 16, &mut metrics).is_err());

        let special = [SpeakerStyle::new("a*b", FontSource::Face(face))];
        assert!(FontRegistry::new(&special, 16, &mut metrics).is_err());

        let flat = [SpeakerStyle::new("a", FontSource::Face(face)).with_relative_height(0.0)];
        assert!(FontRegistry::new(&flat, 16, &mut metrics).is_err());
    }

    #[test]
    fn test_rescale_updates_every_key_and_keeps_nominal() {
        let mut metrics = FixedMetrics::new();
        let mut fonts = registry(&mut metrics);
        let key = fonts.key(fonts.default_speaker(), Emphasis::Plain);

        fonts.rescale(1.5, &mut metrics).unwrap();
        assert_eq!(fonts.get(key).pixel_height(), 24);
        assert_eq!(fonts.get(key).space_advance(), 12.0);
        assert_eq!(fonts.generation(), 1);

        // 16 * 1.5 / 1.5 returns to 16 exactly.
        fonts.rescale(1.0 / 1.5, &mut metrics).unwrap();
        assert_eq!(fonts.get(key).pixel_height(), 16);
        assert!((fonts.base_height() - 16.0).abs() < 1e-3);

        assert!(fonts.rescale(0.0, &mut metrics).is_err());
        assert!(fonts.rescale(f32::NAN, &mut metrics).is_err());
    }

    #[test]
    fn test_file_sources_load_through_metrics() {
        let mut metrics = FixedMetrics::new();
        let styles = [SpeakerStyle::from_font_file(
            "narrator",
            "/nonexistent/fonts/Serif-Regular.ttf",
        )];
        let fonts = FontRegistry::new(&styles, 20, &mut metrics).unwrap();

        // No siblings on disk, so all four variants share one face.
        assert_eq!(metrics.len(), 1);
        let speaker = fonts.default_speaker();
        assert_eq!(
            fonts.get(fonts.key(speaker, Emphasis::BoldItalic)).handle(),
            fonts.get(fonts.key(speaker, Emphasis::Plain)).handle()
        );
    }
}
