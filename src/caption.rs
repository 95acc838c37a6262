//! The full layout pipeline, from marked-up text to fitted text boxes.

use euclid::default::{Point2D, Size2D};

use crate::{
    compose::{CanvasPlan, TextPlacement, plan_canvas},
    error::LayoutError,
    fit::{ColumnMode, FitConfig, FitOutcome, MAX_TEXT_HEIGHT, estimate_width, reconcile},
    metrics::FontMetrics,
    style::{FontRegistry, SpeakerStyle},
    text::{HorizontalAlign, PositionedRun, TextBox, TextBoxParams, parse, wrap},
};

/// How the final text height is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Sizing {
    /// Grow the text to the artwork's height when the artwork is taller.
    #[default]
    MatchArtwork,
    /// Keep the text at the size the base font height produces and scale
    /// the artwork to it.
    FontHeight,
    /// Scale the text to this many pixels.
    ImageHeight(f32),
}

/// Options for [`layout_caption`].
///
/// Spacing, padding and text width are relative to `base_font_height`.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionConfig {
    pub base_font_height: u32,
    pub sizing: Sizing,
    pub line_spacing: f32,
    pub padding: f32,
    /// Wrap width; estimated from the text when `None`.
    pub text_width: Option<f32>,
    pub placement: TextPlacement,
    pub alignment: HorizontalAlign,
    pub max_height: f32,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            base_font_height: 16,
            sizing: Sizing::MatchArtwork,
            line_spacing: 0.2,
            padding: 1.0,
            text_width: None,
            placement: TextPlacement::Left,
            alignment: HorizontalAlign::Center,
            max_height: MAX_TEXT_HEIGHT,
        }
    }
}

/// Fitted text boxes plus what is needed to draw them.
#[derive(Clone, Debug)]
pub struct CaptionLayout {
    /// Fonts at their final size.
    pub fonts: FontRegistry,
    /// One box, or two for [`TextPlacement::Split`].
    pub boxes: Vec<TextBox>,
    pub placement: TextPlacement,
    pub alignment: HorizontalAlign,
    /// Number of non-break words in the text.
    pub word_count: usize,
    /// Width the text was wrapped at, in pixels of the base font height.
    pub wrap_width: f32,
    /// `wrap_width` relative to the base font height, to two decimals.
    pub text_width: f32,
    pub fit: FitOutcome,
}

impl CaptionLayout {
    /// Plans the caption canvas for artwork of the given original size.
    ///
    /// The artwork is scaled by [`FitOutcome::artwork_scale`] first.
    pub fn canvas(&self, artwork: Size2D<u32>) -> Result<CanvasPlan, LayoutError> {
        let (width, height) = self.fit.scaled_artwork_size(artwork.width, artwork.height);
        plan_canvas(&self.boxes, Size2D::new(width, height), self.placement)
    }

    /// Every run of every box, positioned on `plan`.
    pub fn positioned_runs(&self, plan: &CanvasPlan) -> Vec<PositionedRun<'_>> {
        self.boxes
            .iter()
            .zip(&plan.box_origins)
            .flat_map(|(text_box, origin)| {
                let origin = Point2D::new(origin.x as f32, origin.y as f32);
                text_box.positioned_runs(&self.fonts, self.alignment, origin)
            })
            .collect()
    }
}

/// Lays out a caption: resolves the speakers, parses and wraps the text,
/// optionally splits it into two columns and fits it to the artwork.
///
/// `artwork_height` is the artwork's original height, if there is artwork.
pub fn layout_caption<M: FontMetrics>(
    text: &str,
    speakers: &[SpeakerStyle],
    config: &CaptionConfig,
    artwork_height: Option<u32>,
    metrics: &mut M,
) -> Result<CaptionLayout, LayoutError> {
    let base = config.base_font_height;
    let mut fonts = FontRegistry::new(speakers, base, metrics)?;

    let words = parse(text, &fonts, metrics)?;
    let word_count = words.iter().filter(|word| !word.is_break()).count();
    log::debug!("Parsed {} word(s)", word_count);

    let wrap_width = match config.text_width {
        Some(relative) if relative > 0.0 => relative * base as f32,
        Some(_) => {
            return Err(LayoutError::Precondition("text width must be positive"));
        }
        None => {
            let columns = match config.placement {
                TextPlacement::Split => ColumnMode::Split,
                TextPlacement::Left | TextPlacement::Right => ColumnMode::Single,
            };
            estimate_width(base, &words, columns)
        }
    };
    let text_width = (wrap_width / base as f32 * 100.0).round() / 100.0;

    let lines = wrap(&words, wrap_width, &fonts, metrics);
    let params = TextBoxParams::relative(base, config.line_spacing, config.padding);
    let text_box = TextBox::new(lines, params);

    let mut boxes = match config.placement {
        TextPlacement::Split if text_box.line_count() < 2 => {
            log::debug!("Too few lines to split, keeping one column");
            vec![text_box, TextBox::new(Vec::new(), params)]
        }
        TextPlacement::Split => {
            let (left, right) = text_box.split()?;
            log::debug!(
                "Line count: {} left, {} right",
                left.line_count(),
                right.line_count()
            );
            vec![left, right]
        }
        TextPlacement::Left | TextPlacement::Right => {
            log::debug!("Line count: {}", text_box.line_count());
            vec![text_box]
        }
    };

    let explicit_height = match config.sizing {
        Sizing::MatchArtwork => None,
        Sizing::FontHeight => Some(boxes.iter().map(TextBox::height).fold(0.0, f32::max)),
        Sizing::ImageHeight(height) => Some(height),
    };
    let fit_config = FitConfig {
        artwork_height: artwork_height.map(|height| height as f32),
        explicit_height,
        max_height: config.max_height,
    };
    let fit = reconcile(&mut boxes, &mut fonts, metrics, &fit_config)?;

    Ok(CaptionLayout {
        fonts,
        boxes,
        placement: config.placement,
        alignment: config.alignment,
        word_count,
        wrap_width,
        text_width,
        fit,
    })
}
