//! Auto-fit heuristics: the initial wrap width and the final rescale that
//! brings the text to the artwork's height.

use crate::{
    error::LayoutError,
    metrics::FontMetrics,
    style::FontRegistry,
    text::{TextBox, Word},
};

/// Hard ceiling on the fitted text height, in pixels.
pub const MAX_TEXT_HEIGHT: f32 = 3000.0;

// Linear fit of characters per line against total characters, measured on
// existing two-column captions.
const CHARS_PER_LINE_SLOPE: f64 = 0.00449057;
const CHARS_PER_LINE_INTERCEPT: f64 = 46.35;
/// Single-column captions run narrower for the same amount of text.
const SINGLE_COLUMN_CHAR_DIVISOR: f64 = 1.25;

/// Whether the text is laid out in one column or split into two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnMode {
    Single,
    Split,
}

/// Estimates a wrap width in pixels before any line has been built.
///
/// Returns 0 when the words contain no characters.
pub fn estimate_width(base_height: u32, words: &[Word], columns: ColumnMode) -> f32 {
    let char_count: usize = words.iter().map(Word::char_count).sum();
    if char_count == 0 {
        log::warn!("Estimating wrap width for text without characters");
        return 0.0;
    }
    let total_length: f64 = words.iter().map(|word| word.length() as f64).sum();
    let average_char_length = total_length / char_count as f64;

    let mut effective_chars = char_count as f64;
    if columns == ColumnMode::Single {
        effective_chars /= SINGLE_COLUMN_CHAR_DIVISOR;
    }
    let chars_per_line = CHARS_PER_LINE_SLOPE * effective_chars + CHARS_PER_LINE_INTERCEPT;
    let width = (chars_per_line * average_char_length) as f32;

    log::debug!(
        "Estimated wrap width {:.1}px ({:.1} chars per line, {:.2}x base height)",
        width,
        chars_per_line,
        width / base_height.max(1) as f32
    );
    width
}

/// Height constraints for [`reconcile`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitConfig {
    /// Height of the companion artwork, if there is one.
    pub artwork_height: Option<f32>,
    /// Forces the text to this height, ignoring the artwork.
    pub explicit_height: Option<f32>,
    /// Upper bound on the target height.
    pub max_height: f32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            artwork_height: None,
            explicit_height: None,
            max_height: MAX_TEXT_HEIGHT,
        }
    }
}

/// Result of [`reconcile`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitOutcome {
    /// Factor applied to the fonts and every box.
    pub scale: f32,
    /// Height the text was scaled towards.
    pub target_height: f32,
    /// Tallest box after rescaling; the authoritative text height.
    pub text_height: f32,
    /// Factor that brings the artwork to `text_height`.
    pub artwork_scale: Option<f32>,
}

impl FitOutcome {
    /// Artwork size after applying `artwork_scale`, truncated to whole
    /// pixels. Returns the input unchanged without a scale.
    pub fn scaled_artwork_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self.artwork_scale {
            Some(scale) => (
                (width as f32 * scale) as u32,
                (height as f32 * scale) as u32,
            ),
            None => (width, height),
        }
    }
}

/// Rescales the shared fonts once, then every box against them.
pub fn rescale_all<M: FontMetrics>(
    boxes: &mut [TextBox],
    fonts: &mut FontRegistry,
    factor: f32,
    metrics: &mut M,
) -> Result<(), LayoutError> {
    fonts.rescale(factor, metrics)?;
    for text_box in boxes.iter_mut() {
        text_box.rescale(factor, fonts, metrics)?;
    }
    Ok(())
}

fn tallest(boxes: &[TextBox]) -> f32 {
    boxes.iter().map(TextBox::height).fold(0.0, f32::max)
}

/// Scales all boxes together so the tallest one matches the target height.
///
/// The target is `explicit_height` when given, otherwise the taller of the
/// text and the artwork, capped at `max_height`. Font heights are whole
/// pixels, so the text rarely lands exactly on the target; the height
/// measured afterwards is returned and the artwork scale is derived from it.
pub fn reconcile<M: FontMetrics>(
    boxes: &mut [TextBox],
    fonts: &mut FontRegistry,
    metrics: &mut M,
    config: &FitConfig,
) -> Result<FitOutcome, LayoutError> {
    if boxes.is_empty() {
        return Err(LayoutError::Precondition("reconcile needs at least one text box"));
    }
    let measured = tallest(boxes);
    if measured <= 0.0 {
        return Err(LayoutError::Precondition("cannot fit text boxes with zero height"));
    }

    let mut target = match (config.explicit_height, config.artwork_height) {
        (Some(explicit), _) => explicit,
        (None, Some(artwork)) => measured.max(artwork),
        (None, None) => measured,
    };
    if target > config.max_height {
        log::warn!(
            "Target height {:.0}px exceeds the {:.0}px limit, clamping",
            target,
            config.max_height
        );
        target = config.max_height;
    }
    if !(target.is_finite() && target > 0.0) {
        return Err(LayoutError::Precondition("target height must be positive"));
    }

    let scale = target / measured;
    rescale_all(boxes, fonts, scale, metrics)?;
    let text_height = tallest(boxes);

    let artwork_scale = config
        .artwork_height
        .filter(|height| *height > 0.0)
        .map(|height| text_height / height);

    log::info!(
        "Fitted text from {:.1}px to {:.1}px (target {:.1}px, scale {:.4})",
        measured,
        text_height,
        target,
        scale
    );

    Ok(FitOutcome {
        scale,
        target_height: target,
        text_height,
        artwork_scale,
    })
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::FixedMetrics,
        style::{FontSource, SpeakerStyle},
        text::{TextBoxParams, parse, wrap},
    };

    fn setup(text: &str) -> (FixedMetrics, FontRegistry, Vec<Word>) {
        let mut metrics = FixedMetrics::new();
        let face = metrics.add_face(0.5, 0.5);
        let styles = [SpeakerStyle::new("a", FontSource::Face(face))];
        let fonts = FontRegistry::new(&styles, 16, &mut metrics).unwrap();
        let words = parse(text, &fonts, &mut metrics).unwrap();
        (metrics, fonts, words)
    }

    fn boxes(text: &str) -> (FixedMetrics, FontRegistry, Vec<TextBox>) {
        let (mut metrics, fonts, words) = setup(text);
        let lines = wrap(&words, 200.0, &fonts, &mut metrics);
        let params = TextBoxParams::relative(16, 0.25, 1.0);
        (metrics, fonts, vec![TextBox::new(lines, params)])
    }

    #[test]
    fn test_estimate_width_single_column() {
        let (_, _, words) = setup("abcd efgh");
        // 8 chars at 8px each.
        let chars = 8.0 / 1.25;
        let expected = (0.00449057 * chars + 46.35) * 8.0;
        let width = estimate_width(16, &words, ColumnMode::Single);
        assert!((width as f64 - expected).abs() < 1e-3);
    }

    #[test]
    fn test_estimate_width_split_is_wider() {
        let text = "word ".repeat(400);
        let (_, _, words) = setup(&text);
        let single = estimate_width(16, &words, ColumnMode::Single);
        let split = estimate_width(16, &words, ColumnMode::Split);
        assert!(split > single);

        let expected = (0.00449057 * 1600.0 + 46.35) * 8.0;
        assert!((split as f64 - expected).abs() < 1e-2);
    }

    #[test]
    fn test_estimate_width_without_text() {
        let (_, _, words) = setup("\n\n");
        assert_eq!(estimate_width(16, &words, ColumnMode::Split), 0.0);
    }

    #[test]
    fn test_reconcile_grows_to_artwork() {
        let (mut metrics, mut fonts, mut boxes) = boxes("one two\nthree\n\nfour");
        let measured = boxes[0].height();
        let config = FitConfig {
            artwork_height: Some(measured * 3.0),
            ..FitConfig::default()
        };

        let outcome = reconcile(&mut boxes, &mut fonts, &mut metrics, &config).unwrap();
        assert!((outcome.scale - 3.0).abs() < 1e-4);
        assert!((outcome.text_height - measured * 3.0).abs() <= boxes[0].line_count() as f32);
        assert_eq!(outcome.text_height, boxes[0].height());

        let artwork_scale = outcome.artwork_scale.unwrap();
        assert!((artwork_scale * measured * 3.0 - outcome.text_height).abs() < 1e-3);
    }

    #[test]
    fn test_reconcile_explicit_height_and_clamp() {
        let (mut metrics, mut fonts, mut boxes) = boxes("one two\nthree");
        let config = FitConfig {
            explicit_height: Some(250.0),
            artwork_height: Some(900.0),
            ..FitConfig::default()
        };
        let outcome = reconcile(&mut boxes, &mut fonts, &mut metrics, &config).unwrap();
        assert_eq!(outcome.target_height, 250.0);
        assert!((outcome.text_height - 250.0).abs() <= 2.0);

        let config = FitConfig {
            artwork_height: Some(10_000.0),
            ..FitConfig::default()
        };
        let outcome = reconcile(&mut boxes, &mut fonts, &mut metrics, &config).unwrap();
        assert_eq!(outcome.target_height, MAX_TEXT_HEIGHT);
        assert!(outcome.text_height > 0.0);
    }

    #[test]
    fn test_reconcile_without_artwork_keeps_size() {
        let (mut metrics, mut fonts, mut boxes) = boxes("one two\nthree");
        let before = (boxes[0].width(), boxes[0].height());
        let outcome =
            reconcile(&mut boxes, &mut fonts, &mut metrics, &FitConfig::default()).unwrap();
        assert_eq!(outcome.scale, 1.0);
        assert_eq!(outcome.artwork_scale, None);
        assert_eq!((boxes[0].width(), boxes[0].height()), before);
    }

    #[test]
    fn test_reconcile_uses_tallest_box() {
        let (mut metrics, mut fonts, words) = setup("a\nb\nc\n\nd");
        let lines = wrap(&words, 200.0, &fonts, &mut metrics);
        let params = TextBoxParams::relative(16, 0.0, 0.0);
        let (left, right) = TextBox::new(lines, params).split().unwrap();
        let mut boxes = vec![left, right];
        assert_eq!(boxes[0].height(), 48.0);
        assert_eq!(boxes[1].height(), 16.0);

        let config = FitConfig {
            explicit_height: Some(96.0),
            ..FitConfig::default()
        };
        let outcome = reconcile(&mut boxes, &mut fonts, &mut metrics, &config).unwrap();
        assert_eq!(outcome.scale, 2.0);
        assert_eq!(boxes[0].height(), 96.0);
        assert_eq!(boxes[1].height(), 32.0);
    }

    #[test]
    fn test_reconcile_rejects_misuse() {
        let mut metrics = FixedMetrics::new();
        let face = metrics.add_face(0.5, 0.5);
        let styles = [SpeakerStyle::new("a", FontSource::Face(face))];
        let mut fonts = FontRegistry::new(&styles, 16, &mut metrics).unwrap();

        let config = FitConfig::default();
        assert!(reconcile(&mut [], &mut fonts, &mut metrics, &config).is_err());

        let params = TextBoxParams::relative(16, 0.2, 1.0);
        let mut empty = [TextBox::new(Vec::new(), params)];
        assert!(reconcile(&mut empty, &mut fonts, &mut metrics, &config).is_err());
    }

    #[test]
    fn test_rescale_by_one_is_stable() {
        let (mut metrics, mut fonts, mut boxes) = boxes("[a]lorem *ipsum* dolor\nsit amet");
        let before = (boxes[0].width(), boxes[0].height());
        rescale_all(&mut boxes, &mut fonts, 1.0, &mut metrics).unwrap();
        assert_eq!((boxes[0].width(), boxes[0].height()), before);
    }

    #[test]
    fn test_scaled_artwork_size_truncates() {
        let outcome = FitOutcome {
            scale: 1.0,
            target_height: 100.0,
            text_height: 100.0,
            artwork_scale: Some(0.5),
        };
        assert_eq!(outcome.scaled_artwork_size(301, 201), (150, 100));
    }
}
