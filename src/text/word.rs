use crate::{
    metrics::FontMetrics,
    style::{FontKey, FontRegistry},
};

/// A run of literal text rendered in one font.
///
/// `advance` is cached from the metrics provider and goes stale whenever the
/// registry is rescaled; call [`StyledUnit::remeasure`] afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct StyledUnit {
    text: String,
    font: FontKey,
    advance: f32,
}

impl StyledUnit {
    pub fn new<M: FontMetrics>(
        text: impl Into<String>,
        font: FontKey,
        fonts: &FontRegistry,
        metrics: &mut M,
    ) -> Self {
        let text = text.into();
        let advance = metrics.advance_width(fonts.get(font).handle(), &text);
        Self {
            text,
            font,
            advance,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font(&self) -> FontKey {
        self.font
    }

    pub fn advance(&self) -> f32 {
        self.advance
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn remeasure<M: FontMetrics>(&mut self, fonts: &FontRegistry, metrics: &mut M) {
        self.advance = metrics.advance_width(fonts.get(self.font).handle(), &self.text);
    }
}

/// Whitespace-free group of styled units, or a forced line break.
///
/// A break remembers the font that was active when it was written so a blank
/// line can take up as much room as the text around it.
#[derive(Clone, Debug, PartialEq)]
pub enum Word {
    Text(Vec<StyledUnit>),
    Break(FontKey),
}

impl Word {
    pub fn is_break(&self) -> bool {
        matches!(self, Word::Break(_))
    }

    /// Units of a text word; empty for a break.
    pub fn units(&self) -> &[StyledUnit] {
        match self {
            Word::Text(units) => units,
            Word::Break(_) => &[],
        }
    }

    /// Total advance of all units.
    pub fn length(&self) -> f32 {
        self.units().iter().map(StyledUnit::advance).sum()
    }

    /// Tallest font pixel height used by this word.
    pub fn max_height(&self, fonts: &FontRegistry) -> u32 {
        match self {
            Word::Text(units) => units
                .iter()
                .map(|unit| fonts.get(unit.font()).pixel_height())
                .max()
                .unwrap_or(0),
            Word::Break(font) => fonts.get(*font).pixel_height(),
        }
    }

    pub fn leading_font(&self) -> Option<FontKey> {
        self.units().first().map(StyledUnit::font)
    }

    pub fn trailing_font(&self) -> Option<FontKey> {
        self.units().last().map(StyledUnit::font)
    }

    pub fn char_count(&self) -> usize {
        self.units().iter().map(StyledUnit::char_count).sum()
    }

    /// Concatenated unit text.
    pub fn text(&self) -> String {
        self.units().iter().map(StyledUnit::text).collect()
    }

    pub fn remeasure<M: FontMetrics>(&mut self, fonts: &FontRegistry, metrics: &mut M) {
        if let Word::Text(units) = self {
            for unit in units {
                unit.remeasure(fonts, metrics);
            }
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::FixedMetrics,
        style::{Emphasis, FontSource, SpeakerStyle},
    };

    #[test]
    fn test_word_measures_units() {
        let mut metrics = FixedMetrics::new();
        let face = metrics.add_face(0.5, 0.5);
        let styles = [
            SpeakerStyle::new("a", FontSource::Face(face)),
            SpeakerStyle::new("b", FontSource::Face(face)).with_relative_height(2.0),
        ];
        let mut fonts = FontRegistry::new(&styles, 10, &mut metrics).unwrap();
        let a = fonts.key(fonts.speaker("a").unwrap(), Emphasis::Plain);
        let b = fonts.key(fonts.speaker("b").unwrap(), Emphasis::Bold);

        let mut word = Word::Text(vec![
            StyledUnit::new("ab", a, &fonts, &mut metrics),
            StyledUnit::new("c", b, &fonts, &mut metrics),
        ]);
        assert_eq!(word.length(), 20.0);
        assert_eq!(word.max_height(&fonts), 20);
        assert_eq!(word.char_count(), 3);
        assert_eq!(word.text(), "abc");
        assert_eq!(word.leading_font(), Some(a));
        assert_eq!(word.trailing_font(), Some(b));

        fonts.rescale(2.0, &mut metrics).unwrap();
        word.remeasure(&fonts, &mut metrics);
        assert_eq!(word.length(), 40.0);
        assert_eq!(word.max_height(&fonts), 40);
    }

    #[test]
    fn test_break_has_no_units() {
        let mut metrics = FixedMetrics::new();
        let face = metrics.add_face(0.5, 0.5);
        let styles = [SpeakerStyle::new("a", FontSource::Face(face))];
        let fonts = FontRegistry::new(&styles, 12, &mut metrics).unwrap();

        let word = Word::Break(fonts.key(fonts.default_speaker(), Emphasis::Plain));
        assert!(word.is_break());
        assert!(word.units().is_empty());
        assert_eq!(word.length(), 0.0);
        assert_eq!(word.max_height(&fonts), 12);
        assert_eq!(word.trailing_font(), None);
    }
}
