use crate::{
    metrics::FontMetrics,
    style::{FontKey, FontRegistry},
    text::word::Word,
};

/// Text drawn in one font, followed by an explicit horizontal gap.
///
/// Word boundaries inside one font are kept as literal spaces in `text`;
/// only boundaries between different fonts turn into `gap_after`.
#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    text: String,
    font: FontKey,
    advance: f32,
    gap_after: f32,
}

impl Run {
    fn new<M: FontMetrics>(
        text: String,
        font: FontKey,
        gap_after: f32,
        fonts: &FontRegistry,
        metrics: &mut M,
    ) -> Self {
        let advance = metrics.advance_width(fonts.get(font).handle(), &text);
        Self {
            text,
            font,
            advance,
            gap_after,
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

    pub fn gap_after(&self) -> f32 {
        self.gap_after
    }
}

/// One wrapped line, consolidated into runs.
#[derive(Clone, Debug, PartialEq)]
pub struct FormattedLine {
    runs: Vec<Run>,
    /// Font of the line break that opened this line, if any.
    seed: Option<FontKey>,
    word_count: usize,
    height: f32,
    length: f32,
}

impl FormattedLine {
    /// Builds a line from placed words, each paired with the spacing that
    /// precedes it.
    fn from_words<M: FontMetrics>(
        placed: &[(f32, &Word)],
        seed: Option<FontKey>,
        fonts: &FontRegistry,
        metrics: &mut M,
    ) -> Self {
        let mut runs = Vec::new();
        let mut pending: Option<(String, FontKey)> = None;

        for (spacing, word) in placed {
            for (i, unit) in word.units().iter().enumerate() {
                let word_start = i == 0;
                // The gap between two words belongs to the run before it.
                let gap = if word_start { *spacing } else { 0.0 };
                // A literal space is only exact when the committed spacing is
                // this font's own space advance.
                let merge = pending
                    .as_ref()
                    .is_some_and(|(_, font)| *font == unit.font())
                    && (!word_start || gap == fonts.get(unit.font()).space_advance());

                if merge {
                    if let Some((text, _)) = pending.as_mut() {
                        if word_start && !text.is_empty() {
                            text.push(' ');
                        }
                        text.push_str(unit.text());
                    }
                    continue;
                }

                if let Some((text, font)) = pending.take() {
                    runs.push(Run::new(text, font, gap, fonts, metrics));
                }
                pending = Some((unit.text().to_owned(), unit.font()));
            }
        }

        if let Some((text, font)) = pending
            && !text.is_empty()
        {
            runs.push(Run::new(text, font, 0.0, fonts, metrics));
        }

        let mut line = Self {
            runs,
            seed,
            word_count: placed.len(),
            height: 0.0,
            length: 0.0,
        };
        line.measure(fonts);
        line
    }

    fn measure(&mut self, fonts: &FontRegistry) {
        let seed_height = self
            .seed
            .map(|font| fonts.get(font).pixel_height())
            .unwrap_or(0);
        let run_height = self
            .runs
            .iter()
            .map(|run| fonts.get(run.font).pixel_height())
            .max()
            .unwrap_or(0);

        self.height = seed_height.max(run_height) as f32;
        self.length = self.runs.iter().map(|run| run.advance + run.gap_after).sum();
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Tallest font on the line, or the height of the break that opened it.
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Rendered length including inter-run gaps.
    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    /// A line without text, i.e. a paragraph gap.
    pub fn is_blank(&self) -> bool {
        self.runs.is_empty()
    }

    /// Concatenated run text with gaps rendered as single spaces.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            out.push_str(&run.text);
            if run.gap_after > 0.0 {
                out.push(' ');
            }
        }
        out
    }

    /// Scales gaps by `factor` and remeasures runs against the (already
    /// rescaled) registry.
    pub fn rescale<M: FontMetrics>(&mut self, factor: f32, fonts: &FontRegistry, metrics: &mut M) {
        for run in &mut self.runs {
            run.gap_after *= factor;
            run.advance = metrics.advance_width(fonts.get(run.font).handle(), &run.text);
        }
        self.measure(fonts);
    }
}

/// Spacing between two words: the narrower of the two trailing fonts'
/// space advances, so mixed sizes never collide.
fn inter_word_spacing(previous: &Word, word: &Word, fonts: &FontRegistry) -> f32 {
    match (previous.trailing_font(), word.trailing_font()) {
        (Some(a), Some(b)) => fonts.get(a).space_advance().min(fonts.get(b).space_advance()),
        _ => 0.0,
    }
}

/// Greedy word wrap.
///
/// Words are added to the current line until the next one would push it
/// past `width`. A word that is wider than `width` on its own still gets a
/// line to itself; words are never split. A break word closes the current
/// line even when it is empty, which is how blank lines appear.
pub fn wrap<M: FontMetrics>(
    words: &[Word],
    width: f32,
    fonts: &FontRegistry,
    metrics: &mut M,
) -> Vec<FormattedLine> {
    let mut lines = Vec::new();
    let mut current: Vec<(f32, &Word)> = Vec::new();
    let mut length = 0.0;
    let mut seed: Option<FontKey> = None;

    for word in words {
        if let Word::Break(font) = word {
            lines.push(FormattedLine::from_words(&current, seed, fonts, metrics));
            current.clear();
            length = 0.0;
            seed = Some(*font);
            continue;
        }

        let Some(&(_, previous)) = current.last() else {
            current.push((0.0, word));
            length = word.length();
            continue;
        };

        let spacing = inter_word_spacing(previous, word, fonts);
        let projected = length + spacing + word.length();
        if projected > width {
            lines.push(FormattedLine::from_words(&current, seed, fonts, metrics));
            current.clear();
            seed = None;
            current.push((0.0, word));
            length = word.length();
        } else {
            current.push((spacing, word));
            length = projected;
        }
    }

    if !current.is_empty() {
        lines.push(FormattedLine::from_words(&current, seed, fonts, metrics));
    }

    log::debug!("Wrapped {} word(s) into {} line(s) at {:.1}px", words.len(), lines.len(), width);
    lines
}
