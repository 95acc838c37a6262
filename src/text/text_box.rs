use euclid::default::Point2D;

use crate::{
    error::LayoutError,
    metrics::FontMetrics,
    style::{FontKey, FontRegistry, ResolvedFont},
    text::wrap::FormattedLine,
};

/// Horizontal justification of each line inside the box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

/// Spacing parameters of a text box, in absolute pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBoxParams {
    pub base_height: f32,
    /// Added below every line.
    pub line_spacing: f32,
    /// Added on every side of the text.
    pub padding: f32,
}

impl TextBoxParams {
    /// Builds params where spacing and padding are multiples of `base_height`.
    pub fn relative(base_height: u32, line_spacing: f32, padding: f32) -> Self {
        let base = base_height as f32;
        Self {
            base_height: base,
            line_spacing: line_spacing * base,
            padding: padding * base,
        }
    }
}

/// A run ready to be drawn: text, font and baseline origin.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionedRun<'a> {
    pub text: &'a str,
    pub font: FontKey,
    pub resolved: &'a ResolvedFont,
    /// Left end of the baseline. **Y-axis goes down**.
    pub baseline: Point2D<f32>,
}

/// Measured block of wrapped lines.
///
/// Width and height are derived from the lines and recomputed after every
/// mutation, so they are always current when read.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBox {
    lines: Vec<FormattedLine>,
    params: TextBoxParams,
    max_line_length: f32,
    width: f32,
    height: f32,
    average_line_height: f32,
}

impl TextBox {
    pub fn new(lines: Vec<FormattedLine>, params: TextBoxParams) -> Self {
        let mut text_box = Self {
            lines,
            params,
            max_line_length: 0.0,
            width: 0.0,
            height: 0.0,
            average_line_height: 0.0,
        };
        text_box.compute_dimensions();
        text_box
    }

    fn compute_dimensions(&mut self) {
        if self.lines.is_empty() {
            self.max_line_length = 0.0;
            self.width = 0.0;
            self.height = 0.0;
            self.average_line_height = 0.0;
            return;
        }

        let padding = self.params.padding;
        let spacing = self.params.line_spacing;

        self.max_line_length = self
            .lines
            .iter()
            .map(FormattedLine::length)
            .fold(0.0, f32::max);
        self.width = (self.max_line_length + padding * 2.0).ceil();
        self.height = padding * 2.0
            + self
                .lines
                .iter()
                .map(|line| line.height() + spacing)
                .sum::<f32>();

        let total_height: f32 = self.lines.iter().map(FormattedLine::height).sum();
        self.average_line_height = (total_height / self.lines.len() as f32).floor();
    }

    pub fn lines(&self) -> &[FormattedLine] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn params(&self) -> TextBoxParams {
        self.params
    }

    /// Longest line plus padding on both sides, rounded up.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Padding on both sides plus every line's height and spacing.
    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn max_line_length(&self) -> f32 {
        self.max_line_length
    }

    pub fn average_line_height(&self) -> f32 {
        self.average_line_height
    }

    /// Scales spacing, padding and gaps by `factor` and remeasures every
    /// run against `fonts`.
    ///
    /// `fonts` must already be rescaled by the same factor; use
    /// [`crate::fit::rescale_all`] to do both at once.
    pub fn rescale<M: FontMetrics>(
        &mut self,
        factor: f32,
        fonts: &FontRegistry,
        metrics: &mut M,
    ) -> Result<(), LayoutError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(LayoutError::Precondition(
                "rescale factor must be positive and finite",
            ));
        }

        for line in &mut self.lines {
            line.rescale(factor, fonts, metrics);
        }
        self.params.base_height *= factor;
        self.params.line_spacing *= factor;
        self.params.padding *= factor;
        self.compute_dimensions();
        Ok(())
    }

    /// Splits the box into two columns at the blank line closest to the
    /// middle.
    ///
    /// Two cuts are tried: the first blank line at or after the midpoint and
    /// the last blank line before it. The one giving the smaller line-count
    /// difference wins, the forward cut on ties. The blank line itself is
    /// dropped. Without any blank line on one side, that candidate puts
    /// everything into a single column.
    pub fn split(self) -> Result<(TextBox, TextBox), LayoutError> {
        if self.lines.len() < 2 {
            return Err(LayoutError::Precondition(
                "a text box needs at least two lines to be split",
            ));
        }

        let count = self.lines.len();
        let mid = count / 2;

        // (end of left column, start of right column)
        let forward = self.lines[mid..]
            .iter()
            .position(FormattedLine::is_blank)
            .map_or((count, count), |i| (mid + i, mid + i + 1));
        let backward = self.lines[..mid]
            .iter()
            .rposition(FormattedLine::is_blank)
            .map_or((0, 0), |i| (i, i + 1));

        let imbalance = |(left_end, right_start): (usize, usize)| {
            left_end.abs_diff(count - right_start)
        };
        let (left_end, right_start) = if imbalance(forward) <= imbalance(backward) {
            forward
        } else {
            backward
        };

        let mut left = self.lines;
        let right = left.split_off(right_start);
        left.truncate(left_end);

        log::debug!(
            "Split {} line(s) into columns of {} and {}",
            count,
            left.len(),
            right.len()
        );

        Ok((
            TextBox::new(left, self.params),
            TextBox::new(right, self.params),
        ))
    }

    /// Baseline positions of every run, with the box's top-left corner at
    /// `origin`.
    ///
    /// Lines are aligned inside the longest line's length. The first
    /// baseline is raised by a fifth of the average line height so
    /// descenders stay inside the padding.
    pub fn positioned_runs<'a>(
        &'a self,
        fonts: &'a FontRegistry,
        align: HorizontalAlign,
        origin: Point2D<f32>,
    ) -> Vec<PositionedRun<'a>> {
        let padding = self.params.padding;
        let mut runs = Vec::new();
        let mut y = origin.y + padding - (0.2 * self.average_line_height).floor();

        for line in &self.lines {
            y += line.height();
            let offset = match align {
                HorizontalAlign::Left => 0.0,
                HorizontalAlign::Center => (self.max_line_length - line.length()) / 2.0,
                HorizontalAlign::Right => self.max_line_length - line.length(),
            };

            let mut x = origin.x + padding + offset;
            for run in line.runs() {
                runs.push(PositionedRun {
                    text: run.text(),
                    font: run.font(),
                    resolved: fonts.get(run.font()),
                    baseline: Point2D::new(x, y),
                });
                x += run.advance() + run.gap_after();
            }

            y += self.params.line_spacing;
        }

        runs
    }
}
