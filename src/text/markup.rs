//! Caption markup.
//!
//! ```text
//! [alice] Hello *bold* _italic_ *_both_*
//! [bob] Escapes: \[ \] \* \_
//! ```
//!
//! `[name]` switches speaker (spaces, `\n` and `\r` right after it are
//! skipped), `*` and `_` toggle bold and italic, a space ends a word and a
//! newline ends a word and forces a line break. `\r\n` counts as a single
//! newline. A backslash makes the next structural character literal; before
//! anything else it is an ordinary character.
//!
//! Parsing is split into [`tokenize`], which validates brackets and emits
//! [`Token`]s, and [`parse`], which folds the tokens into [`Word`]s.

use std::mem;

use crate::{
    error::{MarkupError, context_window},
    metrics::FontMetrics,
    style::{Emphasis, FontKey, FontRegistry, SpeakerId},
    text::word::{StyledUnit, Word},
};

/// Characters with a markup meaning. Only these can be escaped.
pub const STRUCTURAL_CHARS: [char; 6] = ['[', ']', '*', '_', ' ', '\n'];

fn is_structural(ch: char) -> bool {
    STRUCTURAL_CHARS.contains(&ch)
}

/// Event produced by the markup scanner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// `[name]`; `index` is the char index of the `[`.
    SpeakerChange { name: String, index: usize },
    ToggleBold,
    ToggleItalic,
    Space,
    Break,
    /// Literal text with escapes already resolved.
    Text(String),
}

/// Char indices of unescaped `[` and `]`.
fn bracket_positions(chars: &[char]) -> (Vec<usize>, Vec<usize>) {
    let mut opens = Vec::new();
    let mut closes = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' if chars.get(i + 1).copied().is_some_and(is_structural) => {
                i += 2;
                continue;
            }
            '[' => opens.push(i),
            ']' => closes.push(i),
            _ => {}
        }
        i += 1;
    }
    (opens, closes)
}

/// Pairs brackets in order. Each `]` must follow its `[` and come before
/// the next `[`.
fn match_brackets(
    chars: &[char],
    opens: &[usize],
    closes: &[usize],
) -> Result<Vec<(usize, usize)>, MarkupError> {
    let mut pairs = Vec::with_capacity(opens.len());

    for i in 0..opens.len().max(closes.len()) {
        match (opens.get(i).copied(), closes.get(i).copied()) {
            (Some(open), Some(close)) => {
                if close < open {
                    return Err(MarkupError::OutOfOrder {
                        close,
                        close_context: context_window(chars, close),
                        open,
                        open_context: context_window(chars, open),
                    });
                }
                if let Some(next_open) = opens.get(i + 1).copied()
                    && next_open < close
                {
                    return Err(MarkupError::UnmatchedOpen {
                        index: open,
                        context: context_window(chars, open),
                    });
                }
                pairs.push((open, close));
            }
            (Some(open), None) => {
                return Err(MarkupError::UnmatchedOpen {
                    index: open,
                    context: context_window(chars, open),
                });
            }
            (None, Some(close)) => {
                return Err(MarkupError::UnmatchedClose {
                    index: close,
                    context: context_window(chars, close),
                });
            }
            (None, None) => break,
        }
    }

    Ok(pairs)
}

fn flush_text(buffer: &mut String, tokens: &mut Vec<Token>) {
    if !buffer.is_empty() {
        tokens.push(Token::Text(mem::take(buffer)));
    }
}

/// Scans `text` into tokens after validating its brackets.
pub fn tokenize(text: &str) -> Result<Vec<Token>, MarkupError> {
    let chars: Vec<char> = text.chars().collect();
    let (opens, closes) = bracket_positions(&chars);
    let mut pairs = match_brackets(&chars, &opens, &closes)?.into_iter();

    let mut tokens = Vec::new();
    let mut buffer = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            '\\' if chars.get(i + 1).copied().is_some_and(is_structural) => {
                buffer.push(chars[i + 1]);
                i += 2;
                continue;
            }
            '[' => {
                flush_text(&mut buffer, &mut tokens);
                let Some((open, close)) = pairs.next() else {
                    return Err(MarkupError::UnmatchedOpen {
                        index: i,
                        context: context_window(&chars, i),
                    });
                };
                tokens.push(Token::SpeakerChange {
                    name: chars[open + 1..close].iter().collect(),
                    index: open,
                });

                i = close + 1;
                while i < chars.len() && matches!(chars[i], ' ' | '\n' | '\r') {
                    i += 1;
                }
                continue;
            }
            ']' => {
                // Every paired `]` is skipped together with its `[`.
                return Err(MarkupError::UnmatchedClose {
                    index: i,
                    context: context_window(&chars, i),
                });
            }
            '*' => {
                flush_text(&mut buffer, &mut tokens);
                tokens.push(Token::ToggleBold);
            }
            '_' => {
                flush_text(&mut buffer, &mut tokens);
                tokens.push(Token::ToggleItalic);
            }
            ' ' => {
                flush_text(&mut buffer, &mut tokens);
                tokens.push(Token::Space);
            }
            '\n' => {
                flush_text(&mut buffer, &mut tokens);
                tokens.push(Token::Break);
            }
            '\r' if chars.get(i + 1) == Some(&'\n') => {}
            _ => buffer.push(ch),
        }
        i += 1;
    }
    flush_text(&mut buffer, &mut tokens);

    log::debug!("Tokenized {} chars into {} tokens", chars.len(), tokens.len());
    Ok(tokens)
}

/// Folds tokens into words.
struct ParseState<'a, M> {
    fonts: &'a FontRegistry,
    metrics: &'a mut M,
    speaker: SpeakerId,
    bold: bool,
    italic: bool,
    units: Vec<StyledUnit>,
    words: Vec<Word>,
}

impl<'a, M: FontMetrics> ParseState<'a, M> {
    fn new(fonts: &'a FontRegistry, metrics: &'a mut M) -> Self {
        Self {
            fonts,
            metrics,
            speaker: fonts.default_speaker(),
            bold: false,
            italic: false,
            units: Vec::new(),
            words: Vec::new(),
        }
    }

    fn font(&self) -> FontKey {
        self.fonts
            .key(self.speaker, Emphasis::from_flags(self.bold, self.italic))
    }

    fn end_word(&mut self) {
        if !self.units.is_empty() {
            self.words.push(Word::Text(mem::take(&mut self.units)));
        }
    }

    fn apply(&mut self, token: Token, chars: &[char]) -> Result<(), MarkupError> {
        match token {
            Token::SpeakerChange { name, index } => {
                let Some(speaker) = self.fonts.speaker(&name) else {
                    return Err(MarkupError::UnknownSpeaker {
                        name,
                        index,
                        context: context_window(chars, index),
                        expected: self.fonts.names().map(str::to_owned).collect(),
                    });
                };
                self.speaker = speaker;
            }
            Token::ToggleBold => self.bold = !self.bold,
            Token::ToggleItalic => self.italic = !self.italic,
            Token::Space => self.end_word(),
            Token::Break => {
                self.end_word();
                let font = self.font();
                self.words.push(Word::Break(font));
            }
            Token::Text(text) => {
                let font = self.font();
                let unit = StyledUnit::new(text, font, self.fonts, self.metrics);
                self.units.push(unit);
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<Word> {
        self.end_word();
        self.words
    }
}

/// Parses caption markup into words styled with `fonts`.
///
/// Text before the first `[name]` belongs to the registry's first speaker.
pub fn parse<M: FontMetrics>(
    text: &str,
    fonts: &FontRegistry,
    metrics: &mut M,
) -> Result<Vec<Word>, MarkupError> {
    let tokens = tokenize(text)?;
    let chars: Vec<char> = text.chars().collect();

    let mut state = ParseState::new(fonts, metrics);
    for token in tokens {
        state.apply(token, &chars)?;
    }
    let words = state.finish();

    log::debug!(
        "Parsed {} word(s) and {} line break(s)",
        words.iter().filter(|word| !word.is_break()).count(),
        words.iter().filter(|word| word.is_break()).count()
    );
    Ok(words)
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::FixedMetrics,
        style::{FontSource, SpeakerStyle},
    };

    fn fonts(metrics: &mut FixedMetrics, names: &[&str]) -> FontRegistry {
        let regular = metrics.add_face(0.5, 0.5);
        let bold = metrics.add_face(0.5, 0.5);
        let styles: Vec<SpeakerStyle> = names
            .iter()
            .map(|name| {
                SpeakerStyle::new(*name, FontSource::Face(regular))
                    .with_variant(Emphasis::Bold, FontSource::Face(bold))
            })
            .collect();
        FontRegistry::new(&styles, 16, metrics).unwrap()
    }

    fn word_texts(words: &[Word]) -> Vec<String> {
        words
            .iter()
            .map(|word| {
                if word.is_break() {
                    "\\n".to_string()
                } else {
                    word.text()
                }
            })
            .collect()
    }

    #[test]
    fn test_tokenize_events() {
        let tokens = tokenize("[a]  hi *x*_y_\nz").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::SpeakerChange {
                    name: "a".into(),
                    index: 0
                },
                Token::Text("hi".into()),
                Token::Space,
                Token::ToggleBold,
                Token::Text("x".into()),
                Token::ToggleBold,
                Token::ToggleItalic,
                Token::Text("y".into()),
                Token::ToggleItalic,
                Token::Break,
                Token::Text("z".into()),
            ]
        );
    }

    #[test]
    fn test_tokenize_skips_whitespace_after_speaker() {
        let tokens = tokenize("[a]\n \nhi").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1], Token::Text("hi".into()));

        let tokens = tokenize("[a]\r\n\r\nhi").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[1], Token::Text("hi".into()));
    }

    #[test]
    fn test_escapes_restore_literals() {
        let mut metrics = FixedMetrics::new();
        let fonts = fonts(&mut metrics, &["a"]);
        let text = r"\[x\]\*\_y\z";
        let words = parse(text, &fonts, &mut metrics).unwrap();
        assert_eq!(word_texts(&words), vec![r"[x]*_y\z"]);

        let escaped_space = parse(r"one\ word", &fonts, &mut metrics).unwrap();
        assert_eq!(word_texts(&escaped_space), vec!["one word"]);
    }

    #[test]
    fn test_backslash_before_escape_stays_literal() {
        let tokens = tokenize(r"\\*").unwrap();
        assert_eq!(tokens, vec![Token::Text(r"\*".into())]);
    }

    #[test]
    fn test_speaker_switches() {
        let mut metrics = FixedMetrics::new();
        let fonts = fonts(&mut metrics, &["alice", "bob"]);
        let words = parse("[alice] hi [bob]", &fonts, &mut metrics).unwrap();

        assert_eq!(word_texts(&words), vec!["hi"]);
        assert_eq!(
            words[0].units()[0].font().speaker,
            fonts.speaker("alice").unwrap()
        );

        let words = parse("[alice] hi [bob] yo", &fonts, &mut metrics).unwrap();
        assert_eq!(
            words[1].units()[0].font().speaker,
            fonts.speaker("bob").unwrap()
        );
    }

    #[test]
    fn test_unknown_speaker() {
        let mut metrics = FixedMetrics::new();
        let fonts = fonts(&mut metrics, &["bob"]);
        let err = parse("[alice hi]", &fonts, &mut metrics).unwrap_err();
        match err {
            MarkupError::UnknownSpeaker { name, expected, .. } => {
                assert_eq!(name, "alice hi");
                assert_eq!(expected, vec!["bob".to_string()]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bracket_errors() {
        assert!(matches!(
            tokenize("]alice["),
            Err(MarkupError::OutOfOrder {
                close: 0,
                open: 6,
                ..
            })
        ));
        assert!(matches!(
            tokenize("[alice hi"),
            Err(MarkupError::UnmatchedOpen { index: 0, .. })
        ));
        assert!(matches!(
            tokenize("hi] there"),
            Err(MarkupError::UnmatchedClose { index: 2, .. })
        ));
        assert!(matches!(
            tokenize("[a [b]"),
            Err(MarkupError::UnmatchedOpen { index: 0, .. })
        ));
        assert!(matches!(
            tokenize("[a]]"),
            Err(MarkupError::UnmatchedClose { index: 3, .. })
        ));
    }

    #[test]
    fn test_emphasis_selects_variant() {
        let mut metrics = FixedMetrics::new();
        let fonts = fonts(&mut metrics, &["a"]);
        let words = parse("x*y*_z_*_w_*", &fonts, &mut metrics).unwrap();

        let units = words[0].units();
        let emphases: Vec<Emphasis> = units.iter().map(|unit| unit.font().emphasis).collect();
        assert_eq!(
            emphases,
            vec![
                Emphasis::Plain,
                Emphasis::Bold,
                Emphasis::Italic,
                Emphasis::BoldItalic
            ]
        );
    }

    #[test]
    fn test_trailing_units_are_flushed() {
        let mut metrics = FixedMetrics::new();
        let fonts = fonts(&mut metrics, &["a"]);
        let words = parse("end *bold*", &fonts, &mut metrics).unwrap();
        assert_eq!(word_texts(&words), vec!["end", "bold"]);
    }

    #[test]
    fn test_crlf_is_a_single_break() {
        let mut metrics = FixedMetrics::new();
        let fonts = fonts(&mut metrics, &["a"]);
        let words = parse("one\r\ntwo", &fonts, &mut metrics).unwrap();
        assert_eq!(word_texts(&words), vec!["one", "\\n", "two"]);
    }

    #[test]
    fn test_break_keeps_current_font_height() {
        let mut metrics = FixedMetrics::new();
        let face = metrics.add_face(0.5, 0.5);
        let styles = [
            SpeakerStyle::new("a", FontSource::Face(face)),
            SpeakerStyle::new("b", FontSource::Face(face)).with_relative_height(2.0),
        ];
        let fonts = FontRegistry::new(&styles, 10, &mut metrics).unwrap();
        let words = parse("x\n[b]y\n", &fonts, &mut metrics).unwrap();

        assert_eq!(words[1].max_height(&fonts), 10);
        assert_eq!(words[3].max_height(&fonts), 20);
    }
}
