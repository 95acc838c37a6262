/// Tokenizer and parser for the speaker/emphasis markup.
pub mod markup;
/// Measured boxes of wrapped lines: dimensions, splitting and rescaling.
pub mod text_box;
/// Styled units and words produced by the parser.
pub mod word;
/// Greedy line breaking and run consolidation.
pub mod wrap;

pub use markup::{STRUCTURAL_CHARS, Token, parse, tokenize};
pub use text_box::{HorizontalAlign, PositionedRun, TextBox, TextBoxParams};
pub use word::{StyledUnit, Word};
pub use wrap::{FormattedLine, Run, wrap};
