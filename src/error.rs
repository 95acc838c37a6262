use std::path::PathBuf;

use thiserror::Error;

/// Number of characters shown on each side of an offending markup index.
pub const CONTEXT_RADIUS: usize = 10;

/// Malformed caption markup.
///
/// Every variant carries the character index of the offending token and a
/// window of the surrounding text so the author can find it in the source.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MarkupError {
    #[error("unmatched '[' around\n'''\n...{context}...\n'''")]
    UnmatchedOpen { index: usize, context: String },

    #[error("unmatched ']' around\n'''\n...{context}...\n'''")]
    UnmatchedClose { index: usize, context: String },

    #[error(
        "']' around\n'''\n...{close_context}...\n'''\nappeared before '[' around\n'''\n...{open_context}...\n'''"
    )]
    OutOfOrder {
        close: usize,
        close_context: String,
        open: usize,
        open_context: String,
    },

    #[error("unknown speaker '{name}' around\n'''\n...{context}...\n'''\nexpected one of {expected:?}")]
    UnknownSpeaker {
        name: String,
        index: usize,
        context: String,
        expected: Vec<String>,
    },
}

impl MarkupError {
    /// Character index the error points at.
    pub fn index(&self) -> usize {
        match self {
            Self::UnmatchedOpen { index, .. }
            | Self::UnmatchedClose { index, .. }
            | Self::UnknownSpeaker { index, .. } => *index,
            Self::OutOfOrder { close, .. } => *close,
        }
    }
}

/// Extracts the `CONTEXT_RADIUS` window around `index` (counted in chars).
pub(crate) fn context_window(chars: &[char], index: usize) -> String {
    let start = index.saturating_sub(CONTEXT_RADIUS);
    let end = (index + CONTEXT_RADIUS).min(chars.len());
    chars[start.min(end)..end].iter().collect()
}

/// Errors produced while building a caption layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("invalid style: {0}")]
    InvalidStyle(String),

    #[error("failed to read font '{}': {source}", path.display())]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable font face in '{}'", .0.display())]
    NoFace(PathBuf),

    /// Caller misuse, e.g. splitting a box that has fewer than two lines.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),
}
