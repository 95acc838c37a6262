//! # Fukidashi
//!
//! Text layout for dialogue captions drawn next to a piece of artwork.
//!
//! ## Overview
//!
//! A caption is written in a small markup language: `[name]` switches the
//! speaker, `*` toggles bold, `_` toggles italic and a newline forces a line
//! break. `Fukidashi` parses that markup against a table of speaker styles,
//! wraps it into lines with a greedy proportional-width line breaker, packs
//! the lines into one or two measured text boxes and rescales everything so
//! the text matches the artwork's height.
//!
//! Nothing is rasterized here. Text is measured through the [`FontMetrics`]
//! trait, backed either by real fonts ([`FontStorage`], using `fontdb` and
//! `fontdue`) or by the deterministic [`FixedMetrics`]. The result is a set
//! of boxes and baseline positions that any drawing backend can consume.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fukidashi::{CaptionConfig, FontSystem, SpeakerStyle, TextPlacement};
//! use fukidashi::euclid::default::Size2D;
//!
//! // 1. Create a FontSystem
//! let font_system = FontSystem::new();
//!
//! // 2. Describe the speakers; bold/italic siblings are found on disk
//! let speakers = [
//!     SpeakerStyle::from_font_file("alice", "fonts/Serif-Regular.ttf"),
//!     SpeakerStyle::from_font_file("bob", "fonts/Sans-Regular.ttf"),
//! ];
//!
//! // 3. Layout against 1200px tall artwork
//! let config = CaptionConfig {
//!     placement: TextPlacement::Left,
//!     ..CaptionConfig::default()
//! };
//! let layout = font_system
//!     .layout_caption("[alice]Hello *world*\n[bob]Hi!", &speakers, &config, Some(1200))
//!     .unwrap();
//!
//! // 4. Place it on a canvas and draw the runs with your renderer
//! let canvas = layout.canvas(Size2D::new(900, 1200)).unwrap();
//! for run in layout.positioned_runs(&canvas) {
//!     println!("{} at {:?}", run.text, run.baseline);
//! }
//! ```
//!
//! ## Features
//!
//! *   **Markup**: Speaker switches, bold/italic toggles and backslash escapes, with
//!     errors that point at the offending characters.
//! *   **Layout**: Greedy wrapping over mixed fonts, balanced two-column splits.
//! *   **Auto-fit**: Wrap width estimation and whole-caption rescaling to a target height.
//! *   **Thread Safety**: [`FontSystem`] guards its font storage with a mutex.

pub mod caption;
pub mod compose;
pub mod error;
pub mod fit;
pub mod font_storage;
pub mod font_system;
pub mod metrics;
pub mod style;
pub mod text;

// common re-exports
pub use caption::{CaptionConfig, CaptionLayout, Sizing, layout_caption};
pub use compose::{
    CanvasPlan, CreditsPosition, TextPlacement, credits_font_height, plan_canvas, plan_credits,
    plan_text_only,
};
pub use error::{LayoutError, MarkupError};
pub use fit::{ColumnMode, FitConfig, FitOutcome, estimate_width, reconcile};
pub use font_storage::FontStorage;
pub use font_system::FontSystem;
pub use metrics::{FaceId, FixedMetrics, FontHandle, FontMetrics};
pub use style::{Emphasis, FontKey, FontRegistry, FontSource, Rgba, SpeakerStyle};

// re-export dependencies
pub use euclid;
pub use fontdb;
pub use fontdue;
pub use parking_lot;
