//! Placement of text boxes next to the artwork on the final canvas.
//!
//! Only coordinates are produced here; drawing is left to the caller.

use euclid::default::{Point2D, Size2D};

use crate::{
    error::LayoutError,
    text::{HorizontalAlign, TextBox},
};

/// Where the text goes relative to the artwork.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextPlacement {
    /// Text on the left, artwork on the right.
    #[default]
    Left,
    /// Artwork on the left, text on the right.
    Right,
    /// Two text columns with the artwork between them.
    Split,
}

impl TextPlacement {
    /// Number of text boxes this placement lays out.
    pub fn box_count(self) -> usize {
        match self {
            TextPlacement::Left | TextPlacement::Right => 1,
            TextPlacement::Split => 2,
        }
    }
}

/// Pixel positions of everything on the canvas. **Y-axis goes down**.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasPlan {
    pub size: Size2D<u32>,
    pub artwork_origin: Point2D<i32>,
    /// Top-left corner of each text box, in input order.
    pub box_origins: Vec<Point2D<i32>>,
}

fn box_size(text_box: &TextBox) -> Size2D<u32> {
    Size2D::new(text_box.width() as u32, text_box.height() as u32)
}

// Vertical offset that centres a box on the artwork; negative when the box is
// taller than the art.
fn centred(outer: u32, inner: u32) -> i32 {
    ((outer as f32 - inner as f32) / 2.0) as i32
}

/// Lays out a caption canvas: the artwork at its size plus the text boxes
/// beside it, every box vertically centred on the artwork.
///
/// In split mode both columns are as wide as the wider box and each box is
/// centred in its column.
pub fn plan_canvas(
    boxes: &[TextBox],
    artwork: Size2D<u32>,
    placement: TextPlacement,
) -> Result<CanvasPlan, LayoutError> {
    if boxes.len() != placement.box_count() {
        return Err(LayoutError::Precondition(
            "box count does not match the text placement",
        ));
    }

    let plan = match placement {
        TextPlacement::Left => {
            let text = box_size(&boxes[0]);
            CanvasPlan {
                size: Size2D::new(artwork.width + text.width, artwork.height),
                artwork_origin: Point2D::new(text.width as i32, 0),
                box_origins: vec![Point2D::new(0, centred(artwork.height, text.height))],
            }
        }
        TextPlacement::Right => {
            let text = box_size(&boxes[0]);
            CanvasPlan {
                size: Size2D::new(artwork.width + text.width, artwork.height),
                artwork_origin: Point2D::origin(),
                box_origins: vec![Point2D::new(
                    artwork.width as i32,
                    centred(artwork.height, text.height),
                )],
            }
        }
        TextPlacement::Split => {
            let left = box_size(&boxes[0]);
            let right = box_size(&boxes[1]);
            let column = left.width.max(right.width);
            CanvasPlan {
                size: Size2D::new(artwork.width + column * 2, artwork.height),
                artwork_origin: Point2D::new(column as i32, 0),
                box_origins: vec![
                    Point2D::new(
                        centred(column, left.width),
                        centred(artwork.height, left.height),
                    ),
                    Point2D::new(
                        (column + artwork.width) as i32 + centred(column, right.width),
                        centred(artwork.height, right.height),
                    ),
                ],
            }
        }
    };

    log::debug!(
        "Planned {}x{} canvas for {:?} placement",
        plan.size.width,
        plan.size.height,
        placement
    );
    Ok(plan)
}

/// Canvas for a box rendered on its own.
pub fn plan_text_only(text_box: &TextBox) -> CanvasPlan {
    CanvasPlan {
        size: box_size(text_box),
        artwork_origin: Point2D::origin(),
        box_origins: vec![Point2D::origin()],
    }
}

/// Artwork corner a credits line is drawn in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CreditsPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

impl CreditsPosition {
    /// Parses the short corner codes `tl`, `tr`, `bl` and `br`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "tl" => Some(Self::TopLeft),
            "tr" => Some(Self::TopRight),
            "bl" => Some(Self::BottomLeft),
            "br" => Some(Self::BottomRight),
            _ => None,
        }
    }

    /// Credits hug the edge they sit against.
    pub fn alignment(self) -> HorizontalAlign {
        match self {
            Self::TopLeft | Self::BottomLeft => HorizontalAlign::Left,
            Self::TopRight | Self::BottomRight => HorizontalAlign::Right,
        }
    }
}

/// Font height of the credits line: 2% of the artwork height, rounded up.
pub fn credits_font_height(artwork_height: u32) -> u32 {
    (artwork_height as f64 * 0.02).ceil() as u32
}

/// Top-left corner of a credits box of size `credits` placed in a corner of
/// the artwork.
///
/// The box is inset from both edges by [`credits_font_height`].
pub fn plan_credits(
    artwork_origin: Point2D<i32>,
    artwork: Size2D<u32>,
    credits: Size2D<u32>,
    position: CreditsPosition,
) -> Point2D<i32> {
    let padding = credits_font_height(artwork.height) as i32;
    let left = artwork_origin.x + padding;
    let right = artwork_origin.x + artwork.width as i32 - (credits.width as i32 + padding);
    let top = artwork_origin.y + padding;
    let bottom = artwork_origin.y + artwork.height as i32 - (credits.height as i32 + padding);

    match position {
        CreditsPosition::TopLeft => Point2D::new(left, top),
        CreditsPosition::TopRight => Point2D::new(right, top),
        CreditsPosition::BottomLeft => Point2D::new(left, bottom),
        CreditsPosition::BottomRight => Point2D::new(right, bottom),
    }
}
