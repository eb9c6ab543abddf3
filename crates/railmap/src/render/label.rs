//! Station label placement.
//!
//! A station name is a pair of multi-line texts (local script above, Latin
//! script below) separated by `\` line breaks. The pair is anchored beside
//! the station symbol; when it sits above or below the symbol, extra lines
//! must push the whole block away from the symbol so the two never overlap.

use std::str::FromStr;

use svg::node::element as svg_element;

use railmap_core::{draw::SvgNode, geometry::Point};

/// Separator between lines inside a single name.
pub const LINE_BREAK: char = '\\';

/// Gap between the symbol center and the nearest edge of the label block.
const VERTICAL_GAP: f32 = 24.0;

/// Horizontal distance between the symbol center and the label anchor.
const HORIZONTAL_GAP: f32 = 12.0;

/// Direction in which a multi-line text stacks its extra lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelGrowth {
    /// Extra lines stack above the first line.
    #[default]
    Up,
    /// Lines are centered on the anchor.
    Middle,
    /// Extra lines stack below the first line.
    Down,
}

impl LabelGrowth {
    /// Sign applied to the vertical extent of extra lines.
    pub fn polarity(self) -> f32 {
        match self {
            Self::Up => -1.0,
            Self::Middle => 0.0,
            Self::Down => 1.0,
        }
    }
}

impl FromStr for LabelGrowth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "middle" => Ok(Self::Middle),
            "bottom" => Ok(Self::Down),
            _ => Err(format!(
                "invalid vertical name offset `{s}`, valid values: up, middle, bottom"
            )),
        }
    }
}

/// Horizontal side of the symbol a label is placed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LabelSide {
    Left,
    Middle,
    #[default]
    Right,
}

impl LabelSide {
    /// SVG `text-anchor` keeping the text clear of the symbol.
    pub fn text_anchor(self) -> &'static str {
        match self {
            Self::Left => "end",
            Self::Middle => "middle",
            Self::Right => "start",
        }
    }

    pub fn offset_x(self) -> f32 {
        match self {
            Self::Left => -HORIZONTAL_GAP,
            Self::Middle => 0.0,
            Self::Right => HORIZONTAL_GAP,
        }
    }
}

impl FromStr for LabelSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "middle" => Ok(Self::Middle),
            "right" => Ok(Self::Right),
            _ => Err(format!(
                "invalid horizontal name offset `{s}`, valid values: left, middle, right"
            )),
        }
    }
}

/// Typography of one line of a station name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub line_height: f32,
}

/// Local-script names: large, stacking upwards.
pub const PRIMARY_TEXT: TextStyle = TextStyle {
    font_size: 16.0,
    line_height: 16.0,
};

/// Latin-script names: small, stacking downwards.
pub const SECONDARY_TEXT: TextStyle = TextStyle {
    font_size: 10.0,
    line_height: 10.0,
};

/// Number of lines in a name.
pub fn line_count(text: &str) -> usize {
    text.split(LINE_BREAK).count()
}

/// Vertical shift contributed by the extra lines of `text`.
///
/// `(lineCount − 1) × lineHeight`, negative when growing up, positive when
/// growing down and zero when centered.
pub fn vertical_offset(text: &str, growth: LabelGrowth, line_height: f32) -> f32 {
    (line_count(text) - 1) as f32 * line_height * growth.polarity()
}

/// Where the label block of a station is anchored, relative to its center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub offset: Point,
    pub anchor: &'static str,
}

impl LabelPlacement {
    /// Places the primary/secondary name pair on the given side.
    ///
    /// A block above the symbol is pushed up by the extra secondary lines, a
    /// block below is pushed down by the extra primary lines.
    pub fn for_names(primary: &str, secondary: &str, side: LabelSide, growth: LabelGrowth) -> Self {
        let dy = match growth {
            LabelGrowth::Up => {
                vertical_offset(secondary, growth, SECONDARY_TEXT.line_height) - VERTICAL_GAP
            }
            LabelGrowth::Middle => 0.0,
            LabelGrowth::Down => {
                vertical_offset(primary, growth, PRIMARY_TEXT.line_height) + VERTICAL_GAP
            }
        };
        Self {
            offset: Point::new(side.offset_x(), dy),
            anchor: side.text_anchor(),
        }
    }
}

/// Renders `text` as one `<text>` element per line.
///
/// Line `i` of `n` sits at `y = (i − (n − 1)) × lineHeight` when growing up,
/// `i × lineHeight` when growing down and centered on the anchor otherwise.
pub fn multiline_text(
    text: &str,
    origin: Point,
    style: TextStyle,
    growth: LabelGrowth,
    anchor: &str,
    class: &str,
) -> Vec<SvgNode> {
    let lines: Vec<&str> = text.split(LINE_BREAK).collect();
    let last = (lines.len() - 1) as f32;

    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let idx = idx as f32;
            let dy = match growth {
                LabelGrowth::Up => (idx - last) * style.line_height,
                LabelGrowth::Middle => (idx - last / 2.0) * style.line_height,
                LabelGrowth::Down => idx * style.line_height,
            };
            Box::new(
                svg_element::Text::new(*line)
                    .set("x", origin.x())
                    .set("y", origin.y() + dy)
                    .set("font-size", style.font_size)
                    .set("text-anchor", anchor)
                    .set("dominant-baseline", "middle")
                    .set("class", class),
            ) as SvgNode
        })
        .collect()
}
