//! Viewport geometry: rectangles and CSS-style root margins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlap of two rectangles.
    ///
    /// Edge-adjacent rectangles overlap in a zero-area rectangle; disjoint
    /// ones return `None`.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        (right >= left && bottom >= top).then(|| Rect::new(left, top, right - left, bottom - top))
    }

    /// Grow outward by a margin (negative values shrink).
    pub fn expand(&self, margin: &Margin) -> Rect {
        Rect::new(
            self.x - margin.left,
            self.y - margin.top,
            self.width + margin.left + margin.right,
            self.height + margin.top + margin.bottom,
        )
    }
}

/// Root margin in pixels, parsed from CSS shorthand (`"50px 0px"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub const fn uniform(px: f64) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// Vertical margin only (`"<px>px 0px"`).
    pub const fn vertical(px: f64) -> Self {
        Self {
            top: px,
            right: 0.0,
            bottom: px,
            left: 0.0,
        }
    }
}

impl Default for Margin {
    fn default() -> Self {
        Self::vertical(50.0)
    }
}

impl FromStr for Margin {
    type Err = String;

    /// Accepts 1 to 4 lengths in `px` (a bare `0` is allowed), following CSS
    /// shorthand order: top, right, bottom, left.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_ascii_whitespace()
            .map(parse_length)
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [all] => Ok(Margin::uniform(*all)),
            [v, h] => Ok(Margin {
                top: *v,
                right: *h,
                bottom: *v,
                left: *h,
            }),
            [t, h, b] => Ok(Margin {
                top: *t,
                right: *h,
                bottom: *b,
                left: *h,
            }),
            [t, r, b, l] => Ok(Margin {
                top: *t,
                right: *r,
                bottom: *b,
                left: *l,
            }),
            _ => Err(format!("expected 1 to 4 lengths, got `{s}`")),
        }
    }
}

fn parse_length(token: &str) -> Result<f64, String> {
    let number = match token.strip_suffix("px") {
        Some(number) => number,
        None if token == "0" => token,
        None => return Err(format!("`{token}` must be a pixel length (e.g. `50px`)")),
    };
    number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("`{token}` is not a valid length"))
}

impl TryFrom<String> for Margin {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Margin> for String {
    fn from(margin: Margin) -> Self {
        margin.to_string()
    }
}

impl fmt::Display for Margin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}px {}px {}px {}px",
            self.top, self.right, self.bottom, self.left
        )
    }
}
