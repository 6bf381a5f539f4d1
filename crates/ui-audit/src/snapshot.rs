//! Read-only page captures produced by the browser collector
//!
//! The collector script walks each configured selector group once per
//! (page, viewport) and serializes geometry plus the raw computed-style
//! strings. Inspectors only ever see these values, never a live DOM.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, AuditResult};

/// Everything the inspectors know about one page in one viewport
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    pub url: String,
    pub inner_width: f64,
    pub inner_height: f64,
    pub scroll_width: f64,
    pub scroll_height: f64,

    pub interactive: Vec<ElementSnapshot>,
    pub buttons: Vec<ElementSnapshot>,
    pub form_fields: Vec<ElementSnapshot>,
    pub cards: Vec<ElementSnapshot>,
    pub hero: Option<ElementSnapshot>,
    pub text: Vec<ElementSnapshot>,
    pub sections: Vec<ElementSnapshot>,
    pub badges: Vec<ElementSnapshot>,
    pub particles: Vec<ElementSnapshot>,
    /// Every `fixed` or `absolute` element on the page
    pub positioned: Vec<ElementSnapshot>,
    pub navigation: Option<ElementSnapshot>,
    pub footer: Option<ElementSnapshot>,
    pub containers: Vec<ElementSnapshot>,

    /// First non-empty headline, by selector priority
    pub headline: Option<ElementSnapshot>,
    /// First long text starting in the top half of the first screen
    pub subheading: Option<ElementSnapshot>,
    /// Call-to-action elements intersecting the first screen
    pub ctas: Vec<ElementSnapshot>,

    /// Selector groups whose collection threw in the browser
    pub collector_errors: Vec<CollectorError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectorError {
    pub collector: String,
    pub message: String,
}

impl PageSnapshot {
    /// An empty document of the given inner size
    pub fn blank(inner_width: f64, inner_height: f64) -> Self {
        Self {
            inner_width,
            inner_height,
            scroll_width: inner_width,
            scroll_height: inner_height,
            ..Default::default()
        }
    }

    pub fn has_horizontal_overflow(&self) -> bool {
        self.scroll_width > self.inner_width
    }

    pub fn has_vertical_scrollbar(&self) -> bool {
        self.scroll_height > self.inner_height
    }

    /// Whether a rect lies entirely inside the first screen
    pub fn above_the_fold(&self, rect: &Rect) -> bool {
        rect.top() >= 0.0 && rect.bottom() <= self.inner_height
    }
}

/// Viewport-relative bounding box from `getBoundingClientRect`
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Raw computed-style values, exactly as `getComputedStyle` reports them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputedStyle {
    pub padding_top: String,
    pub padding_right: String,
    pub padding_bottom: String,
    pub padding_left: String,
    pub margin_top: String,
    pub margin_right: String,
    pub margin_bottom: String,
    pub margin_left: String,
    pub font_size: String,
    pub line_height: String,
    pub position: String,
    pub z_index: String,
}

/// One captured element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSnapshot {
    /// Stable DOM path, e.g. `body>main:nth-of-type(1)>section:nth-of-type(2)`
    pub path: String,

    /// Lowercase tag name
    pub tag: String,

    /// Best-effort human anchor: button text, placeholder, nearest heading
    pub anchor: String,

    pub rect: Rect,
    pub style: ComputedStyle,
}

/// Resolved four-sided box values in px
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    pub fn min(&self) -> f64 {
        self.top.min(self.right).min(self.bottom).min(self.left)
    }
}

impl ElementSnapshot {
    pub fn new(path: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Rect { x, y, width, height };
        self
    }

    pub fn anchored(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = anchor.into();
        self
    }

    /// Set padding from a CSS shorthand such as `8px 12px`
    pub fn padding(mut self, shorthand: &str) -> Self {
        let [top, right, bottom, left] = expand_shorthand(shorthand);
        self.style.padding_top = top;
        self.style.padding_right = right;
        self.style.padding_bottom = bottom;
        self.style.padding_left = left;
        self
    }

    /// Set margin from a CSS shorthand such as `0 auto`
    pub fn margin(mut self, shorthand: &str) -> Self {
        let [top, right, bottom, left] = expand_shorthand(shorthand);
        self.style.margin_top = top;
        self.style.margin_right = right;
        self.style.margin_bottom = bottom;
        self.style.margin_left = left;
        self
    }

    pub fn font(mut self, font_size: &str, line_height: &str) -> Self {
        self.style.font_size = font_size.to_string();
        self.style.line_height = line_height.to_string();
        self
    }

    pub fn positioned(mut self, position: &str) -> Self {
        self.style.position = position.to_string();
        self
    }

    pub fn z_index(mut self, z_index: &str) -> Self {
        self.style.z_index = z_index.to_string();
        self
    }

    /// Elements with no rendered area (display: none, collapsed)
    pub fn is_rendered(&self) -> bool {
        self.rect.width > 0.0 && self.rect.height > 0.0
    }

    pub fn is_floating(&self) -> bool {
        matches!(self.style.position.as_str(), "fixed" | "absolute")
    }

    pub fn is_form_control(&self) -> bool {
        matches!(self.tag.as_str(), "input" | "textarea" | "select")
    }

    /// Padding on all four sides; unset sides count as zero
    pub fn padding_sides(&self) -> AuditResult<Sides> {
        Ok(Sides {
            top: px_or_zero("padding-top", &self.style.padding_top)?,
            right: px_or_zero("padding-right", &self.style.padding_right)?,
            bottom: px_or_zero("padding-bottom", &self.style.padding_bottom)?,
            left: px_or_zero("padding-left", &self.style.padding_left)?,
        })
    }

    pub fn margin_sides(&self) -> AuditResult<Sides> {
        Ok(Sides {
            top: px_or_zero("margin-top", &self.style.margin_top)?,
            right: px_or_zero("margin-right", &self.style.margin_right)?,
            bottom: px_or_zero("margin-bottom", &self.style.margin_bottom)?,
            left: px_or_zero("margin-left", &self.style.margin_left)?,
        })
    }

    pub fn font_size_px(&self) -> AuditResult<Option<f64>> {
        parse_px("font-size", &self.style.font_size)
    }

    /// `None` for the `normal` keyword
    pub fn line_height_px(&self) -> AuditResult<Option<f64>> {
        parse_px("line-height", &self.style.line_height)
    }

    /// `None` for `auto`
    pub fn z_index_value(&self) -> AuditResult<Option<i64>> {
        let raw = self.style.z_index.trim();
        if is_keyword(raw) {
            return Ok(None);
        }
        raw.parse::<i64>().map(Some).map_err(|_| AuditError::CssValue {
            property: "z-index".to_string(),
            value: raw.to_string(),
        })
    }

    /// Human anchor, falling back to a description of the element
    pub fn anchor_or(&self, fallback: &str) -> String {
        let anchor = self.anchor.trim();
        if anchor.is_empty() {
            fallback.to_string()
        } else {
            anchor.chars().take(50).collect()
        }
    }
}

static PX_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?(?:\d+(?:\.\d+)?|\.\d+))(?:px)?$").expect("valid px regex"));

fn is_keyword(value: &str) -> bool {
    matches!(
        value,
        "" | "normal" | "auto" | "none" | "initial" | "inherit" | "unset"
    )
}

/// Parse a computed pixel length.
///
/// Keywords resolve to `None`; anything that is neither a keyword nor a px
/// length is an error, since computed styles are always resolved to px.
pub fn parse_px(property: &str, value: &str) -> AuditResult<Option<f64>> {
    let value = value.trim();
    if is_keyword(value) {
        return Ok(None);
    }

    let captures = PX_VALUE.captures(value).ok_or_else(|| AuditError::CssValue {
        property: property.to_string(),
        value: value.to_string(),
    })?;

    captures[1]
        .parse::<f64>()
        .map(Some)
        .map_err(|_| AuditError::CssValue {
            property: property.to_string(),
            value: value.to_string(),
        })
}

fn px_or_zero(property: &str, value: &str) -> AuditResult<f64> {
    Ok(parse_px(property, value)?.unwrap_or(0.0))
}

fn expand_shorthand(shorthand: &str) -> [String; 4] {
    let parts: Vec<String> = shorthand.split_whitespace().map(String::from).collect();
    match parts.as_slice() {
        [all] => [all.clone(), all.clone(), all.clone(), all.clone()],
        [vertical, horizontal] => [
            vertical.clone(),
            horizontal.clone(),
            vertical.clone(),
            horizontal.clone(),
        ],
        [top, horizontal, bottom] => [
            top.clone(),
            horizontal.clone(),
            bottom.clone(),
            horizontal.clone(),
        ],
        [top, right, bottom, left, ..] => [top.clone(), right.clone(), bottom.clone(), left.clone()],
        [] => Default::default(),
    }
}

/// Format a px measurement without a trailing `.0`
pub fn fmt_px(value: f64) -> String {
    if (value - value.round()).abs() < 0.005 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.1}", value)
    }
}
