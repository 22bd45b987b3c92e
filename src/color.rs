use palette::{Mix, Srgb};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Continuous colour scales
// ---------------------------------------------------------------------------

/// Stops of the Inferno scale, dark to light.
const INFERNO: [(u8, u8, u8); 10] = [
    (0x00, 0x00, 0x04),
    (0x1b, 0x0c, 0x41),
    (0x4a, 0x0c, 0x6b),
    (0x78, 0x1c, 0x6d),
    (0xa5, 0x2c, 0x60),
    (0xcf, 0x44, 0x46),
    (0xed, 0x69, 0x25),
    (0xfb, 0x9b, 0x06),
    (0xf7, 0xd1, 0x3d),
    (0xfc, 0xff, 0xa4),
];

/// Named continuous colour scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorScale {
    Inferno,
}

impl ColorScale {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            ColorScale::Inferno => &INFERNO,
        }
    }

    /// Colour at position `t` in `[0, 1]` (clamped), interpolating between
    /// neighbouring stops in sRGB.
    pub fn sample(self, t: f64) -> Srgb<u8> {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let lo = (scaled.floor() as usize).min(stops.len() - 1);
        let hi = (lo + 1).min(stops.len() - 1);
        let frac = (scaled - lo as f64) as f32;

        let a = stop_color(stops[lo]);
        let b = stop_color(stops[hi]);
        a.mix(b, frac).into_format()
    }

    /// Colour for `value` on this scale under a colour-axis range.
    pub fn color_for(self, range: &ColorRange, value: f64) -> Srgb<u8> {
        self.sample(range.position(value))
    }

    /// `n` evenly spaced colours from the low to the high end of the scale.
    pub fn gradient(self, n: usize) -> Vec<Srgb<u8>> {
        match n {
            0 => Vec::new(),
            1 => vec![self.sample(0.0)],
            _ => (0..n)
                .map(|i| self.sample(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

fn stop_color((r, g, b): (u8, u8, u8)) -> Srgb<f32> {
    Srgb::new(r, g, b).into_format()
}

/// `#rrggbb` form of a colour.
pub fn to_hex(color: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color.red, color.green, color.blue)
}

// ---------------------------------------------------------------------------
// Colour-axis range
// ---------------------------------------------------------------------------

/// Value range mapped onto a colour scale: `start` maps to the low end of the
/// scale and `end` to the high end.
///
/// Only `start < end` is a usable declaration. Anything else is kept as
/// declared but drawn with the data extent instead; see [`ColorRange::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorRange {
    pub start: f64,
    pub end: f64,
}

impl ColorRange {
    pub const fn new(start: f64, end: f64) -> Self {
        ColorRange { start, end }
    }

    /// Scale position of `value`, clamped to `[0, 1]`.
    pub fn position(&self, value: f64) -> f64 {
        let span = self.end - self.start;
        if span == 0.0 || !span.is_finite() {
            return 0.0;
        }
        ((value - self.start) / span).clamp(0.0, 1.0)
    }

    /// Declared high-to-low.
    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }

    /// Range used for drawing. A declared range with `start < end` is used
    /// as is; otherwise the axis auto-ranges over the finite `values`, low
    /// to high. With no finite values the declaration is returned unchanged.
    pub fn resolve(&self, values: impl IntoIterator<Item = f64>) -> ColorRange {
        if self.start < self.end {
            return *self;
        }
        let extent = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
                None => Some((v, v)),
            });
        match extent {
            Some((lo, hi)) => ColorRange::new(lo, hi),
            None => *self,
        }
    }

    pub fn min(&self) -> f64 {
        self.start.min(self.end)
    }

    pub fn max(&self) -> f64 {
        self.start.max(self.end)
    }
}
