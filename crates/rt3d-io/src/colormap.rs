//! Scalar-to-color lookup for viewer formats that carry colors instead of
//! raw attribute values.

use rt3d_model::DenseAttribute;

/// Color of entities without a result
pub const UNDEFINED_COLOR: [f32; 3] = [0.5, 0.5, 0.5];

/// Blue-to-red rainbow over a fixed value range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub min: f64,
    pub max: f64,
}

impl ColorScale {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Scale spanning the finite magnitudes of `attribute`
    pub fn for_attribute(attribute: &DenseAttribute) -> Option<Self> {
        attribute
            .finite_range()
            .map(|(min, max)| Self::new(min, max))
    }

    /// Position of `value` in the range, 0..=1. A flat range maps to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// RGB color of `value`; NaN maps to [`UNDEFINED_COLOR`]
    pub fn color(&self, value: f64) -> [f32; 3] {
        if !value.is_finite() {
            return UNDEFINED_COLOR;
        }
        // hue 240° (blue) at the minimum down to 0° (red) at the maximum
        let hue = (1.0 - self.normalize(value)) * 240.0;
        hsv_to_rgb(hue)
    }

    /// Band index of `value` when the range is split into `bands` equal
    /// intervals, `None` for NaN
    pub fn band(&self, value: f64, bands: usize) -> Option<usize> {
        if !value.is_finite() || bands == 0 {
            return None;
        }
        let band = (self.normalize(value) * bands as f64).floor() as usize;
        Some(band.min(bands - 1))
    }

    /// Color at the middle of band `band`
    pub fn band_color(&self, band: usize, bands: usize) -> [f32; 3] {
        let t = (band as f64 + 0.5) / bands.max(1) as f64;
        self.color(self.min + t * (self.max - self.min))
    }
}

/// Fully saturated, full value HSV to RGB
fn hsv_to_rgb(hue: f64) -> [f32; 3] {
    let h = (hue.rem_euclid(360.0)) / 60.0;
    let x = (1.0 - (h % 2.0 - 1.0).abs()) as f32;
    match h as u32 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_blue_and_red() {
        let scale = ColorScale::new(-10.0, 10.0);
        assert_eq!(scale.color(-10.0), [0.0, 0.0, 1.0]);
        assert_eq!(scale.color(10.0), [1.0, 0.0, 0.0]);
        assert_eq!(scale.color(0.0), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn nan_is_grey() {
        let scale = ColorScale::new(0.0, 1.0);
        assert_eq!(scale.color(f64::NAN), UNDEFINED_COLOR);
        assert_eq!(scale.band(f64::NAN, 8), None);
    }

    #[test]
    fn flat_range_does_not_divide_by_zero() {
        let scale = ColorScale::new(3.0, 3.0);
        assert_eq!(scale.normalize(3.0), 0.0);
        assert_eq!(scale.band(3.0, 4), Some(0));
    }

    #[test]
    fn bands_cover_the_range() {
        let scale = ColorScale::new(0.0, 100.0);
        assert_eq!(scale.band(0.0, 4), Some(0));
        assert_eq!(scale.band(49.0, 4), Some(1));
        assert_eq!(scale.band(100.0, 4), Some(3));
    }
}
