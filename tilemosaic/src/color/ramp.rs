//! Colour parsing, interpolation and value-to-colour lookup.

use super::ColorError;

/// RGBA colour.
pub type Rgba = [u8; 4];

/// Colour used for NoData.
pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
pub fn parse_hex_color(s: &str) -> Result<Rgba, ColorError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || ColorError::InvalidColor(s.to_string());

    if !(hex.len() == 6 || hex.len() == 8) || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());

    let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
    Ok([channel(0)?, channel(2)?, channel(4)?, alpha])
}

/// Stretch `anchors` to exactly `n` colours by linear interpolation.
pub fn interpolate_colors(anchors: &[Rgba], n: usize) -> Vec<Rgba> {
    match (anchors.len(), n) {
        (0, _) | (_, 0) => Vec::new(),
        (1, _) => vec![anchors[0]; n],
        (_, 1) => vec![anchors[0]],
        (len, _) => (0..n)
            .map(|i| {
                let pos = i as f64 * (len - 1) as f64 / (n - 1) as f64;
                let lo = pos.floor() as usize;
                let hi = (lo + 1).min(len - 1);
                let t = pos - lo as f64;
                let mut out = [0u8; 4];
                for (c, slot) in out.iter_mut().enumerate() {
                    let a = anchors[lo][c] as f64;
                    let b = anchors[hi][c] as f64;
                    *slot = (a + (b - a) * t).round() as u8;
                }
                out
            })
            .collect(),
    }
}

/// Maps sample values to colours through sorted break points.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    breaks: Vec<f64>,
    colors: Vec<Rgba>,
    exact: bool,
    no_data: Vec<f64>,
}

impl ColorMap {
    /// Continuous map: a value takes the colour of the first break at or
    /// above it, and values above the last break take the last colour.
    pub fn classified(breaks: Vec<f64>, colors: Vec<Rgba>) -> Self {
        Self {
            breaks,
            colors,
            exact: false,
            no_data: Vec::new(),
        }
    }

    /// Categorical map: only values whose integer class matches a break
    /// are coloured.
    pub fn exact(breaks: Vec<f64>, colors: Vec<Rgba>) -> Self {
        Self {
            breaks,
            colors,
            exact: true,
            no_data: Vec::new(),
        }
    }

    pub fn with_no_data(mut self, values: Vec<f64>) -> Self {
        self.no_data = values;
        self
    }

    pub fn breaks(&self) -> &[f64] {
        &self.breaks
    }

    pub fn color_of(&self, value: f32) -> Rgba {
        if value.is_nan() || self.breaks.is_empty() || self.colors.is_empty() {
            return TRANSPARENT;
        }
        let v = value as f64;
        if self.no_data.iter().any(|&nd| nd == v) {
            return TRANSPARENT;
        }

        let idx = if self.exact {
            let class = v.round();
            match self.breaks.iter().position(|&b| b == class) {
                Some(idx) => idx,
                None => return TRANSPARENT,
            }
        } else {
            self.breaks
                .iter()
                .position(|&b| b >= v)
                .unwrap_or(self.breaks.len() - 1)
        };
        self.colors[idx.min(self.colors.len() - 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#ff8000").unwrap(), [255, 128, 0, 255]);
        assert_eq!(parse_hex_color("00000080").unwrap(), [0, 0, 0, 128]);
        assert!(parse_hex_color("#fff").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
        assert!(parse_hex_color("#ééé").is_err());
        assert!(parse_hex_color("#+f+f+f").is_err());
        assert!(parse_hex_color("#+fffff").is_err());
    }

    #[test]
    fn test_interpolate_endpoints_and_midpoint() {
        let colors = interpolate_colors(&[[0, 0, 0, 255], [255, 255, 255, 255]], 3);
        assert_eq!(
            colors,
            vec![[0, 0, 0, 255], [128, 128, 128, 255], [255, 255, 255, 255]]
        );
    }

    #[test]
    fn test_interpolate_degenerate() {
        assert!(interpolate_colors(&[], 4).is_empty());
        assert_eq!(interpolate_colors(&[[1, 2, 3, 4]], 2), vec![[1, 2, 3, 4]; 2]);
        assert_eq!(
            interpolate_colors(&[[1, 2, 3, 4], [9, 9, 9, 9]], 1),
            vec![[1, 2, 3, 4]]
        );
    }

    #[test]
    fn test_classified_lookup() {
        let map = ColorMap::classified(
            vec![10.0, 20.0],
            vec![[1, 0, 0, 255], [2, 0, 0, 255]],
        );
        assert_eq!(map.color_of(-100.0), [1, 0, 0, 255]);
        assert_eq!(map.color_of(10.0), [1, 0, 0, 255]);
        assert_eq!(map.color_of(15.0), [2, 0, 0, 255]);
        assert_eq!(map.color_of(1e9), [2, 0, 0, 255]);
        assert_eq!(map.color_of(f32::NAN), TRANSPARENT);
    }

    #[test]
    fn test_exact_lookup_and_no_data() {
        let map = ColorMap::exact(vec![1.0, 3.0], vec![[1, 1, 1, 255], [3, 3, 3, 255]])
            .with_no_data(vec![3.0]);
        assert_eq!(map.color_of(1.2), [1, 1, 1, 255]);
        assert_eq!(map.color_of(2.0), TRANSPARENT);
        assert_eq!(map.color_of(3.0), TRANSPARENT);
    }
}
