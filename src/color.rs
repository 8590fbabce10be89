use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};

/// Colour for samples missing from the map.
pub const DEFAULT_COLOR: &str = "#808080";

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// formatted as `#rrggbb`.
pub fn generate_palette(n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            format!(
                "#{:02x}{:02x}{:02x}",
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sample → colour
// ---------------------------------------------------------------------------

/// Maps sample identifiers to distinct colours, so every chart fed from one
/// dataset colours a sample the same way.
#[derive(Debug, Clone)]
pub struct SampleColors {
    mapping: BTreeMap<String, String>,
}

impl SampleColors {
    /// Assign colours in the given (first-seen) sample order.
    pub fn new(samples: &[String]) -> Self {
        let mapping = samples
            .iter()
            .cloned()
            .zip(generate_palette(samples.len()))
            .collect();
        SampleColors { mapping }
    }

    /// Look up the colour for a given sample.
    pub fn color_for(&self, sample: &str) -> &str {
        self.mapping
            .get(sample)
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLOR)
    }
}
