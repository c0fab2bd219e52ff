use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};
use plotters::style::RGBColor;

/// An 8-bit sRGB colour shared by egui_plot on screen and plotters in the
/// HTML export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn to_color32(self) -> Color32 {
        Color32::from_rgb(self.0, self.1, self.2)
    }

    pub fn to_rgb_color(self) -> RGBColor {
        RGBColor(self.0, self.1, self.2)
    }

    fn from_srgb(rgb: Srgb) -> Self {
        Rgb(
            (rgb.red.clamp(0.0, 1.0) * 255.0).round() as u8,
            (rgb.green.clamp(0.0, 1.0) * 255.0).round() as u8,
            (rgb.blue.clamp(0.0, 1.0) * 255.0).round() as u8,
        )
    }
}

/// Colour of a chart that is not split by a colour column.
pub const SINGLE_SERIES: Rgb = Rgb(99, 110, 250);

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Rgb::from_srgb(rgb)
        })
        .collect()
}

/// One colour per series; a lone series keeps the default colour.
pub fn series_colors(n: usize) -> Vec<Rgb> {
    if n == 1 {
        vec![SINGLE_SERIES]
    } else {
        generate_palette(n)
    }
}

// ---------------------------------------------------------------------------
// Sequential scale for heatmaps
// ---------------------------------------------------------------------------

/// Colour for `t` in `[0, 1]` on a light-to-dark blue scale, blended in
/// linear light so the midpoint does not look muddy.
pub fn heat_color(t: f64) -> Rgb {
    let low: LinSrgb = Srgb::new(0.94f32, 0.96, 0.99).into_linear();
    let high: LinSrgb = Srgb::new(0.03f32, 0.19, 0.42).into_linear();
    let mixed = low.mix(high, t.clamp(0.0, 1.0) as f32);
    let rgb: Srgb = mixed.into_color();
    Rgb::from_srgb(rgb)
}

/// Position of `value` within `[lo, hi]`, `0` for a degenerate range.
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if (hi - lo).abs() < f64::EPSILON {
        0.0
    } else {
        (value - lo) / (hi - lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_distinct_colours() {
        let colors = generate_palette(6);
        assert_eq!(colors.len(), 6);
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn single_series_uses_default_colour() {
        assert_eq!(series_colors(1), vec![SINGLE_SERIES]);
        assert_eq!(series_colors(3).len(), 3);
    }

    #[test]
    fn heat_scale_runs_light_to_dark() {
        let light = heat_color(0.0);
        let dark = heat_color(1.0);
        let lum = |c: Rgb| c.0 as u32 + c.1 as u32 + c.2 as u32;
        assert!(lum(light) > lum(heat_color(0.5)));
        assert!(lum(heat_color(0.5)) > lum(dark));
        assert_eq!(heat_color(-3.0), light);
    }

    #[test]
    fn converts_to_both_backends() {
        assert_eq!(Rgb(255, 0, 16).to_rgb_color(), RGBColor(255, 0, 16));
        assert_eq!(Rgb(255, 0, 16).to_color32(), Color32::from_rgb(255, 0, 16));
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize(5.0, 5.0, 5.0), 0.0);
    }
}
