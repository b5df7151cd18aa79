//! Color values and mixing.
//!
//! [`ColorInfo`] is the unit the whole engine trades in: an RGB triple plus
//! a 0-100 brightness. Sequences publish it, the multiplexer mixes it, the
//! output sink receives it.

use serde::{Deserialize, Serialize};

/// RGB color with brightness, as displayed on the managed light.
///
/// Brightness is a percentage (0.0-100.0), kept separate from the RGB
/// channels so dim colors survive bulbs that need an explicit brightness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorInfo {
    /// RGB channels, 0-255 each.
    pub rgb: (u8, u8, u8),
    /// Brightness percentage, 0.0-100.0.
    #[serde(default = "full_brightness")]
    pub brightness: f32,
}

fn full_brightness() -> f32 {
    100.0
}

/// All channels dark, zero brightness.
pub const OFF: ColorInfo = ColorInfo {
    rgb: (0, 0, 0),
    brightness: 0.0,
};

/// The default "light on" color.
pub const WARM_WHITE: ColorInfo = ColorInfo {
    rgb: (255, 249, 216),
    brightness: 100.0,
};

impl Default for ColorInfo {
    fn default() -> Self {
        WARM_WHITE
    }
}

impl ColorInfo {
    pub fn new(rgb: (u8, u8, u8), brightness: f32) -> Self {
        Self { rgb, brightness }
    }

    /// True when the RGB channels are all zero; the sink is turned off
    /// rather than asked to display black.
    pub fn is_off(&self) -> bool {
        self.rgb == (0, 0, 0)
    }

    /// Linearly interpolate toward `end` by `amount` in [0, 1].
    pub fn interpolated_to(&self, end: ColorInfo, amount: f32) -> ColorInfo {
        let t = amount.clamp(0.0, 1.0);
        let lerp_channel = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
        ColorInfo {
            rgb: (
                lerp_channel(self.rgb.0, end.rgb.0),
                lerp_channel(self.rgb.1, end.rgb.1),
                lerp_channel(self.rgb.2, end.rgb.2),
            ),
            brightness: self.brightness + (end.brightness - self.brightness) * t,
        }
    }

    /// Parse a color string: "#RRGGBB" or a small set of names.
    ///
    /// Parsed colors get full brightness.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() == 6 {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                return Some(Self::new((r, g, b), 100.0));
            }
            return None;
        }
        let rgb = match s.to_ascii_lowercase().as_str() {
            "red" => (255, 0, 0),
            "green" => (0, 255, 0),
            "blue" => (0, 0, 255),
            "yellow" => (255, 255, 0),
            "cyan" => (0, 255, 255),
            "magenta" | "pink" => (255, 0, 255),
            "white" => (255, 255, 255),
            "warmwhite" => WARM_WHITE.rgb,
            "orange" => (255, 165, 0),
            "purple" => (128, 0, 255),
            "off" | "black" => return Some(OFF),
            _ => return None,
        };
        Some(Self::new(rgb, 100.0))
    }
}

/// Mix colors by weighted average of each RGB channel and of brightness.
///
/// `weights` defaults to uniform; they are normalized to sum to 1 before
/// use. Channels and brightness are rounded half-up and clamped to [0, 255].
pub fn mix(colors: &[ColorInfo], weights: Option<&[f32]>) -> ColorInfo {
    if colors.is_empty() {
        return OFF;
    }

    let uniform = vec![1.0; colors.len()];
    let weights = weights.unwrap_or(&uniform);
    debug_assert_eq!(colors.len(), weights.len());

    let total: f32 = weights.iter().sum();
    // A degenerate weight set falls back to uniform.
    let norm: Vec<f32> = if total > 0.0 {
        weights.iter().map(|w| w / total).collect()
    } else {
        vec![1.0 / colors.len() as f32; colors.len()]
    };

    let (mut r, mut g, mut b, mut brightness) = (0.0f32, 0.0f32, 0.0f32, 0.0f32);
    for (color, w) in colors.iter().zip(norm.iter()) {
        r += color.rgb.0 as f32 * w;
        g += color.rgb.1 as f32 * w;
        b += color.rgb.2 as f32 * w;
        brightness += color.brightness * w;
    }

    let clamp = |v: f32| v.round().min(255.0) as u8;
    ColorInfo {
        rgb: (clamp(r), clamp(g), clamp(b)),
        brightness: brightness.round().min(255.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_equal_weights() {
        let red = ColorInfo::new((255, 0, 0), 100.0);
        let blue = ColorInfo::new((0, 0, 255), 50.0);
        let mixed = mix(&[red, blue], None);
        // 127.5 rounds half-up to 128
        assert_eq!(mixed.rgb, (128, 0, 128));
        assert_eq!(mixed.brightness, 75.0);
    }

    #[test]
    fn test_mix_single_color_is_identity() {
        let c = ColorInfo::new((10, 20, 30), 40.0);
        assert_eq!(mix(&[c], None), c);
    }

    #[test]
    fn test_mix_explicit_weights() {
        let red = ColorInfo::new((255, 0, 0), 100.0);
        let black = ColorInfo::new((0, 0, 0), 0.0);
        // Red at triple weight: 255 * 0.75 = 191.25 -> 191
        let mixed = mix(&[red, black], Some(&[3.0, 1.0]));
        assert_eq!(mixed.rgb, (191, 0, 0));
        assert_eq!(mixed.brightness, 75.0);
    }

    #[test]
    fn test_mix_zero_total_weight_falls_back_to_uniform() {
        let red = ColorInfo::new((255, 0, 0), 100.0);
        let blue = ColorInfo::new((0, 0, 255), 50.0);
        let mixed = mix(&[red, blue], Some(&[0.0, 0.0]));
        assert_eq!(mixed.rgb, (128, 0, 128));
    }

    #[test]
    fn test_mix_empty_is_off() {
        assert_eq!(mix(&[], None), OFF);
    }

    #[test]
    fn test_interpolated_to_midpoint() {
        let a = ColorInfo::new((0, 0, 0), 0.0);
        let b = ColorInfo::new((100, 200, 50), 100.0);
        let mid = a.interpolated_to(b, 0.5);
        assert_eq!(mid.rgb, (50, 100, 25));
        assert_eq!(mid.brightness, 50.0);
    }

    #[test]
    fn test_interpolated_to_clamps_amount() {
        let a = ColorInfo::new((0, 0, 0), 0.0);
        let b = ColorInfo::new((100, 100, 100), 100.0);
        assert_eq!(a.interpolated_to(b, 2.0), b);
        assert_eq!(a.interpolated_to(b, -1.0), a);
    }

    #[test]
    fn test_parse_hex_and_names() {
        assert_eq!(ColorInfo::parse("#FF0000").unwrap().rgb, (255, 0, 0));
        assert_eq!(ColorInfo::parse("red").unwrap().rgb, (255, 0, 0));
        assert_eq!(ColorInfo::parse("off").unwrap(), OFF);
        assert!(ColorInfo::parse("no-such-color").is_none());
        assert!(ColorInfo::parse("#12345").is_none());
    }

    #[test]
    fn test_is_off_ignores_brightness() {
        assert!(ColorInfo::new((0, 0, 0), 100.0).is_off());
        assert!(!ColorInfo::new((0, 0, 1), 0.0).is_off());
    }
}
