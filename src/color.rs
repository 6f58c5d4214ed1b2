//! RGB to HSB conversion used for velocity derivation.
//!
//! Formula (all channels in 0..=255):
//! - brightness = max / 255
//! - saturation = (max - min) / max, or 0 when max is 0
//! - hue: 0 for grays, otherwise the position inside the sector of the dominant channel
//!   (red: `b' - g'`, green: `2 + r' - b'`, blue: `4 + g' - r'`, where `c' = (max - c) / (max - min)`),
//!   divided by 6 and wrapped into [0, 1)

/// Hue, saturation and brightness, each normalised to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsb {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

pub fn rgb_to_hsb(red: u8, green: u8, blue: u8) -> Hsb {
    let max = red.max(green).max(blue);
    let min = red.min(green).min(blue);

    let brightness = max as f32 / 255.0;
    let saturation = if max != 0 {
        (max - min) as f32 / max as f32
    } else {
        0.0
    };

    if saturation == 0.0 {
        return Hsb {
            hue: 0.0,
            saturation,
            brightness,
        };
    }

    let span = (max - min) as f32;
    let red_c = (max - red) as f32 / span;
    let green_c = (max - green) as f32 / span;
    let blue_c = (max - blue) as f32 / span;

    let mut hue = if red == max {
        blue_c - green_c
    } else if green == max {
        2.0 + red_c - blue_c
    } else {
        4.0 + green_c - red_c
    };
    hue /= 6.0;
    if hue < 0.0 {
        hue += 1.0;
    }

    Hsb {
        hue,
        saturation,
        brightness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_primaries() {
        let red = rgb_to_hsb(255, 0, 0);
        assert!(close(red.hue, 0.0) && close(red.saturation, 1.0) && close(red.brightness, 1.0));

        let green = rgb_to_hsb(0, 255, 0);
        assert!(close(green.hue, 1.0 / 3.0));

        let blue = rgb_to_hsb(0, 0, 255);
        assert!(close(blue.hue, 2.0 / 3.0));
    }

    #[test]
    fn test_grays_have_no_hue() {
        assert_eq!(rgb_to_hsb(0, 0, 0), Hsb::default());
        let white = rgb_to_hsb(255, 255, 255);
        assert_eq!(white.hue, 0.0);
        assert_eq!(white.saturation, 0.0);
        assert_eq!(white.brightness, 1.0);
    }

    #[test]
    fn test_magenta_wraps_into_range() {
        // Red dominant with blue above green gives a negative raw hue.
        let hsb = rgb_to_hsb(255, 0, 128);
        assert!(hsb.hue > 0.9 && hsb.hue < 1.0);
    }
}
