//! Author colors for trail rendering.

use essence_data::Rgb;

/// Color of cells nobody has written.
pub const NEUTRAL: Rgb = Rgb::new(140, 140, 140);

/// The first four agents keep fixed colors so short runs stay recognisable.
const CLASSIC: [Rgb; 4] = [
    Rgb::new(0, 255, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(255, 255, 0),
    Rgb::new(255, 136, 0),
];

/// Hue step between consecutive authors, in degrees.
const GOLDEN_ANGLE: f64 = 137.5;

#[must_use]
pub fn author_color(author_id: u32) -> Rgb {
    match author_id {
        0 => NEUTRAL,
        1..=4 => CLASSIC[author_id as usize - 1],
        _ => {
            let hue = (f64::from(author_id - 1) * GOLDEN_ANGLE) % 360.0;
            hsl_to_rgb(hue, 1.0, 0.5)
        }
    }
}

/// `hue` in degrees `[0, 360)`, saturation and lightness in `[0, 1]`.
#[must_use]
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let c = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = c * (1.0 - ((hue / 60.0) % 2.0 - 1.0).abs());
    let m = lightness - c / 2.0;

    let (r, g, b) = if hue < 60.0 {
        (c, x, 0.0)
    } else if hue < 120.0 {
        (x, c, 0.0)
    } else if hue < 180.0 {
        (0.0, c, x)
    } else if hue < 240.0 {
        (0.0, x, c)
    } else if hue < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(to_u8(r), to_u8(g), to_u8(b))
}

/// Packs components as `0xRRGGBB`, clamping and rounding each one first.
#[must_use]
pub fn rgb_to_hex_number(r: f64, g: f64, b: f64) -> u32 {
    let channel = |v: f64| v.clamp(0.0, 255.0).round() as u32;
    (channel(r) << 16) | (channel(g) << 8) | channel(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_and_neutral() {
        assert_eq!(author_color(0), NEUTRAL);
        assert_eq!(author_color(1), Rgb::new(0, 255, 255));
        assert_eq!(author_color(4), Rgb::new(255, 136, 0));
    }

    #[test]
    fn test_golden_angle_hue() {
        // id 7 -> hue 105 degrees, second sector.
        assert_eq!(author_color(7), Rgb::new(64, 255, 0));
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), Rgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), Rgb::new(0, 0, 255));
        assert_eq!(hsl_to_rgb(0.0, 0.0, 1.0), Rgb::WHITE);
    }

    #[test]
    fn test_hex_packing_clamps() {
        assert_eq!(rgb_to_hex_number(255.0, 136.0, 0.0), 0xff8800);
        assert_eq!(rgb_to_hex_number(300.0, -4.0, 15.6), 0xff0010);
    }
}
