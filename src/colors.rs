use image::{Rgb, Rgba};
use palette::{FromColor, Hsl, Srgb};

/// A pixel color in the comparison space: Y, U and V on a unit scale.
///
/// Y spans `[0, 1]`; strongly saturated reds push V slightly outside it.
pub type Yuv = [f32; 3];

/// Converts an 8-bit sRGB pixel to YUV (BT.601 weights, chroma centered on 0.5).
pub fn rgb_to_yuv(pixel: Rgb<u8>) -> Yuv {
    let rgb: Srgb<f32> = Srgb::new(pixel[0], pixel[1], pixel[2]).into_format();
    let y = 0.299 * rgb.red + 0.587 * rgb.green + 0.114 * rgb.blue;
    let u = 0.492 * (rgb.blue - y) + 0.5;
    let v = 0.877 * (rgb.red - y) + 0.5;
    [y, u, v]
}

/// Inverse of [`rgb_to_yuv`], clamped to the displayable range.
pub fn yuv_to_rgb(yuv: Yuv) -> Rgb<u8> {
    let [y, u, v] = yuv;
    let (u, v) = (u - 0.5, v - 0.5);
    let red = y + v / 0.877;
    let blue = y + u / 0.492;
    let green = (y - 0.299 * red - 0.114 * blue) / 0.587;

    let [red, green, blue] = [red, green, blue].map(|c| c.clamp(0.0, 1.0));
    let srgb: Srgb<u8> = Srgb::new(red, green, blue).into_format();
    Rgb([srgb.red, srgb.green, srgb.blue])
}

/// Generates `n` visually distinct, contrasting RGBA colors.
pub(crate) fn generate_contrasting_colors(n: usize, alpha: u8) -> Vec<Rgba<u8>> {
    let mut colors = Vec::with_capacity(n);

    for i in 0..n {
        let hue = (i as f32 * 360.0) / n as f32;

        let hsl_color = Hsl::new(hue, 0.9, 0.5);
        let srgb_linear = Srgb::from_color(hsl_color);
        let srgb_u8: Srgb<u8> = srgb_linear.into_format();

        colors.push(Rgba([srgb_u8.red, srgb_u8.green, srgb_u8.blue, alpha]));
    }

    colors
}
