//! Color construction and conversion, computed on the host with the same
//! single-precision arithmetic the native library uses, so results agree bit
//! for bit with the natively bound functions of the same name on `Nuklear`.
//!
//! Integer channels are clamped into `[0, 255]`, float channels saturated into
//! `[0, 1]` and truncated after scaling. The slice-taking `*_iv`, `*_bv` and
//! `*_fv` variants require exactly 3 (rgb, hsv) or 4 (rgba, hsva) elements.
//!
//! Hex strings end at the first NUL. Missing digits of a short string read as
//! NUL, which is not a hex digit, so they don't parse as 0.

use crate::{
    coerce::{
        LengthMismatch,
        channel_from_f32,
        clamp_channel,
        fixed_array,
    },
    value::{
        Color,
        Colorf,
    },
};
use std::ffi::c_char;


const INV_255: f32 = 1.0 / 255.0;


// construction from rgb(a)

pub fn rgb(r: i32, g: i32, b: i32) -> Color {
    rgba(r, g, b, 255)
}

pub fn rgb_iv(rgb: &[i32]) -> Result<Color, LengthMismatch> {
    let [r, g, b] = fixed_array(rgb)?;
    Ok(self::rgb(r, g, b))
}

pub fn rgb_bv(rgb: &[u8]) -> Result<Color, LengthMismatch> {
    let [r, g, b] = fixed_array(rgb)?;
    Ok(Color::new(r, g, b, 255))
}

pub fn rgb_f(r: f32, g: f32, b: f32) -> Color {
    rgba_f(r, g, b, 1.0)
}

pub fn rgb_fv(rgb: &[f32]) -> Result<Color, LengthMismatch> {
    let [r, g, b] = fixed_array(rgb)?;
    Ok(rgb_f(r, g, b))
}

pub fn rgb_cf(c: Colorf) -> Color {
    rgba_f(c.r, c.g, c.b, 1.0)
}

pub fn rgba(r: i32, g: i32, b: i32, a: i32) -> Color {
    Color::new(
        clamp_channel(r),
        clamp_channel(g),
        clamp_channel(b),
        clamp_channel(a),
    )
}

/// Unpack a color whose lowest byte is red and highest byte is alpha.
pub fn rgba_u32(rgba: u32) -> Color {
    let [r, g, b, a] = rgba.to_le_bytes();
    Color::new(r, g, b, a)
}

pub fn rgba_iv(rgba: &[i32]) -> Result<Color, LengthMismatch> {
    let [r, g, b, a] = fixed_array(rgba)?;
    Ok(self::rgba(r, g, b, a))
}

pub fn rgba_bv(rgba: &[u8]) -> Result<Color, LengthMismatch> {
    let [r, g, b, a] = fixed_array(rgba)?;
    Ok(Color::new(r, g, b, a))
}

pub fn rgba_f(r: f32, g: f32, b: f32, a: f32) -> Color {
    Color::new(
        channel_from_f32(r),
        channel_from_f32(g),
        channel_from_f32(b),
        channel_from_f32(a),
    )
}

pub fn rgba_fv(rgba: &[f32]) -> Result<Color, LengthMismatch> {
    let [r, g, b, a] = fixed_array(rgba)?;
    Ok(rgba_f(r, g, b, a))
}

pub fn rgba_cf(c: Colorf) -> Color {
    rgba_f(c.r, c.g, c.b, c.a)
}

/// Scale the rgb channels by `factor`, keeping alpha.
pub fn rgb_factor(mut c: Color, factor: f32) -> Color {
    if factor == 1.0 {
        return c;
    }
    c.r = (c.r as f32 * factor) as u8;
    c.g = (c.g as f32 * factor) as u8;
    c.b = (c.b as f32 * factor) as u8;
    c
}


// hex

/// Parse the `len` characters starting at `start` as hex digits, positions
/// past the end reading as NUL. A character that isn't a hex digit adds its
/// offset from `'0'` as a C `char`, as the native parser does.
fn parse_hex(digits: &[u8], start: usize, len: usize) -> u8 {
    let mut n: i32 = 0;
    for i in start..start + len {
        let c = digits.get(i).copied().unwrap_or(0);
        n = n * 16 + match c {
            b'a'..=b'f' => (c - b'a') as i32 + 10,
            b'A'..=b'F' => (c - b'A') as i32 + 10,
            _ => c as c_char as i32 - b'0' as i32,
        };
    }
    n as u8
}

/// The digits of a hex color string: up to the first NUL, without a leading
/// `#`.
fn hex_digits(s: &str) -> &[u8] {
    let bytes = s.as_bytes();
    let bytes = bytes.split(|&c| c == 0).next().unwrap_or(bytes);
    bytes.strip_prefix(b"#").unwrap_or(bytes)
}

pub fn rgb_hex(rgb: &str) -> Color {
    let d = hex_digits(rgb);
    Color::new(parse_hex(d, 0, 2), parse_hex(d, 2, 2), parse_hex(d, 4, 2), 255)
}

pub fn rgba_hex(rgba: &str) -> Color {
    let d = hex_digits(rgba);
    Color::new(
        parse_hex(d, 0, 2),
        parse_hex(d, 2, 2),
        parse_hex(d, 4, 2),
        parse_hex(d, 6, 2),
    )
}

pub fn color_hex_rgb(c: Color) -> String {
    format!("{:02X}{:02X}{:02X}", c.r, c.g, c.b)
}

pub fn color_hex_rgba(c: Color) -> String {
    format!("{:02X}{:02X}{:02X}{:02X}", c.r, c.g, c.b, c.a)
}


// construction from hsv(a)

pub fn hsv(h: i32, s: i32, v: i32) -> Color {
    hsva(h, s, v, 255)
}

pub fn hsv_iv(hsv: &[i32]) -> Result<Color, LengthMismatch> {
    let [h, s, v] = fixed_array(hsv)?;
    Ok(self::hsv(h, s, v))
}

pub fn hsv_bv(hsv: &[u8]) -> Result<Color, LengthMismatch> {
    let [h, s, v] = fixed_array(hsv)?;
    Ok(self::hsv(h as i32, s as i32, v as i32))
}

pub fn hsv_f(h: f32, s: f32, v: f32) -> Color {
    hsva_f(h, s, v, 1.0)
}

pub fn hsv_fv(hsv: &[f32]) -> Result<Color, LengthMismatch> {
    let [h, s, v] = fixed_array(hsv)?;
    Ok(hsv_f(h, s, v))
}

pub fn hsva(h: i32, s: i32, v: i32, a: i32) -> Color {
    let unit = |n: i32| n.clamp(0, 255) as f32 / 255.0;
    hsva_f(unit(h), unit(s), unit(v), unit(a))
}

pub fn hsva_iv(hsva: &[i32]) -> Result<Color, LengthMismatch> {
    let [h, s, v, a] = fixed_array(hsva)?;
    Ok(self::hsva(h, s, v, a))
}

pub fn hsva_bv(hsva: &[u8]) -> Result<Color, LengthMismatch> {
    let [h, s, v, a] = fixed_array(hsva)?;
    Ok(self::hsva(h as i32, s as i32, v as i32, a as i32))
}

pub fn hsva_f(h: f32, s: f32, v: f32, a: f32) -> Color {
    rgba_cf(hsva_colorf(h, s, v, a))
}

pub fn hsva_fv(hsva: &[f32]) -> Result<Color, LengthMismatch> {
    let [h, s, v, a] = fixed_array(hsva)?;
    Ok(hsva_f(h, s, v, a))
}

/// Convert hsva, each in `[0, 1]`, to float rgba. Inputs are not clamped.
pub fn hsva_colorf(h: f32, s: f32, v: f32, a: f32) -> Colorf {
    if s <= 0.0 {
        return Colorf::unclamped(v, v, v, a);
    }
    let h = h / (60.0 / 360.0);
    let sector = h as i32;
    let f = h - sector as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - (s * f));
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match sector {
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        5 => (v, p, q),
        _ => (v, t, p),
    };
    Colorf::unclamped(r, g, b, a)
}

pub fn hsva_colorfv(hsva: &[f32]) -> Result<Colorf, LengthMismatch> {
    let [h, s, v, a] = fixed_array(hsva)?;
    Ok(hsva_colorf(h, s, v, a))
}


// conversion to float / packed

pub fn color_f(c: Color) -> (f32, f32, f32, f32) {
    (
        c.r as f32 * INV_255,
        c.g as f32 * INV_255,
        c.b as f32 * INV_255,
        c.a as f32 * INV_255,
    )
}

pub fn color_fv(c: Color) -> [f32; 4] {
    let (r, g, b, a) = color_f(c);
    [r, g, b, a]
}

pub fn color_cf(c: Color) -> Colorf {
    let (r, g, b, a) = color_f(c);
    Colorf::unclamped(r, g, b, a)
}

pub fn color_d(c: Color) -> (f64, f64, f64, f64) {
    let s = 1.0 / 255.0;
    (c.r as f64 * s, c.g as f64 * s, c.b as f64 * s, c.a as f64 * s)
}

pub fn color_dv(c: Color) -> [f64; 4] {
    let (r, g, b, a) = color_d(c);
    [r, g, b, a]
}

/// Pack a color with red in the lowest byte and alpha in the highest.
pub fn color_u32(c: Color) -> u32 {
    u32::from_le_bytes([c.r, c.g, c.b, c.a])
}


// conversion to hsv(a)

pub fn colorf_hsva_f(c: Colorf) -> (f32, f32, f32, f32) {
    let Colorf { mut r, mut g, mut b, a } = c;
    let mut k: f32 = 0.0;
    if g < b {
        std::mem::swap(&mut g, &mut b);
        k = -1.0;
    }
    if r < g {
        std::mem::swap(&mut r, &mut g);
        k = -2.0 / 6.0 - k;
    }
    let chroma = r - if g < b { g } else { b };
    let h = (k + (g - b) / (6.0 * chroma + 1e-20)).abs();
    let s = chroma / (r + 1e-20);
    (h, s, r, a)
}

pub fn colorf_hsva_fv(c: Colorf) -> [f32; 4] {
    let (h, s, v, a) = colorf_hsva_f(c);
    [h, s, v, a]
}

pub fn color_hsva_f(c: Color) -> (f32, f32, f32, f32) {
    colorf_hsva_f(color_cf(c))
}

pub fn color_hsva_fv(c: Color) -> [f32; 4] {
    colorf_hsva_fv(color_cf(c))
}

pub fn color_hsva_i(c: Color) -> (i32, i32, i32, i32) {
    let (h, s, v, a) = color_hsva_f(c);
    let byte = |n: f32| (n * 255.0) as u8 as i32;
    (byte(h), byte(s), byte(v), byte(a))
}

pub fn color_hsva_iv(c: Color) -> [i32; 4] {
    let (h, s, v, a) = color_hsva_i(c);
    [h, s, v, a]
}

pub fn color_hsva_b(c: Color) -> (u8, u8, u8, u8) {
    let (h, s, v, a) = color_hsva_i(c);
    (h as u8, s as u8, v as u8, a as u8)
}

pub fn color_hsva_bv(c: Color) -> [u8; 4] {
    let (h, s, v, a) = color_hsva_b(c);
    [h, s, v, a]
}

pub fn color_hsv_f(c: Color) -> (f32, f32, f32) {
    let (h, s, v, _) = color_hsva_f(c);
    (h, s, v)
}

pub fn color_hsv_fv(c: Color) -> [f32; 3] {
    let (h, s, v) = color_hsv_f(c);
    [h, s, v]
}

pub fn color_hsv_i(c: Color) -> (i32, i32, i32) {
    let (h, s, v, _) = color_hsva_i(c);
    (h, s, v)
}

pub fn color_hsv_iv(c: Color) -> [i32; 3] {
    let (h, s, v) = color_hsv_i(c);
    [h, s, v]
}

pub fn color_hsv_b(c: Color) -> (u8, u8, u8) {
    let (h, s, v, _) = color_hsva_b(c);
    (h, s, v)
}

pub fn color_hsv_bv(c: Color) -> [u8; 3] {
    let (h, s, v) = color_hsv_b(c);
    [h, s, v]
}


#[cfg(test)]
fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-4, "{} is not close to {}", a, b);
}

#[test]
fn test_integer_constructors_clamp() {
    assert_eq!(rgb(100, -1, 256), Color::new(100, 0, 255, 255));
    assert_eq!(rgba(100, -1, 256, 200), Color::new(100, 0, 255, 200));
    assert_eq!(rgb_iv(&[100, -1, 256]).unwrap(), Color::new(100, 0, 255, 255));
    assert_eq!(rgba_iv(&[100, -1, 256, 200]).unwrap(), Color::new(100, 0, 255, 200));
    assert_eq!(rgb(0, 128, 255), Color::new(0, 128, 255, 255));
}

#[test]
fn test_float_constructors_saturate() {
    let expected = Color::new(100, 0, 255, 255);
    assert_eq!(rgb_f(100.0 / 255.0, -0.1, 1.1), expected);
    assert_eq!(rgb_fv(&[100.0 / 255.0, -0.1, 1.1]).unwrap(), expected);
    assert_eq!(rgb_cf(Colorf::new(100.0 / 255.0, -0.1, 1.1, 0.2)), expected);
    assert_eq!(
        rgba_f(100.0 / 255.0, -0.1, 1.1, 200.0 / 255.0),
        Color::new(100, 0, 255, 200),
    );
    assert_eq!(
        rgba_cf(Colorf::new(100.0 / 255.0, -0.1, 1.1, 200.0 / 255.0)),
        Color::new(100, 0, 255, 200),
    );
}

#[test]
fn test_byte_constructors_pass_through() {
    assert_eq!(rgb_bv(&[100, 255, 0]).unwrap(), Color::new(100, 255, 0, 255));
    assert_eq!(rgba_bv(&[100, 255, 0, 200]).unwrap(), Color::new(100, 255, 0, 200));
}

#[test]
fn test_arity_is_strict() {
    assert_eq!(
        rgb_iv(&[1, 2, 3, 4]).unwrap_err(),
        LengthMismatch { expected: 3, actual: 4 },
    );
    assert!(rgb_bv(&[1, 2, 3, 4]).is_err());
    assert!(rgb_fv(&[1.0, 2.0, 3.0, 4.0]).is_err());
    assert!(rgba_iv(&[1, 2, 3]).is_err());
    assert!(rgba_fv(&[]).is_err());
    assert!(hsv_iv(&[1, 2]).is_err());
    assert!(hsva_bv(&[1, 2, 3]).is_err());
    assert!(hsva_colorfv(&[0.0; 5]).is_err());
}

#[test]
fn test_packed_u32() {
    let c = rgba_u32(0xC8FF0064);
    assert_eq!(c, Color::new(100, 0, 255, 200));
    assert_eq!(color_u32(c), 0xC8FF0064);
}

#[test]
fn test_hex() {
    let c = rgba_hex("6400FFC8");
    assert_eq!(c, Color::new(100, 0, 255, 200));
    assert_eq!(color_hex_rgba(c), "6400FFC8");
    assert_eq!(color_hex_rgb(c), "6400FF");

    assert_eq!(rgb_hex("6400FF"), Color::new(100, 0, 255, 255));
    assert_eq!(rgb_hex("#6400ff"), Color::new(100, 0, 255, 255));
    assert_eq!(color_hex_rgba(rgba_hex("#0a0b0c0d")), "0A0B0C0D");
    assert_eq!(color_hex_rgb(Color::new(1, 2, 3, 4)), "010203");
}

#[test]
fn test_hex_malformed_input() {
    // 'z' counts as 74: (74 * 16 + 74) truncated to a byte
    assert_eq!(rgb_hex("zz00FF"), Color::new(234, 0, 255, 255));
    // '-' counts as -3: (-3 * 16 + 1) truncated to a byte
    assert_eq!(rgb_hex("-100FF"), Color::new(209, 0, 255, 255));
    // a missing digit is NUL, counting as -48, so a missing channel is 208
    assert_eq!(rgb_hex("64"), Color::new(100, 208, 208, 255));
    assert_eq!(rgb_hex("g0"), Color::new(112, 208, 208, 255));
    assert_eq!(rgb_hex("6"), Color::new(48, 208, 208, 255));
    assert_eq!(rgba_hex("#6400F"), Color::new(100, 0, 192, 208));
    assert_eq!(rgba_hex(""), Color::new(208, 208, 208, 208));
    assert_eq!(rgb_hex("64\0FF"), rgb_hex("64"));
}

#[test]
fn test_hsv_constructors() {
    let expected = Color::new(102, 0, 255, 255);
    assert_eq!(hsv(187, 255, 255), expected);
    assert_eq!(hsv_iv(&[187, 255, 255]).unwrap(), expected);
    assert_eq!(hsv_bv(&[187, 255, 255]).unwrap(), expected);
    assert_eq!(hsv_f(264.0 / 360.0, 1.0, 1.0), expected);
    assert_eq!(hsv_fv(&[264.0 / 360.0, 1.0, 1.0]).unwrap(), expected);

    let expected = Color::new(102, 0, 255, 200);
    assert_eq!(hsva(187, 255, 255, 200), expected);
    assert_eq!(hsva_iv(&[187, 255, 255, 200]).unwrap(), expected);
    assert_eq!(hsva_bv(&[187, 255, 255, 200]).unwrap(), expected);
    assert_eq!(hsva_f(264.0 / 360.0, 1.0, 1.0, 200.0 / 255.0), expected);
    assert_eq!(hsva_fv(&[264.0 / 360.0, 1.0, 1.0, 200.0 / 255.0]).unwrap(), expected);
}

#[test]
fn test_hsv_primaries() {
    assert_eq!(hsv(0, 255, 255), Color::new(255, 0, 0, 255));
    assert_eq!(hsv(85, 255, 255), Color::new(0, 255, 0, 255));
    assert_eq!(hsv(170, 255, 255), Color::new(0, 0, 255, 255));
    // zero saturation is grey at the given value
    assert_eq!(hsv(123, 0, 255), Color::new(255, 255, 255, 255));
    assert_eq!(hsv(-5, 300, 255), hsv(0, 255, 255));
}

#[test]
fn test_hsva_colorf() {
    let c = hsva_colorf(264.0 / 360.0, 1.0, 1.0, 200.0 / 255.0);
    assert_close(c.r as f64, 102.0 / 255.0);
    assert_close(c.g as f64, 0.0);
    assert_close(c.b as f64, 1.0);
    assert_close(c.a as f64, 200.0 / 255.0);
    assert_eq!(hsva_colorfv(&[264.0 / 360.0, 1.0, 1.0, 200.0 / 255.0]).unwrap(), c);
}

#[test]
fn test_float_conversions() {
    let c = Color::new(100, 0, 255, 200);
    let expected = [100.0 / 255.0, 0.0, 1.0, 200.0 / 255.0];

    let (r, g, b, a) = color_f(c);
    for (got, want) in [r, g, b, a].into_iter().zip(expected) {
        assert_close(got as f64, want);
    }
    let (r, g, b, a) = color_d(c);
    for (got, want) in [r, g, b, a].into_iter().zip(expected) {
        assert_close(got, want);
    }
    assert_eq!(color_dv(c), [r, g, b, a]);

    let (r, g, b, a) = color_f(c);
    assert_eq!(color_fv(c), [r, g, b, a]);
    let cf = color_cf(c);
    assert_eq!([cf.r, cf.g, cf.b, cf.a], [r, g, b, a]);
}

#[test]
fn test_hsv_conversions() {
    let c = Color::new(102, 0, 255, 200);

    assert_eq!(color_hsv_i(c), (186, 255, 255));
    assert_eq!(color_hsv_iv(c), [186, 255, 255]);
    assert_eq!(color_hsv_b(c), (186, 255, 255));
    assert_eq!(color_hsv_bv(c), [186, 255, 255]);
    assert_eq!(color_hsva_i(c), (186, 255, 255, 200));
    assert_eq!(color_hsva_iv(c), [186, 255, 255, 200]);
    assert_eq!(color_hsva_b(c), (186, 255, 255, 200));
    assert_eq!(color_hsva_bv(c), [186, 255, 255, 200]);

    let (h, s, v) = color_hsv_f(c);
    assert_close(h as f64, 187.0 / 255.0);
    assert_close(s as f64, 1.0);
    assert_close(v as f64, 1.0);
    assert_eq!(color_hsv_fv(c), [h, s, v]);

    let [h, s, v, a] = color_hsva_fv(c);
    assert_close(h as f64, 187.0 / 255.0);
    assert_close(s as f64, 1.0);
    assert_close(v as f64, 1.0);
    assert_close(a as f64, 200.0 / 255.0);
    assert_eq!(color_hsva_f(c), (h, s, v, a));

    let cf = Colorf::new(102.0 / 255.0, 0.0, 1.0, 200.0 / 255.0);
    let (h, _, _, a) = colorf_hsva_f(cf);
    assert_close(h as f64, 187.0 / 255.0);
    assert_close(a as f64, 200.0 / 255.0);
    assert_eq!(colorf_hsva_fv(cf)[0], h);
}

#[test]
fn test_hsv_of_red_is_zero_hue() {
    assert_eq!(color_hsva_i(Color::new(255, 0, 0, 255)), (0, 255, 255, 255));
    assert_eq!(color_hsv_i(Color::new(0, 0, 0, 255)), (0, 0, 0));
}

#[test]
fn test_rgb_factor() {
    let c = Color::new(100, 50, 200, 77);
    assert_eq!(rgb_factor(c, 1.0), c);
    assert_eq!(rgb_factor(c, 0.5), Color::new(50, 25, 100, 77));
    assert_eq!(rgb_factor(c, 2.0), Color::new(200, 100, 255, 77));
}
