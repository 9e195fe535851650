//! Host-side value types and their lossless mapping to the wire structs in
//! `sys`.
//!
//! Range coercion happens once, in the constructors. `to_wire` / `from_wire`
//! are pure field-by-field copies, so for any value already within range
//! `from_wire(to_wire(v)) == v`, and for any wire struct
//! `to_wire(from_wire(s)) == s`.

use crate::{
    coerce::{
        LengthMismatch,
        fixed_array,
        saturate,
        saturating,
    },
    sys,
};
use std::ffi::c_void;


/// Type with an exact-layout counterpart passed across the native boundary.
pub trait Wire: Sized {
    type Raw: Copy;

    fn to_wire(&self) -> Self::Raw;

    fn from_wire(raw: Self::Raw) -> Self;
}

macro_rules! wire_identity {
    ($($type:ty),*$(,)?)=>{
        $(
        impl Wire for $type {
            type Raw = $type;

            fn to_wire(&self) -> Self { *self }

            fn from_wire(raw: Self) -> Self { raw }
        }
        )*
    };
}

wire_identity!(u8, i16, u16, u32, f32);

impl<T: Wire, const N: usize> Wire for [T; N] {
    type Raw = [T::Raw; N];

    fn to_wire(&self) -> Self::Raw {
        std::array::from_fn(|i| self[i].to_wire())
    }

    fn from_wire(raw: Self::Raw) -> Self {
        raw.map(T::from_wire)
    }
}

macro_rules! wire_structs {
    ($(
        $host:ident => $raw:ident { $($field:ident),*$(,)? }
    )*)=>{
        $(
        impl Wire for $host {
            type Raw = sys::$raw;

            fn to_wire(&self) -> sys::$raw {
                sys::$raw {
                    $( $field: self.$field.to_wire(), )*
                }
            }

            fn from_wire(raw: sys::$raw) -> Self {
                $host {
                    $( $field: Wire::from_wire(raw.$field), )*
                }
            }
        }
        )*
    };
}


#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Colorf {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colorf {
    /// Channels are saturated into `[0.0, 1.0]`, NaN to 0.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Colorf {
            r: saturate(r),
            g: saturate(g),
            b: saturate(b),
            a: saturate(a),
        }
    }

    /// Channels exactly as computed by the color functions, which like their
    /// native counterparts don't clamp their output.
    pub(crate) const fn unclamped(r: f32, g: f32, b: f32, a: f32) -> Self {
        Colorf { r, g, b, a }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Vec2i {
    pub x: i16,
    pub y: i16,
}

impl Vec2i {
    pub const fn new(x: i16, y: i16) -> Self {
        Vec2i { x, y }
    }

    /// Construct from wider integers, capping each at the `short` bounds.
    pub fn saturating<T: Into<i128>>(x: T, y: T) -> Self {
        Vec2i {
            x: saturating(x),
            y: saturating(y),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Rect { x, y, w, h }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Recti {
    pub x: i16,
    pub y: i16,
    pub w: i16,
    pub h: i16,
}

impl Recti {
    pub const fn new(x: i16, y: i16, w: i16, h: i16) -> Self {
        Recti { x, y, w, h }
    }

    /// Construct from wider integers, capping each at the `short` bounds.
    pub fn saturating<T: Into<i128>>(x: T, y: T, w: T, h: T) -> Self {
        Recti {
            x: saturating(x),
            y: saturating(y),
            w: saturating(w),
            h: saturating(h),
        }
    }
}

/// Either an address or an integer id, as `nk_handle`. Which interpretation
/// is valid is up to the use site; equality compares the whole storage.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Handle(sys::nk_handle);

impl Handle {
    pub fn ptr(ptr: *mut c_void) -> Self {
        Handle(sys::nk_handle::from_ptr(ptr))
    }

    pub fn id(id: i32) -> Self {
        Handle(sys::nk_handle::from_id(id))
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0.ptr()
    }

    pub fn as_id(&self) -> i32 {
        self.0.id()
    }
}

impl Wire for Handle {
    type Raw = sys::nk_handle;

    fn to_wire(&self) -> sys::nk_handle {
        self.0
    }

    fn from_wire(raw: sys::nk_handle) -> Self {
        Handle(raw)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub handle: Handle,
    pub w: u16,
    pub h: u16,
    pub region: [u16; 4],
}

impl Image {
    /// Image covering the whole of a `w` by `h` texture.
    pub fn new(handle: Handle, w: u16, h: u16) -> Self {
        Image {
            handle,
            w,
            h,
            region: [0, 0, w, h],
        }
    }

    /// Construct with a sub-region given as a sequence, which must hold
    /// exactly 4 elements (x, y, w, h).
    pub fn from_region_slice(
        handle: Handle,
        w: u16,
        h: u16,
        region: &[u16],
    ) -> Result<Self, LengthMismatch> {
        Ok(Image {
            handle,
            w,
            h,
            region: fixed_array(region)?,
        })
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct NineSlice {
    pub img: Image,
    pub l: u16,
    pub t: u16,
    pub r: u16,
    pub b: u16,
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Cursor {
    pub img: Image,
    pub size: Vec2,
    pub offset: Vec2,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scroll {
    pub x: u32,
    pub y: u32,
}

wire_structs! {
    Color => nk_color { r, g, b, a }
    Colorf => nk_colorf { r, g, b, a }
    Vec2 => nk_vec2 { x, y }
    Vec2i => nk_vec2i { x, y }
    Rect => nk_rect { x, y, w, h }
    Recti => nk_recti { x, y, w, h }
    Image => nk_image { handle, w, h, region }
    NineSlice => nk_nine_slice { img, l, t, r, b }
    Cursor => nk_cursor { img, size, offset }
    Scroll => nk_scroll { x, y }
}


// interop with vek math types

impl From<vek::Rgba<u8>> for Color {
    fn from(c: vek::Rgba<u8>) -> Self {
        Color::new(c.r, c.g, c.b, c.a)
    }
}

impl From<Color> for vek::Rgba<u8> {
    fn from(c: Color) -> Self {
        vek::Rgba::new(c.r, c.g, c.b, c.a)
    }
}

impl From<vek::Rgba<f32>> for Colorf {
    fn from(c: vek::Rgba<f32>) -> Self {
        Colorf::new(c.r, c.g, c.b, c.a)
    }
}

impl From<Colorf> for vek::Rgba<f32> {
    fn from(c: Colorf) -> Self {
        vek::Rgba::new(c.r, c.g, c.b, c.a)
    }
}

impl From<vek::Vec2<f32>> for Vec2 {
    fn from(v: vek::Vec2<f32>) -> Self {
        Vec2::new(v.x, v.y)
    }
}

impl From<Vec2> for vek::Vec2<f32> {
    fn from(v: Vec2) -> Self {
        vek::Vec2::new(v.x, v.y)
    }
}

impl From<vek::Vec2<i16>> for Vec2i {
    fn from(v: vek::Vec2<i16>) -> Self {
        Vec2i::new(v.x, v.y)
    }
}

impl From<Vec2i> for vek::Vec2<i16> {
    fn from(v: Vec2i) -> Self {
        vek::Vec2::new(v.x, v.y)
    }
}

impl From<vek::Rect<f32, f32>> for Rect {
    fn from(r: vek::Rect<f32, f32>) -> Self {
        Rect::new(r.x, r.y, r.w, r.h)
    }
}

impl From<Rect> for vek::Rect<f32, f32> {
    fn from(r: Rect) -> Self {
        vek::Rect::new(r.x, r.y, r.w, r.h)
    }
}


#[cfg(test)]
fn assert_round_trips<T>(v: T)
where
    T: Wire + PartialEq + std::fmt::Debug,
    T::Raw: PartialEq + std::fmt::Debug,
{
    let raw = v.to_wire();
    let back = T::from_wire(raw);
    assert_eq!(back, v);
    assert_eq!(back.to_wire(), raw);
}

#[test]
fn test_value_structs_round_trip() {
    let img = Image::from_region_slice(Handle::id(42), 64, 32, &[1, 2, 30, 40])
        .unwrap();

    assert_round_trips(Color::new(100, 0, 255, 200));
    assert_round_trips(Colorf::new(0.25, 0.0, 1.0, 0.5));
    assert_round_trips(Vec2::new(-3.5, 8.0));
    assert_round_trips(Vec2i::new(i16::MIN, i16::MAX));
    assert_round_trips(Rect::new(1.0, 2.0, 300.0, 400.0));
    assert_round_trips(Recti::new(-1, 2, 300, 400));
    assert_round_trips(Handle::ptr(0x1000 as *mut c_void));
    assert_round_trips(Handle::id(-5));
    assert_round_trips(img);
    assert_round_trips(NineSlice { img, l: 4, t: 4, r: 8, b: 8 });
    assert_round_trips(Cursor {
        img,
        size: Vec2::new(16.0, 16.0),
        offset: Vec2::new(-1.0, -2.0),
    });
    assert_round_trips(Scroll { x: u32::MAX, y: 7 });
}

#[test]
fn test_wire_fields_land_in_place() {
    let raw = Image::new(Handle::id(3), 10, 20).to_wire();
    assert_eq!(raw.handle.id(), 3);
    assert_eq!((raw.w, raw.h), (10, 20));
    assert_eq!(raw.region, [0, 0, 10, 20]);

    let raw = sys::nk_recti { x: 1, y: 2, w: 3, h: 4 };
    assert_eq!(Recti::from_wire(raw), Recti::new(1, 2, 3, 4));
}

#[test]
fn test_image_region_arity() {
    let err = Image::from_region_slice(Handle::default(), 1, 1, &[1, 2, 3])
        .unwrap_err();
    assert_eq!(err, LengthMismatch { expected: 4, actual: 3 });
    assert!(Image::from_region_slice(Handle::default(), 1, 1, &[1, 2, 3, 4, 5]).is_err());
}

#[test]
fn test_saturating_constructors() {
    assert_eq!(Vec2i::saturating(70_000i64, -70_000), Vec2i::new(i16::MAX, i16::MIN));
    assert_eq!(Recti::saturating(1i32, 2, 3, 40_000), Recti::new(1, 2, 3, i16::MAX));
}

#[test]
fn test_colorf_saturates() {
    assert_eq!(
        Colorf::new(-0.1, 1.1, 0.5, 2.0),
        Colorf { r: 0.0, g: 1.0, b: 0.5, a: 1.0 },
    );
    assert_eq!(Colorf::new(f32::NAN, 0.25, f32::INFINITY, -0.0).r, 0.0);
    assert_eq!(Colorf::new(f32::NAN, 0.25, f32::INFINITY, -0.0).b, 1.0);

    let c: Colorf = vek::Rgba::new(-5.0f32, 9.0, 0.75, 1.0).into();
    assert_eq!(c, Colorf { r: 0.0, g: 1.0, b: 0.75, a: 1.0 });

    // the wire path copies whatever the native side produced
    let raw = sys::nk_colorf { r: -5.0, g: 9.0, b: 0.75, a: 1.0 };
    let c = Colorf::from_wire(raw);
    assert_eq!((c.r, c.g), (-5.0, 9.0));
    assert_eq!(c.to_wire(), raw);
}

#[test]
fn test_handle_interpretations() {
    let mut slot = 0u32;
    let p = &mut slot as *mut u32 as *mut c_void;
    assert_eq!(Handle::ptr(p).as_ptr(), p);
    assert_eq!(Handle::id(9).as_id(), 9);
    assert_ne!(Handle::id(9), Handle::id(10));
}

#[test]
fn test_vek_interop() {
    let c: Color = vek::Rgba::new(1u8, 2, 3, 4).into();
    assert_eq!(c, Color::new(1, 2, 3, 4));
    let back: vek::Rgba<u8> = c.into();
    assert_eq!(back, vek::Rgba::new(1, 2, 3, 4));

    let r: Rect = vek::Rect::new(1.0f32, 2.0, 3.0, 4.0).into();
    assert_eq!(r, Rect::new(1.0, 2.0, 3.0, 4.0));
    let v: vek::Vec2<i16> = Vec2i::new(5, 6).into();
    assert_eq!(v, vek::Vec2::new(5, 6));
}
