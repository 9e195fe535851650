//! The loaded native library and its bound functions.

use crate::{
    callback::PluginFilter,
    coerce::{
        LengthMismatch,
        fixed_array,
    },
    handle::NativeRef,
    probe::{
        GetVersionFn,
        VERSION_SYMBOL,
    },
    sys::{
        nk_bool,
        nk_byte,
        nk_color,
        nk_colorf,
        nk_false,
        nk_rune,
        nk_text_edit,
        nk_uint,
    },
    value::{
        Color,
        Colorf,
        Wire,
    },
    version::Version,
};
use std::{
    ffi::{
        CString,
        c_char,
        c_int,
    },
    fmt::{self, Debug, Formatter},
    path::{
        Path,
        PathBuf,
    },
};
use anyhow::{
    Result,
    Context,
};
use libloading::Library;


/// `#`, 8 hex digits and a NUL.
const HEX_BUF_LEN: usize = 10;


/// Resolve `name` from `library` as a `T`, which must be the symbol's exact
/// function pointer type.
unsafe fn symbol<T: Copy>(library: &Library, name: &str) -> Result<T> {
    let symbol = unsafe { library.get::<T>(name.as_bytes()) }
        .with_context(|| format!("missing symbol {}", name))?;
    Ok(*symbol)
}

macro_rules! native_fns {
    ($(
        $field:ident = $sym:literal: fn($($arg:ty),*) $(-> $ret:ty)?;
    )*)=>{
        struct Fns {
            $( $field: unsafe extern "C" fn($($arg),*) $(-> $ret)?, )*
        }

        impl Fns {
            unsafe fn resolve(library: &Library) -> Result<Self> {
                Ok(Fns {
                    $( $field: unsafe { symbol(library, $sym)? }, )*
                })
            }
        }
    };
}

native_fns! {
    rgb = "nk_rgb": fn(c_int, c_int, c_int) -> nk_color;
    rgb_iv = "nk_rgb_iv": fn(*const c_int) -> nk_color;
    rgb_bv = "nk_rgb_bv": fn(*const nk_byte) -> nk_color;
    rgb_f = "nk_rgb_f": fn(f32, f32, f32) -> nk_color;
    rgb_fv = "nk_rgb_fv": fn(*const f32) -> nk_color;
    rgb_cf = "nk_rgb_cf": fn(nk_colorf) -> nk_color;
    rgb_hex = "nk_rgb_hex": fn(*const c_char) -> nk_color;

    rgba = "nk_rgba": fn(c_int, c_int, c_int, c_int) -> nk_color;
    rgba_u32 = "nk_rgba_u32": fn(nk_uint) -> nk_color;
    rgba_iv = "nk_rgba_iv": fn(*const c_int) -> nk_color;
    rgba_bv = "nk_rgba_bv": fn(*const nk_byte) -> nk_color;
    rgba_f = "nk_rgba_f": fn(f32, f32, f32, f32) -> nk_color;
    rgba_fv = "nk_rgba_fv": fn(*const f32) -> nk_color;
    rgba_cf = "nk_rgba_cf": fn(nk_colorf) -> nk_color;
    rgba_hex = "nk_rgba_hex": fn(*const c_char) -> nk_color;

    hsv = "nk_hsv": fn(c_int, c_int, c_int) -> nk_color;
    hsv_iv = "nk_hsv_iv": fn(*const c_int) -> nk_color;
    hsv_bv = "nk_hsv_bv": fn(*const nk_byte) -> nk_color;
    hsv_f = "nk_hsv_f": fn(f32, f32, f32) -> nk_color;
    hsv_fv = "nk_hsv_fv": fn(*const f32) -> nk_color;

    hsva = "nk_hsva": fn(c_int, c_int, c_int, c_int) -> nk_color;
    hsva_iv = "nk_hsva_iv": fn(*const c_int) -> nk_color;
    hsva_bv = "nk_hsva_bv": fn(*const nk_byte) -> nk_color;
    hsva_f = "nk_hsva_f": fn(f32, f32, f32, f32) -> nk_color;
    hsva_fv = "nk_hsva_fv": fn(*const f32) -> nk_color;
    hsva_colorf = "nk_hsva_colorf": fn(f32, f32, f32, f32) -> nk_colorf;
    hsva_colorfv = "nk_hsva_colorfv": fn(*const f32) -> nk_colorf;

    color_f = "nk_color_f": fn(*mut f32, *mut f32, *mut f32, *mut f32, nk_color);
    color_fv = "nk_color_fv": fn(*mut f32, nk_color);
    color_cf = "nk_color_cf": fn(nk_color) -> nk_colorf;
    color_d = "nk_color_d": fn(*mut f64, *mut f64, *mut f64, *mut f64, nk_color);
    color_dv = "nk_color_dv": fn(*mut f64, nk_color);
    color_u32 = "nk_color_u32": fn(nk_color) -> nk_uint;
    color_hex_rgba = "nk_color_hex_rgba": fn(*mut c_char, nk_color);
    color_hex_rgb = "nk_color_hex_rgb": fn(*mut c_char, nk_color);

    color_hsv_i = "nk_color_hsv_i": fn(*mut c_int, *mut c_int, *mut c_int, nk_color);
    color_hsv_b = "nk_color_hsv_b": fn(*mut nk_byte, *mut nk_byte, *mut nk_byte, nk_color);
    color_hsv_iv = "nk_color_hsv_iv": fn(*mut c_int, nk_color);
    color_hsv_bv = "nk_color_hsv_bv": fn(*mut nk_byte, nk_color);
    color_hsv_f = "nk_color_hsv_f": fn(*mut f32, *mut f32, *mut f32, nk_color);
    color_hsv_fv = "nk_color_hsv_fv": fn(*mut f32, nk_color);

    color_hsva_i = "nk_color_hsva_i": fn(*mut c_int, *mut c_int, *mut c_int, *mut c_int, nk_color);
    color_hsva_b = "nk_color_hsva_b": fn(*mut nk_byte, *mut nk_byte, *mut nk_byte, *mut nk_byte, nk_color);
    color_hsva_iv = "nk_color_hsva_iv": fn(*mut c_int, nk_color);
    color_hsva_bv = "nk_color_hsva_bv": fn(*mut nk_byte, nk_color);
    color_hsva_f = "nk_color_hsva_f": fn(*mut f32, *mut f32, *mut f32, *mut f32, nk_color);
    color_hsva_fv = "nk_color_hsva_fv": fn(*mut f32, nk_color);

    colorf_hsva_f = "nk_colorf_hsva_f": fn(*mut f32, *mut f32, *mut f32, *mut f32, nk_colorf);
    colorf_hsva_fv = "nk_colorf_hsva_fv": fn(*mut f32, nk_colorf);

    filter_default = "nk_filter_default": fn(*const nk_text_edit, nk_rune) -> nk_bool;
    filter_ascii = "nk_filter_ascii": fn(*const nk_text_edit, nk_rune) -> nk_bool;
    filter_float = "nk_filter_float": fn(*const nk_text_edit, nk_rune) -> nk_bool;
    filter_decimal = "nk_filter_decimal": fn(*const nk_text_edit, nk_rune) -> nk_bool;
    filter_hex = "nk_filter_hex": fn(*const nk_text_edit, nk_rune) -> nk_bool;
    filter_oct = "nk_filter_oct": fn(*const nk_text_edit, nk_rune) -> nk_bool;
    filter_binary = "nk_filter_binary": fn(*const nk_text_edit, nk_rune) -> nk_bool;

    textedit_text = "nk_textedit_text": fn(*mut nk_text_edit, *const c_char, c_int);
    textedit_delete = "nk_textedit_delete": fn(*mut nk_text_edit, c_int, c_int);
    textedit_delete_selection = "nk_textedit_delete_selection": fn(*mut nk_text_edit);
    textedit_select_all = "nk_textedit_select_all": fn(*mut nk_text_edit);
    textedit_cut = "nk_textedit_cut": fn(*mut nk_text_edit) -> nk_bool;
    textedit_paste = "nk_textedit_paste": fn(*mut nk_text_edit, *const c_char, c_int) -> nk_bool;
    textedit_undo = "nk_textedit_undo": fn(*mut nk_text_edit);
    textedit_redo = "nk_textedit_redo": fn(*mut nk_text_edit);
}

type RgbFactorFn = unsafe extern "C" fn(nk_color, f32) -> nk_color;


/// Built-in text-edit input filters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Filter {
    Default,
    Ascii,
    Float,
    Decimal,
    Hex,
    Oct,
    Binary,
}

impl Filter {
    pub const ALL: &'static [Filter] = &[
        Filter::Default,
        Filter::Ascii,
        Filter::Float,
        Filter::Decimal,
        Filter::Hex,
        Filter::Oct,
        Filter::Binary,
    ];
}


/// A loaded native library with all its bound functions resolved.
///
/// Each method calls the native function of the same name, taking and
/// returning host value types.
pub struct Nuklear {
    path: PathBuf,
    version: Option<Version>,
    fns: Fns,
    rgb_factor: Option<RgbFactorFn>,
    library: Library,
    runtime: Option<Library>,
}

impl Nuklear {
    /// Load the library at `path` and resolve every bound function. With
    /// `preview`, also try to bind preview functions, which may be absent.
    pub fn open(path: &Path, preview: bool) -> Result<Self> {
        let library = unsafe { Library::new(path) }
            .with_context(|| format!("loading {}", path.display()))?;
        Nuklear::from_library(library, path.to_path_buf(), preview)
    }

    fn from_library(library: Library, path: PathBuf, preview: bool) -> Result<Self> {
        let fns = unsafe { Fns::resolve(&library) }
            .with_context(|| format!("binding {}", path.display()))?;

        let rgb_factor =
            if preview {
                match unsafe { symbol::<RgbFactorFn>(&library, "nk_rgb_factor") } {
                    Ok(f) => Some(f),
                    Err(e) => {
                        warn!(%e, "preview function unavailable");
                        None
                    }
                }
            } else {
                None
            };

        let version = unsafe { symbol::<GetVersionFn>(&library, version_symbol_name()) }
            .ok()
            .map(|get_version| {
                let (mut major, mut minor, mut rev) = (0, 0, 0);
                unsafe { get_version(&mut major, &mut minor, &mut rev) };
                Version::new(major, minor, rev)
            });

        info!(
            path=%path.display(),
            version=?version,
            preview,
            "loaded nuklear",
        );

        Ok(Nuklear {
            path,
            version,
            fns,
            rgb_factor,
            library,
            runtime: None,
        })
    }

    /// Keep `runtime` loaded for as long as this library is.
    pub(crate) fn with_runtime(mut self, runtime: Option<Library>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn has_preview(&self) -> bool {
        self.rgb_factor.is_some()
    }

    // ==== color construction ====

    pub fn rgb(&self, r: i32, g: i32, b: i32) -> Color {
        Color::from_wire(unsafe { (self.fns.rgb)(r, g, b) })
    }

    pub fn rgb_iv(&self, rgb: &[i32]) -> Result<Color, LengthMismatch> {
        let rgb: [c_int; 3] = fixed_array(rgb)?;
        Ok(Color::from_wire(unsafe { (self.fns.rgb_iv)(rgb.as_ptr()) }))
    }

    pub fn rgb_bv(&self, rgb: &[u8]) -> Result<Color, LengthMismatch> {
        let rgb: [nk_byte; 3] = fixed_array(rgb)?;
        Ok(Color::from_wire(unsafe { (self.fns.rgb_bv)(rgb.as_ptr()) }))
    }

    pub fn rgb_f(&self, r: f32, g: f32, b: f32) -> Color {
        Color::from_wire(unsafe { (self.fns.rgb_f)(r, g, b) })
    }

    pub fn rgb_fv(&self, rgb: &[f32]) -> Result<Color, LengthMismatch> {
        let rgb: [f32; 3] = fixed_array(rgb)?;
        Ok(Color::from_wire(unsafe { (self.fns.rgb_fv)(rgb.as_ptr()) }))
    }

    pub fn rgb_cf(&self, c: Colorf) -> Color {
        Color::from_wire(unsafe { (self.fns.rgb_cf)(c.to_wire()) })
    }

    pub fn rgb_hex(&self, rgb: &str) -> Color {
        let rgb = hex_c_buf(rgb);
        Color::from_wire(unsafe { (self.fns.rgb_hex)(rgb.as_ptr()) })
    }

    pub fn rgba(&self, r: i32, g: i32, b: i32, a: i32) -> Color {
        Color::from_wire(unsafe { (self.fns.rgba)(r, g, b, a) })
    }

    pub fn rgba_u32(&self, rgba: u32) -> Color {
        Color::from_wire(unsafe { (self.fns.rgba_u32)(rgba) })
    }

    pub fn rgba_iv(&self, rgba: &[i32]) -> Result<Color, LengthMismatch> {
        let rgba: [c_int; 4] = fixed_array(rgba)?;
        Ok(Color::from_wire(unsafe { (self.fns.rgba_iv)(rgba.as_ptr()) }))
    }

    pub fn rgba_bv(&self, rgba: &[u8]) -> Result<Color, LengthMismatch> {
        let rgba: [nk_byte; 4] = fixed_array(rgba)?;
        Ok(Color::from_wire(unsafe { (self.fns.rgba_bv)(rgba.as_ptr()) }))
    }

    pub fn rgba_f(&self, r: f32, g: f32, b: f32, a: f32) -> Color {
        Color::from_wire(unsafe { (self.fns.rgba_f)(r, g, b, a) })
    }

    pub fn rgba_fv(&self, rgba: &[f32]) -> Result<Color, LengthMismatch> {
        let rgba: [f32; 4] = fixed_array(rgba)?;
        Ok(Color::from_wire(unsafe { (self.fns.rgba_fv)(rgba.as_ptr()) }))
    }

    pub fn rgba_cf(&self, c: Colorf) -> Color {
        Color::from_wire(unsafe { (self.fns.rgba_cf)(c.to_wire()) })
    }

    pub fn rgba_hex(&self, rgba: &str) -> Color {
        let rgba = hex_c_buf(rgba);
        Color::from_wire(unsafe { (self.fns.rgba_hex)(rgba.as_ptr()) })
    }

    /// `None` unless preview functions were requested and found.
    pub fn rgb_factor(&self, c: Color, factor: f32) -> Option<Color> {
        self.rgb_factor
            .map(|f| Color::from_wire(unsafe { f(c.to_wire(), factor) }))
    }

    pub fn hsv(&self, h: i32, s: i32, v: i32) -> Color {
        Color::from_wire(unsafe { (self.fns.hsv)(h, s, v) })
    }

    pub fn hsv_iv(&self, hsv: &[i32]) -> Result<Color, LengthMismatch> {
        let hsv: [c_int; 3] = fixed_array(hsv)?;
        Ok(Color::from_wire(unsafe { (self.fns.hsv_iv)(hsv.as_ptr()) }))
    }

    pub fn hsv_bv(&self, hsv: &[u8]) -> Result<Color, LengthMismatch> {
        let hsv: [nk_byte; 3] = fixed_array(hsv)?;
        Ok(Color::from_wire(unsafe { (self.fns.hsv_bv)(hsv.as_ptr()) }))
    }

    pub fn hsv_f(&self, h: f32, s: f32, v: f32) -> Color {
        Color::from_wire(unsafe { (self.fns.hsv_f)(h, s, v) })
    }

    pub fn hsv_fv(&self, hsv: &[f32]) -> Result<Color, LengthMismatch> {
        let hsv: [f32; 3] = fixed_array(hsv)?;
        Ok(Color::from_wire(unsafe { (self.fns.hsv_fv)(hsv.as_ptr()) }))
    }

    pub fn hsva(&self, h: i32, s: i32, v: i32, a: i32) -> Color {
        Color::from_wire(unsafe { (self.fns.hsva)(h, s, v, a) })
    }

    pub fn hsva_iv(&self, hsva: &[i32]) -> Result<Color, LengthMismatch> {
        let hsva: [c_int; 4] = fixed_array(hsva)?;
        Ok(Color::from_wire(unsafe { (self.fns.hsva_iv)(hsva.as_ptr()) }))
    }

    pub fn hsva_bv(&self, hsva: &[u8]) -> Result<Color, LengthMismatch> {
        let hsva: [nk_byte; 4] = fixed_array(hsva)?;
        Ok(Color::from_wire(unsafe { (self.fns.hsva_bv)(hsva.as_ptr()) }))
    }

    pub fn hsva_f(&self, h: f32, s: f32, v: f32, a: f32) -> Color {
        Color::from_wire(unsafe { (self.fns.hsva_f)(h, s, v, a) })
    }

    pub fn hsva_fv(&self, hsva: &[f32]) -> Result<Color, LengthMismatch> {
        let hsva: [f32; 4] = fixed_array(hsva)?;
        Ok(Color::from_wire(unsafe { (self.fns.hsva_fv)(hsva.as_ptr()) }))
    }

    pub fn hsva_colorf(&self, h: f32, s: f32, v: f32, a: f32) -> Colorf {
        Colorf::from_wire(unsafe { (self.fns.hsva_colorf)(h, s, v, a) })
    }

    pub fn hsva_colorfv(&self, hsva: &[f32]) -> Result<Colorf, LengthMismatch> {
        let hsva: [f32; 4] = fixed_array(hsva)?;
        Ok(Colorf::from_wire(unsafe { (self.fns.hsva_colorfv)(hsva.as_ptr()) }))
    }

    // ==== color conversion ====

    pub fn color_f(&self, c: Color) -> (f32, f32, f32, f32) {
        let (mut r, mut g, mut b, mut a) = (0.0, 0.0, 0.0, 0.0);
        unsafe { (self.fns.color_f)(&mut r, &mut g, &mut b, &mut a, c.to_wire()) };
        (r, g, b, a)
    }

    pub fn color_fv(&self, c: Color) -> [f32; 4] {
        let mut rgba = [0.0; 4];
        unsafe { (self.fns.color_fv)(rgba.as_mut_ptr(), c.to_wire()) };
        rgba
    }

    pub fn color_cf(&self, c: Color) -> Colorf {
        Colorf::from_wire(unsafe { (self.fns.color_cf)(c.to_wire()) })
    }

    pub fn color_d(&self, c: Color) -> (f64, f64, f64, f64) {
        let (mut r, mut g, mut b, mut a) = (0.0, 0.0, 0.0, 0.0);
        unsafe { (self.fns.color_d)(&mut r, &mut g, &mut b, &mut a, c.to_wire()) };
        (r, g, b, a)
    }

    pub fn color_dv(&self, c: Color) -> [f64; 4] {
        let mut rgba = [0.0; 4];
        unsafe { (self.fns.color_dv)(rgba.as_mut_ptr(), c.to_wire()) };
        rgba
    }

    pub fn color_u32(&self, c: Color) -> u32 {
        unsafe { (self.fns.color_u32)(c.to_wire()) }
    }

    pub fn color_hex_rgba(&self, c: Color) -> String {
        let mut out = [0 as c_char; HEX_BUF_LEN];
        unsafe { (self.fns.color_hex_rgba)(out.as_mut_ptr(), c.to_wire()) };
        from_c_buf(&out)
    }

    pub fn color_hex_rgb(&self, c: Color) -> String {
        let mut out = [0 as c_char; HEX_BUF_LEN];
        unsafe { (self.fns.color_hex_rgb)(out.as_mut_ptr(), c.to_wire()) };
        from_c_buf(&out)
    }

    pub fn color_hsv_i(&self, c: Color) -> (i32, i32, i32) {
        let (mut h, mut s, mut v) = (0, 0, 0);
        unsafe { (self.fns.color_hsv_i)(&mut h, &mut s, &mut v, c.to_wire()) };
        (h, s, v)
    }

    pub fn color_hsv_b(&self, c: Color) -> (u8, u8, u8) {
        let (mut h, mut s, mut v) = (0, 0, 0);
        unsafe { (self.fns.color_hsv_b)(&mut h, &mut s, &mut v, c.to_wire()) };
        (h, s, v)
    }

    pub fn color_hsv_iv(&self, c: Color) -> [i32; 3] {
        let mut hsv = [0; 3];
        unsafe { (self.fns.color_hsv_iv)(hsv.as_mut_ptr(), c.to_wire()) };
        hsv
    }

    pub fn color_hsv_bv(&self, c: Color) -> [u8; 3] {
        let mut hsv = [0; 3];
        unsafe { (self.fns.color_hsv_bv)(hsv.as_mut_ptr(), c.to_wire()) };
        hsv
    }

    pub fn color_hsv_f(&self, c: Color) -> (f32, f32, f32) {
        let (mut h, mut s, mut v) = (0.0, 0.0, 0.0);
        unsafe { (self.fns.color_hsv_f)(&mut h, &mut s, &mut v, c.to_wire()) };
        (h, s, v)
    }

    pub fn color_hsv_fv(&self, c: Color) -> [f32; 3] {
        let mut hsv = [0.0; 3];
        unsafe { (self.fns.color_hsv_fv)(hsv.as_mut_ptr(), c.to_wire()) };
        hsv
    }

    pub fn color_hsva_i(&self, c: Color) -> (i32, i32, i32, i32) {
        let (mut h, mut s, mut v, mut a) = (0, 0, 0, 0);
        unsafe { (self.fns.color_hsva_i)(&mut h, &mut s, &mut v, &mut a, c.to_wire()) };
        (h, s, v, a)
    }

    pub fn color_hsva_b(&self, c: Color) -> (u8, u8, u8, u8) {
        let (mut h, mut s, mut v, mut a) = (0, 0, 0, 0);
        unsafe { (self.fns.color_hsva_b)(&mut h, &mut s, &mut v, &mut a, c.to_wire()) };
        (h, s, v, a)
    }

    pub fn color_hsva_iv(&self, c: Color) -> [i32; 4] {
        let mut hsva = [0; 4];
        unsafe { (self.fns.color_hsva_iv)(hsva.as_mut_ptr(), c.to_wire()) };
        hsva
    }

    pub fn color_hsva_bv(&self, c: Color) -> [u8; 4] {
        let mut hsva = [0; 4];
        unsafe { (self.fns.color_hsva_bv)(hsva.as_mut_ptr(), c.to_wire()) };
        hsva
    }

    pub fn color_hsva_f(&self, c: Color) -> (f32, f32, f32, f32) {
        let (mut h, mut s, mut v, mut a) = (0.0, 0.0, 0.0, 0.0);
        unsafe { (self.fns.color_hsva_f)(&mut h, &mut s, &mut v, &mut a, c.to_wire()) };
        (h, s, v, a)
    }

    pub fn color_hsva_fv(&self, c: Color) -> [f32; 4] {
        let mut hsva = [0.0; 4];
        unsafe { (self.fns.color_hsva_fv)(hsva.as_mut_ptr(), c.to_wire()) };
        hsva
    }

    pub fn colorf_hsva_f(&self, c: Colorf) -> (f32, f32, f32, f32) {
        let (mut h, mut s, mut v, mut a) = (0.0, 0.0, 0.0, 0.0);
        unsafe { (self.fns.colorf_hsva_f)(&mut h, &mut s, &mut v, &mut a, c.to_wire()) };
        (h, s, v, a)
    }

    pub fn colorf_hsva_fv(&self, c: Colorf) -> [f32; 4] {
        let mut hsva = [0.0; 4];
        unsafe { (self.fns.colorf_hsva_fv)(hsva.as_mut_ptr(), c.to_wire()) };
        hsva
    }

    // ==== text editing ====

    /// The native filter function, to be handed to native edit widgets.
    pub fn filter(&self, filter: Filter) -> PluginFilter {
        Some(match filter {
            Filter::Default => self.fns.filter_default,
            Filter::Ascii => self.fns.filter_ascii,
            Filter::Float => self.fns.filter_float,
            Filter::Decimal => self.fns.filter_decimal,
            Filter::Hex => self.fns.filter_hex,
            Filter::Oct => self.fns.filter_oct,
            Filter::Binary => self.fns.filter_binary,
        })
    }

    /// Whether `filter` lets `rune` be typed. The built-in filters only
    /// look at the rune, so `edit` may be omitted.
    pub fn filter_accepts(
        &self,
        filter: Filter,
        edit: Option<NativeRef<'_, nk_text_edit>>,
        rune: char,
    ) -> bool {
        let edit = edit
            .map(|edit| edit.as_ptr() as *const nk_text_edit)
            .unwrap_or(std::ptr::null());
        self.filter(filter)
            .map(|f| unsafe { f(edit, rune as nk_rune) } != nk_false)
            .unwrap_or(false)
    }

    pub fn textedit_text(&self, edit: NativeRef<'_, nk_text_edit>, text: &str) {
        unsafe {
            (self.fns.textedit_text)(
                edit.as_ptr(),
                text.as_ptr() as *const c_char,
                text_len(text),
            )
        };
    }

    pub fn textedit_delete(&self, edit: NativeRef<'_, nk_text_edit>, at: i32, len: i32) {
        unsafe { (self.fns.textedit_delete)(edit.as_ptr(), at, len) };
    }

    pub fn textedit_delete_selection(&self, edit: NativeRef<'_, nk_text_edit>) {
        unsafe { (self.fns.textedit_delete_selection)(edit.as_ptr()) };
    }

    pub fn textedit_select_all(&self, edit: NativeRef<'_, nk_text_edit>) {
        unsafe { (self.fns.textedit_select_all)(edit.as_ptr()) };
    }

    pub fn textedit_cut(&self, edit: NativeRef<'_, nk_text_edit>) -> bool {
        unsafe { (self.fns.textedit_cut)(edit.as_ptr()) != nk_false }
    }

    pub fn textedit_paste(&self, edit: NativeRef<'_, nk_text_edit>, text: &str) -> bool {
        unsafe {
            (self.fns.textedit_paste)(
                edit.as_ptr(),
                text.as_ptr() as *const c_char,
                text_len(text),
            ) != nk_false
        }
    }

    pub fn textedit_undo(&self, edit: NativeRef<'_, nk_text_edit>) {
        unsafe { (self.fns.textedit_undo)(edit.as_ptr()) };
    }

    pub fn textedit_redo(&self, edit: NativeRef<'_, nk_text_edit>) {
        unsafe { (self.fns.textedit_redo)(edit.as_ptr()) };
    }
}

impl Debug for Nuklear {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Nuklear")
            .field("path", &self.path)
            .field("version", &self.version)
            .field("preview", &self.has_preview())
            .finish_non_exhaustive()
    }
}

fn version_symbol_name() -> &'static str {
    std::str::from_utf8(&VERSION_SYMBOL[..VERSION_SYMBOL.len() - 1]).unwrap_or("nk_get_version")
}

/// Native code reads up to the first NUL, so drop anything after one.
fn c_string(s: &str) -> CString {
    let s = s.split('\0').next().unwrap_or("");
    CString::new(s).unwrap_or_default()
}

/// NUL-terminated copy of a hex color string, padded with NULs so the native
/// parser, which indexes up to `#` plus 8 digits without checking for the end,
/// stays inside the buffer.
fn hex_c_buf(s: &str) -> Vec<c_char> {
    let mut buf: Vec<c_char> = c_string(s).as_bytes()
        .iter()
        .map(|&b| b as c_char)
        .collect();
    buf.resize(buf.len().max(HEX_BUF_LEN - 1) + 1, 0);
    buf
}

fn from_c_buf(buf: &[c_char]) -> String {
    let bytes: Vec<u8> = buf.iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Lengths beyond `int` are cut at the last whole character that fits.
fn text_len(text: &str) -> c_int {
    if let Ok(len) = c_int::try_from(text.len()) {
        return len;
    }
    let mut len = c_int::MAX as usize;
    while !text.is_char_boundary(len) {
        len -= 1;
    }
    len as c_int
}


#[test]
fn test_c_string_helpers() {
    assert_eq!(c_string("6400FFC8").as_bytes(), b"6400FFC8");
    assert_eq!(c_string("64\000FF").as_bytes(), b"64");
    assert_eq!(hex_c_buf("64").len(), HEX_BUF_LEN);
    assert!(hex_c_buf("64")[2..].iter().all(|&c| c == 0));
    let long = hex_c_buf("#6400FFC8ABCD");
    assert_eq!(long.len(), 14);
    assert_eq!(long[13], 0);
    let buf = [b'A' as c_char, b'B' as c_char, 0, b'C' as c_char];
    assert_eq!(from_c_buf(&buf), "AB");
    assert_eq!(text_len("héllo"), 6);
    assert_eq!(version_symbol_name(), "nk_get_version");
}

#[cfg(test)]
fn loaded() -> Option<&'static Nuklear> {
    match crate::init() {
        Ok(nuklear) => Some(nuklear),
        Err(e) => {
            eprintln!("skipping native test, no library: {:#}", e);
            None
        }
    }
}

#[test]
fn test_native_color_agrees_with_host() {
    use crate::color;

    let Some(nk) = loaded() else { return };

    for &(r, g, b, a) in &[(100, -1, 256, 200), (0, 0, 0, 0), (12, 200, 77, 255), (-50, 300, 128, 1000)] {
        assert_eq!(nk.rgba(r, g, b, a), color::rgba(r, g, b, a));
        assert_eq!(nk.rgb(r, g, b), color::rgb(r, g, b));
        assert_eq!(nk.hsva(r, g, b, a), color::hsva(r, g, b, a));
    }
    for &(r, g, b) in &[(100.0 / 255.0, -0.1, 1.1), (0.5, 0.25, 0.75), (0.9, 1.0, 0.0)] {
        assert_eq!(nk.rgb_f(r, g, b), color::rgb_f(r, g, b));
        assert_eq!(nk.hsv_f(r, g, b), color::hsv_f(r, g, b));
    }
    assert_eq!(nk.rgb_f(f32::NAN, 1.0, 0.0), color::rgb_f(f32::NAN, 1.0, 0.0));

    let c = Color::new(100, 0, 255, 200);
    assert_eq!(nk.rgba_u32(0xC8FF0064), c);
    assert_eq!(nk.color_u32(c), 0xC8FF0064);
    assert_eq!(nk.rgba_hex("6400FFC8"), c);
    assert_eq!(nk.rgba_hex("#6400ffc8"), c);
    assert_eq!(nk.color_hex_rgba(c), "6400FFC8");
    assert_eq!(nk.color_hex_rgb(c), "6400FF");
    assert_eq!(nk.color_fv(c), color::color_fv(c));
    assert_eq!(nk.color_hsva_iv(c), color::color_hsva_iv(c));
    assert_eq!(nk.color_hsv_bv(c), color::color_hsv_bv(c));
    assert_eq!(nk.colorf_hsva_fv(nk.color_cf(c)), color::colorf_hsva_fv(color::color_cf(c)));
}

#[test]
fn test_native_hex_parsing_agrees_on_malformed_input() {
    use crate::color;

    let Some(nk) = loaded() else { return };

    for &s in &["zz00FF", "-100FF", "g0", "64", "6", "#6400F", "", "#", "64\0FF"] {
        assert_eq!(nk.rgb_hex(s), color::rgb_hex(s), "{:?}", s);
        assert_eq!(nk.rgba_hex(s), color::rgba_hex(s), "{:?}", s);
    }
}

#[test]
fn test_native_arity_is_checked_before_the_call() {
    let Some(nk) = loaded() else { return };

    assert_eq!(
        nk.rgb_iv(&[1, 2, 3, 4]).unwrap_err(),
        LengthMismatch { expected: 3, actual: 4 },
    );
    assert!(nk.hsva_fv(&[0.5]).is_err());
    assert_eq!(nk.rgb_iv(&[100, -1, 256]).unwrap(), Color::new(100, 0, 255, 255));
}

#[test]
fn test_native_filters() {
    let Some(nk) = loaded() else { return };

    assert!(nk.filter_accepts(Filter::Default, None, 'x'));
    assert!(nk.filter_accepts(Filter::Decimal, None, '7'));
    assert!(nk.filter_accepts(Filter::Decimal, None, '-'));
    assert!(!nk.filter_accepts(Filter::Decimal, None, 'a'));
    assert!(nk.filter_accepts(Filter::Hex, None, 'F'));
    assert!(!nk.filter_accepts(Filter::Hex, None, 'g'));
    assert!(nk.filter_accepts(Filter::Oct, None, '7'));
    assert!(!nk.filter_accepts(Filter::Oct, None, '8'));
    assert!(nk.filter_accepts(Filter::Binary, None, '1'));
    assert!(!nk.filter_accepts(Filter::Binary, None, '2'));
    assert!(!nk.filter_accepts(Filter::Ascii, None, 'é'));
    for &filter in Filter::ALL {
        assert!(nk.filter(filter).is_some());
    }
}
