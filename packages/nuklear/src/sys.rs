//! Memory-layout mirrors of the types `nuklear.h` exposes, named after their
//! C counterparts. Nothing in here has behavior beyond construction and
//! comparison. The host-side value types live in `value`.
//!
//! The layouts assume the native library was compiled with the feature
//! defines `build_nuklear` uses (`NK_INCLUDE_FIXED_TYPES` and friends, but not
//! `NK_INCLUDE_STANDARD_BOOL`, which makes `nk_bool` an `int`).

#![allow(non_camel_case_types, non_upper_case_globals)]

use std::{
    ffi::{
        c_char,
        c_int,
        c_void,
    },
    fmt::{self, Debug, Formatter},
    marker::{
        PhantomData,
        PhantomPinned,
    },
    mem::size_of,
    ptr::null_mut,
};


// primitive type table

pub type nk_char = i8;
pub type nk_uchar = u8;
pub type nk_byte = u8;
pub type nk_short = i16;
pub type nk_ushort = u16;
pub type nk_int = i32;
pub type nk_uint = u32;
pub type nk_size = usize;
pub type nk_ptr = usize;
pub type nk_bool = c_int;

pub type nk_hash = nk_uint;
pub type nk_flags = nk_uint;
pub type nk_rune = nk_uint;

pub type nk_glyph = [c_char; UTF_SIZE];

pub const nk_false: nk_bool = 0;
pub const nk_true: nk_bool = 1;

pub const UNDEFINED: f32 = -1.0;
/// Internal invalid utf8 rune.
pub const UTF_INVALID: nk_rune = 0xFFFD;
/// Number of bytes a glyph consists of.
pub const UTF_SIZE: usize = 4;
pub const INPUT_MAX: usize = 16;
pub const MAX_NUMBER_BUFFER: usize = 64;
pub const SCROLLBAR_HIDING_TIMEOUT: f32 = 4.0;

macro_rules! assert_widths {
    ($($type:ty => $size:expr),*$(,)?)=>{
        $(
        const _: () = assert!(size_of::<$type>() == $size);
        )*
    };
}

assert_widths! {
    nk_char => 1,
    nk_uchar => 1,
    nk_byte => 1,
    nk_short => 2,
    nk_ushort => 2,
    nk_int => 4,
    nk_uint => 4,
    nk_size => size_of::<*const c_void>(),
    nk_ptr => size_of::<*const c_void>(),
    nk_bool => 4,
    nk_glyph => 4,
}


// value structs

/// `struct nk_color {nk_byte r,g,b,a;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct nk_color {
    pub r: nk_byte,
    pub g: nk_byte,
    pub b: nk_byte,
    pub a: nk_byte,
}

/// `struct nk_colorf {float r,g,b,a;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct nk_colorf {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// `struct nk_vec2 {float x,y;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct nk_vec2 {
    pub x: f32,
    pub y: f32,
}

/// `struct nk_vec2i {short x, y;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct nk_vec2i {
    pub x: nk_short,
    pub y: nk_short,
}

/// `struct nk_rect {float x,y,w,h;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct nk_rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// `struct nk_recti {short x,y,w,h;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct nk_recti {
    pub x: nk_short,
    pub y: nk_short,
    pub w: nk_short,
    pub h: nk_short,
}

/// `typedef union {void *ptr; int id;} nk_handle;`
///
/// Which member is meaningful is decided by whoever hands the handle to
/// native code. The fields are private so every value is built through
/// `from_ptr` / `from_id`, which always initialize the full pointer-width
/// storage, making `bits` and equality well defined.
#[repr(C)]
#[derive(Copy, Clone)]
pub union nk_handle {
    ptr: *mut c_void,
    id: c_int,
    bits: usize,
}

impl nk_handle {
    pub fn from_ptr(ptr: *mut c_void) -> Self {
        nk_handle { ptr }
    }

    pub fn from_id(id: c_int) -> Self {
        let mut handle = nk_handle { bits: 0 };
        handle.id = id;
        handle
    }

    pub fn ptr(&self) -> *mut c_void {
        unsafe { self.ptr }
    }

    pub fn id(&self) -> c_int {
        unsafe { self.id }
    }

    /// The raw pointer-width storage.
    pub fn bits(&self) -> usize {
        unsafe { self.bits }
    }
}

impl Default for nk_handle {
    fn default() -> Self {
        nk_handle::from_ptr(null_mut())
    }
}

impl PartialEq for nk_handle {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for nk_handle {}

impl Debug for nk_handle {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "nk_handle({:#x})", self.bits())
    }
}

/// `struct nk_image {nk_handle handle; nk_ushort w, h; nk_ushort region[4];};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct nk_image {
    pub handle: nk_handle,
    pub w: nk_ushort,
    pub h: nk_ushort,
    pub region: [nk_ushort; 4],
}

/// `struct nk_nine_slice {struct nk_image img; nk_ushort l, t, r, b;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct nk_nine_slice {
    pub img: nk_image,
    pub l: nk_ushort,
    pub t: nk_ushort,
    pub r: nk_ushort,
    pub b: nk_ushort,
}

/// `struct nk_cursor {struct nk_image img; struct nk_vec2 size, offset;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct nk_cursor {
    pub img: nk_image,
    pub size: nk_vec2,
    pub offset: nk_vec2,
}

/// `struct nk_scroll {nk_uint x, y;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct nk_scroll {
    pub x: nk_uint,
    pub y: nk_uint,
}


// callback function pointer types

pub type nk_plugin_alloc = Option<
    unsafe extern "C" fn(nk_handle, old: *mut c_void, nk_size) -> *mut c_void
>;
pub type nk_plugin_free = Option<
    unsafe extern "C" fn(nk_handle, old: *mut c_void)
>;
pub type nk_plugin_filter = Option<
    unsafe extern "C" fn(*const nk_text_edit, unicode: nk_rune) -> nk_bool
>;
pub type nk_plugin_paste = Option<
    unsafe extern "C" fn(nk_handle, *mut nk_text_edit)
>;
pub type nk_plugin_copy = Option<
    unsafe extern "C" fn(nk_handle, *const c_char, len: c_int)
>;

/// `struct nk_allocator {nk_handle userdata; nk_plugin_alloc alloc; nk_plugin_free free;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct nk_allocator {
    pub userdata: nk_handle,
    pub alloc: nk_plugin_alloc,
    pub free: nk_plugin_free,
}

/// `struct nk_clipboard {nk_handle userdata; nk_plugin_paste paste; nk_plugin_copy copy;};`
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct nk_clipboard {
    pub userdata: nk_handle,
    pub paste: nk_plugin_paste,
    pub copy: nk_plugin_copy,
}


// opaque types

macro_rules! opaque_types {
    ($($name:ident),*$(,)?)=>{
        $(
        /// Native-owned; only ever handled by address.
        #[repr(C)]
        pub struct $name {
            _data: [u8; 0],
            _marker: PhantomData<(*mut u8, PhantomPinned)>,
        }
        )*
    };
}

opaque_types! {
    nk_buffer,
    nk_command_buffer,
    nk_draw_command,
    nk_convert_config,
    nk_style_item,
    nk_text_edit,
    nk_draw_list,
    nk_user_font,
    nk_panel,
    nk_context,
    nk_draw_vertex_layout_element,
    nk_style_button,
    nk_style_toggle,
    nk_style_selectable,
    nk_style_slide,
    nk_style_progress,
    nk_style_scrollbar,
    nk_style_edit,
    nk_style_property,
    nk_style_chart,
    nk_style_combo,
    nk_style_tab,
    nk_style_window_header,
    nk_style_window,
}


#[cfg(test)]
use std::mem::{
    align_of,
    offset_of,
};

#[test]
fn test_plain_struct_layouts() {
    assert_eq!(size_of::<nk_color>(), 4);
    assert_eq!(align_of::<nk_color>(), 1);
    assert_eq!(size_of::<nk_colorf>(), 16);
    assert_eq!(size_of::<nk_vec2>(), 8);
    assert_eq!(size_of::<nk_vec2i>(), 4);
    assert_eq!(size_of::<nk_rect>(), 16);
    assert_eq!(offset_of!(nk_rect, h), 12);
    assert_eq!(size_of::<nk_recti>(), 8);
    assert_eq!(offset_of!(nk_recti, h), 6);
    assert_eq!(size_of::<nk_scroll>(), 8);
}

#[test]
fn test_handle_layouts() {
    let word = size_of::<*mut c_void>();
    assert_eq!(size_of::<nk_handle>(), word);
    assert_eq!(align_of::<nk_handle>(), align_of::<*mut c_void>());

    // handle, then 2 + 2 + 4 * 2 bytes of ushorts, padded to pointer alignment
    let image_size = (word + 12).next_multiple_of(align_of::<*mut c_void>());
    assert_eq!(offset_of!(nk_image, w), word);
    assert_eq!(offset_of!(nk_image, h), word + 2);
    assert_eq!(offset_of!(nk_image, region), word + 4);
    assert_eq!(size_of::<nk_image>(), image_size);

    assert_eq!(offset_of!(nk_nine_slice, l), image_size);
    assert_eq!(offset_of!(nk_nine_slice, b), image_size + 6);

    assert_eq!(offset_of!(nk_cursor, size), image_size);
    assert_eq!(offset_of!(nk_cursor, offset), image_size + 8);
}

#[test]
fn test_callback_struct_layouts() {
    let word = size_of::<*mut c_void>();
    assert_eq!(size_of::<nk_plugin_alloc>(), word);
    assert_eq!(size_of::<nk_allocator>(), 3 * word);
    assert_eq!(offset_of!(nk_allocator, alloc), word);
    assert_eq!(offset_of!(nk_allocator, free), 2 * word);
    assert_eq!(size_of::<nk_clipboard>(), 3 * word);
    assert_eq!(offset_of!(nk_clipboard, copy), 2 * word);
}

#[test]
fn test_handle_id_shares_storage_with_ptr() {
    let a = nk_handle::from_id(7);
    let b = nk_handle::from_id(7);
    assert_eq!(a, b);
    assert_eq!(a.id(), 7);
    assert_ne!(a, nk_handle::from_id(8));
    assert_eq!(nk_handle::default().bits(), 0);
    assert_eq!(size_of::<nk_context>(), 0);
}
