//! Host callbacks handed to native code as C function pointers.
//!
//! Each callback struct (`nk_allocator`, `nk_clipboard`) is produced by an
//! owner holding the boxed host state. The raw struct can only be obtained as
//! a borrow of its owner, so the state its `userdata` points at cannot be
//! dropped while the raw struct is reachable from Rust. Keeping the owner alive
//! for as long as a native context holds a copy of the raw struct remains the
//! caller's contract.

use crate::{
    handle::NativeRef,
    sys::{
        self,
        nk_allocator,
        nk_clipboard,
        nk_handle,
        nk_size,
        nk_text_edit,
    },
};
use std::{
    alloc::{
        Layout,
        alloc,
        dealloc,
    },
    borrow::Cow,
    ffi::{
        c_char,
        c_int,
        c_void,
    },
    marker::PhantomData,
    panic::{
        AssertUnwindSafe,
        catch_unwind,
    },
    ptr::null_mut,
    slice,
    sync::atomic::{
        AtomicUsize,
        Ordering,
    },
};


/// Text-edit filter: decides whether a rune may be inserted. Native filters
/// come from the loaded library.
pub type PluginFilter = sys::nk_plugin_filter;


// ==== allocator ====

/// Memory provider for a native context.
pub trait PluginAllocator {
    /// Allocate `size` bytes. `old` is the previous block when native code is
    /// growing one, and may be ignored. Return null on failure.
    fn alloc(&self, old: *mut c_void, size: usize) -> *mut c_void;

    /// Release a block returned by `alloc`. Null must be accepted.
    fn free(&self, ptr: *mut c_void);
}

/// Owner of a `PluginAllocator`'s state.
pub struct Allocator<A> {
    state: Box<A>,
}

impl<A: PluginAllocator> Allocator<A> {
    pub fn new(state: A) -> Self {
        Allocator {
            state: Box::new(state),
        }
    }

    pub fn state(&self) -> &A {
        &self.state
    }

    /// The `nk_allocator` routing into this owner, for as long as it's
    /// borrowed.
    pub fn raw(&self) -> RawAllocator<'_> {
        RawAllocator {
            raw: nk_allocator {
                userdata: nk_handle::from_ptr(
                    &*self.state as *const A as *mut c_void
                ),
                alloc: Some(alloc_trampoline::<A>),
                free: Some(free_trampoline::<A>),
            },
            _p: PhantomData,
        }
    }
}

/// An `nk_allocator` borrowed from its owning `Allocator`.
#[derive(Debug)]
pub struct RawAllocator<'a> {
    raw: nk_allocator,
    _p: PhantomData<&'a ()>,
}

impl<'a> RawAllocator<'a> {
    pub fn get(&self) -> &nk_allocator {
        &self.raw
    }

    pub fn as_ptr(&self) -> *const nk_allocator {
        &self.raw
    }
}

unsafe extern "C" fn alloc_trampoline<A: PluginAllocator>(
    userdata: nk_handle,
    old: *mut c_void,
    size: nk_size,
) -> *mut c_void {
    let state = userdata.ptr() as *const A;
    if state.is_null() {
        return null_mut();
    }
    let state = unsafe { &*state };
    catch_unwind(AssertUnwindSafe(|| state.alloc(old, size)))
        .unwrap_or_else(|_| {
            error!(size, "allocator callback panicked");
            null_mut()
        })
}

unsafe extern "C" fn free_trampoline<A: PluginAllocator>(
    userdata: nk_handle,
    ptr: *mut c_void,
) {
    let state = userdata.ptr() as *const A;
    if state.is_null() {
        return;
    }
    let state = unsafe { &*state };
    if catch_unwind(AssertUnwindSafe(|| state.free(ptr))).is_err() {
        error!("free callback panicked");
    }
}


/// `PluginAllocator` over the global Rust heap.
///
/// Each block carries a header recording its size so `free` can rebuild the
/// layout. Blocks are 16-byte aligned. Like nuklear's own default allocator
/// it ignores `old`.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    live: AtomicUsize,
}

const HEADER: usize = 16;

impl HeapAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks allocated and not yet freed.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    fn layout(size: usize) -> Option<Layout> {
        let total = size.checked_add(HEADER)?;
        Layout::from_size_align(total, HEADER).ok()
    }
}

impl PluginAllocator for HeapAllocator {
    fn alloc(&self, _old: *mut c_void, size: usize) -> *mut c_void {
        if size == 0 {
            return null_mut();
        }
        let layout = match HeapAllocator::layout(size) {
            Some(layout) => layout,
            None => {
                warn!(size, "allocation size overflows");
                return null_mut();
            }
        };
        unsafe {
            let base = alloc(layout);
            if base.is_null() {
                warn!(size, "out of memory");
                return null_mut();
            }
            (base as *mut usize).write(size);
            self.live.fetch_add(1, Ordering::Relaxed);
            base.add(HEADER) as *mut c_void
        }
    }

    fn free(&self, ptr: *mut c_void) {
        if ptr.is_null() {
            return;
        }
        unsafe {
            let base = (ptr as *mut u8).sub(HEADER);
            let size = (base as *const usize).read();
            if let Some(layout) = HeapAllocator::layout(size) {
                dealloc(base, layout);
                self.live.fetch_sub(1, Ordering::Relaxed);
            }
        }
    }
}


// ==== clipboard ====

/// Clipboard integration for native text editors.
pub trait ClipboardHandler {
    /// Native code asks for the clipboard contents to be pasted into `edit`.
    fn paste(&self, edit: NativeRef<'_, nk_text_edit>);

    /// Native code copied `text`.
    fn copy(&self, text: &str);
}

/// Owner of a `ClipboardHandler`'s state.
pub struct Clipboard<C> {
    state: Box<C>,
}

impl<C: ClipboardHandler> Clipboard<C> {
    pub fn new(state: C) -> Self {
        Clipboard {
            state: Box::new(state),
        }
    }

    pub fn state(&self) -> &C {
        &self.state
    }

    /// The `nk_clipboard` routing into this owner, for as long as it's
    /// borrowed.
    pub fn raw(&self) -> RawClipboard<'_> {
        RawClipboard {
            raw: nk_clipboard {
                userdata: nk_handle::from_ptr(
                    &*self.state as *const C as *mut c_void
                ),
                paste: Some(paste_trampoline::<C>),
                copy: Some(copy_trampoline::<C>),
            },
            _p: PhantomData,
        }
    }
}

/// An `nk_clipboard` borrowed from its owning `Clipboard`.
#[derive(Debug)]
pub struct RawClipboard<'a> {
    raw: nk_clipboard,
    _p: PhantomData<&'a ()>,
}

impl<'a> RawClipboard<'a> {
    pub fn get(&self) -> &nk_clipboard {
        &self.raw
    }

    pub fn as_ptr(&self) -> *const nk_clipboard {
        &self.raw
    }
}

/// Decode a `(const char *, int)` pair. Null or negative length is empty,
/// invalid UTF-8 is replaced.
unsafe fn decode_text<'a>(text: *const c_char, len: c_int) -> Cow<'a, str> {
    if text.is_null() || len <= 0 {
        return Cow::Borrowed("");
    }
    let bytes = unsafe { slice::from_raw_parts(text as *const u8, len as usize) };
    String::from_utf8_lossy(bytes)
}

unsafe extern "C" fn paste_trampoline<C: ClipboardHandler>(
    userdata: nk_handle,
    edit: *mut nk_text_edit,
) {
    let state = userdata.ptr() as *const C;
    if state.is_null() {
        return;
    }
    let state = unsafe { &*state };
    let edit = match unsafe { NativeRef::from_raw(edit) } {
        Some(edit) => edit,
        None => {
            warn!("paste requested for null text editor");
            return;
        }
    };
    if catch_unwind(AssertUnwindSafe(|| state.paste(edit))).is_err() {
        error!("paste callback panicked");
    }
}

unsafe extern "C" fn copy_trampoline<C: ClipboardHandler>(
    userdata: nk_handle,
    text: *const c_char,
    len: c_int,
) {
    let state = userdata.ptr() as *const C;
    if state.is_null() {
        return;
    }
    let state = unsafe { &*state };
    let text = unsafe { decode_text(text, len) };
    if catch_unwind(AssertUnwindSafe(|| state.copy(&text))).is_err() {
        error!("copy callback panicked");
    }
}


#[cfg(test)]
use std::cell::RefCell;

#[test]
fn test_heap_allocator_through_raw_struct() {
    let owner = Allocator::new(HeapAllocator::new());
    let raw = owner.raw();
    let a = raw.get();
    let (alloc_fn, free_fn) = (a.alloc.unwrap(), a.free.unwrap());

    unsafe {
        let p = alloc_fn(a.userdata, null_mut(), 100);
        assert!(!p.is_null());
        assert_eq!(p as usize % 16, 0);
        (p as *mut u8).write_bytes(0xAB, 100);
        let q = alloc_fn(a.userdata, p, 7);
        assert!(!q.is_null());
        assert_eq!(owner.state().live(), 2);

        free_fn(a.userdata, p);
        free_fn(a.userdata, q);
        assert_eq!(owner.state().live(), 0);

        assert!(alloc_fn(a.userdata, null_mut(), 0).is_null());
        free_fn(a.userdata, null_mut());
        assert_eq!(owner.state().live(), 0);
    }
}

#[test]
fn test_allocator_userdata_points_at_owned_state() {
    let owner = Allocator::new(HeapAllocator::new());
    let raw = owner.raw();
    assert_eq!(
        raw.get().userdata.ptr() as *const HeapAllocator,
        owner.state() as *const HeapAllocator,
    );
    assert_eq!(raw.as_ptr(), raw.get() as *const nk_allocator);
}

#[test]
fn test_panicking_allocator_returns_null() {
    struct Exploding;

    impl PluginAllocator for Exploding {
        fn alloc(&self, _: *mut c_void, _: usize) -> *mut c_void {
            panic!("boom")
        }

        fn free(&self, _: *mut c_void) {
            panic!("boom")
        }
    }

    let owner = Allocator::new(Exploding);
    let raw = owner.raw();
    let a = raw.get();
    unsafe {
        assert!(a.alloc.unwrap()(a.userdata, null_mut(), 8).is_null());
        a.free.unwrap()(a.userdata, null_mut());
    }
}

#[cfg(test)]
#[derive(Default)]
struct Recorder {
    copied: RefCell<Vec<String>>,
    pasted: RefCell<Vec<usize>>,
}

#[cfg(test)]
impl ClipboardHandler for Recorder {
    fn paste(&self, edit: NativeRef<'_, nk_text_edit>) {
        self.pasted.borrow_mut().push(edit.addr());
    }

    fn copy(&self, text: &str) {
        self.copied.borrow_mut().push(text.to_owned());
    }
}

#[test]
fn test_clipboard_copy_decoding() {
    let owner = Clipboard::new(Recorder::default());
    let raw = owner.raw();
    let c = raw.get();
    let copy_fn = c.copy.unwrap();

    let text = "héllo wörld";
    let invalid = [b'a', 0xFF, b'b'];
    unsafe {
        copy_fn(c.userdata, text.as_ptr() as *const c_char, text.len() as c_int);
        // only the first 5 bytes
        copy_fn(c.userdata, text.as_ptr() as *const c_char, 5);
        copy_fn(c.userdata, std::ptr::null(), 10);
        copy_fn(c.userdata, text.as_ptr() as *const c_char, -1);
        copy_fn(c.userdata, invalid.as_ptr() as *const c_char, 3);
    }

    assert_eq!(
        *owner.state().copied.borrow(),
        vec![
            "héllo wörld".to_owned(),
            "héll".to_owned(),
            String::new(),
            String::new(),
            "a\u{FFFD}b".to_owned(),
        ],
    );
}

#[test]
fn test_clipboard_paste_passes_editor_address() {
    let owner = Clipboard::new(Recorder::default());
    let raw = owner.raw();
    let c = raw.get();
    let paste_fn = c.paste.unwrap();

    let mut backing = [0u64; 8];
    let edit = backing.as_mut_ptr() as *mut nk_text_edit;
    unsafe {
        paste_fn(c.userdata, edit);
        paste_fn(c.userdata, null_mut());
    }
    assert_eq!(*owner.state().pasted.borrow(), vec![edit as usize]);
}
