//! Non-owning references to native-owned objects.

use std::{
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
    ptr::NonNull,
};


/// Address of a native-owned `T`, valid for `'a`.
///
/// Cannot be dereferenced in Rust, and can only be produced inside this crate
/// from a pointer native code handed over. Its only use is being passed back
/// into native calls.
pub struct NativeRef<'a, T> {
    ptr: NonNull<T>,
    _p: PhantomData<&'a T>,
}

impl<'a, T> NativeRef<'a, T> {
    /// Wrap a pointer received from native code. Null yields `None`.
    ///
    /// Safety: the pointee must stay alive for `'a`.
    pub(crate) unsafe fn from_raw(ptr: *const T) -> Option<Self> {
        NonNull::new(ptr as *mut T)
            .map(|ptr| NativeRef {
                ptr,
                _p: PhantomData,
            })
    }

    pub fn as_ptr(self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub fn addr(self) -> usize {
        self.ptr.as_ptr() as usize
    }
}

impl<'a, T> Copy for NativeRef<'a, T> {}

impl<'a, T> Clone for NativeRef<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> PartialEq for NativeRef<'a, T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr == other.ptr
    }
}

impl<'a, T> Eq for NativeRef<'a, T> {}

impl<'a, T> Debug for NativeRef<'a, T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "NativeRef<{}>({:#x})",
            std::any::type_name::<T>().rsplit("::").next().unwrap_or("?"),
            self.addr(),
        )
    }
}


#[test]
fn test_native_ref_null_and_identity() {
    use crate::sys::nk_text_edit;

    assert!(unsafe { NativeRef::<nk_text_edit>::from_raw(std::ptr::null()) }.is_none());

    let mut backing = [0u64; 4];
    let raw = backing.as_mut_ptr() as *const nk_text_edit;
    let a = unsafe { NativeRef::from_raw(raw) }.unwrap();
    let b = a;
    assert_eq!(a, b);
    assert_eq!(a.as_ptr() as *const nk_text_edit, raw);
    assert_eq!(a.addr(), raw as usize);
    assert!(format!("{:?}", a).starts_with("NativeRef<nk_text_edit>(0x"));
}
