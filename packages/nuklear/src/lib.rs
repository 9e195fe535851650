//! Bindings to the nuklear immediate-mode GUI library's C API.
//!
//! The native library is located and loaded at runtime, once per process,
//! by `init`. Everything that doesn't need native code (value types and
//! their wire layouts, color math, enums, callback owners) works without it.
//!
//! Outside windows, loading checks candidate versions in a child process. An
//! application without the `nuklear-probe` binary at hand should call
//! `probe::serve_if_requested` at the start of `main`.

#[macro_use]
extern crate tracing;

pub mod sys;
pub mod coerce;
pub mod value;
pub mod color;
pub mod enums;
pub mod handle;
pub mod callback;
pub mod version;
pub mod config;
pub mod search;
pub mod probe;
pub mod native;
pub mod loader;
pub mod logging;

pub use crate::{
    callback::{
        Allocator,
        Clipboard,
        ClipboardHandler,
        HeapAllocator,
        PluginAllocator,
        PluginFilter,
        RawAllocator,
        RawClipboard,
    },
    coerce::LengthMismatch,
    config::LoaderConfig,
    handle::NativeRef,
    native::{
        Filter,
        Nuklear,
    },
    value::{
        Color,
        Colorf,
        Cursor,
        Handle,
        Image,
        NineSlice,
        Rect,
        Recti,
        Scroll,
        Vec2,
        Vec2i,
        Wire,
    },
    version::Version,
};

use std::sync::OnceLock;
use anyhow::{
    Result,
    anyhow,
};


static NUKLEAR: OnceLock<Result<Nuklear, String>> = OnceLock::new();

/// Load the native library as configured by the environment, if that hasn't
/// been attempted yet. Later calls return the outcome of the first.
pub fn init() -> Result<&'static Nuklear> {
    init_with(|| LoaderConfig::from_env())
}

/// Like `init`, but the first call loads according to `config` instead.
pub fn init_with<F>(config: F) -> Result<&'static Nuklear>
where
    F: FnOnce() -> LoaderConfig,
{
    NUKLEAR
        .get_or_init(|| {
            loader::load(&config())
                .map_err(|e| {
                    let e = format!("{:#}", e);
                    error!(error=%e, "failed to load nuklear");
                    e
                })
        })
        .as_ref()
        .map_err(|e| anyhow!("{}", e))
}

/// The loaded native library.
///
/// Panics if it isn't or can't be loaded, since no native functionality is
/// usable without it.
pub fn lib() -> &'static Nuklear {
    match init() {
        Ok(nuklear) => nuklear,
        Err(e) => panic!("nuklear native library not loaded: {}", e),
    }
}
