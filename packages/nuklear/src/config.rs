//! Loader configuration, captured from the environment.

use crate::version::{
    Version,
    MIN_VERSION,
};
use std::{
    env,
    ffi::{
        OsStr,
        OsString,
    },
    path::PathBuf,
    time::Duration,
};


/// Names a library file to load, bypassing the search entirely.
pub const ENV_LIBRARY: &'static str = "NUKLEAR_LIBRARY";
/// Non-empty enables binding of preview functions.
pub const ENV_PREVIEW: &'static str = "NUKLEAR_PREVIEW";
/// Overrides the bundled binaries directory.
pub const ENV_BIN_DIR: &'static str = "NUKLEAR_BIN_DIR";
/// Probe executable to spawn.
pub const ENV_PROBE: &'static str = "NUKLEAR_PROBE";
/// Set on a re-executed application to make it answer one probe request.
pub const ENV_PROBE_SERVE: &'static str = "NUKLEAR_PROBE_SERVE";
pub const ENV_SESSION_TYPE: &'static str = "XDG_SESSION_TYPE";

#[cfg(target_os = "macos")]
pub const ENV_LIBRARY_PATH: &'static str = "DYLD_LIBRARY_PATH";
#[cfg(not(target_os = "macos"))]
pub const ENV_LIBRARY_PATH: &'static str = "LD_LIBRARY_PATH";

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const BUNDLED_SUBDIR: &'static str = "nuklear";

const SYSTEM_DIRS: &'static [&'static str] = &[
    "/usr/lib64",
    "/usr/local/lib64",
    "/usr/lib",
    "/usr/local/lib",
    "/opt/homebrew/lib",
    "/run/current-system/sw/lib",
    "/usr/lib/x86_64-linux-gnu",
    "/usr/lib/aarch64-linux-gnu",
    "/usr/lib/arm-linux-gnueabihf",
];


/// Which of the two bundled linux builds to prefer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionType {
    X11,
    Wayland,
}

impl SessionType {
    pub fn subdir(self) -> &'static str {
        match self {
            SessionType::X11 => "x11",
            SessionType::Wayland => "wayland",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub library: Option<PathBuf>,
    pub preview: bool,
    pub bin_dir: PathBuf,
    pub probe: Option<PathBuf>,
    /// Installation prefix with `lib/` (and `Library/bin/` on windows)
    /// beneath it. Never read from the environment.
    pub prefix: Option<PathBuf>,
    pub library_path: Vec<PathBuf>,
    pub session: SessionType,
    pub probe_timeout: Duration,
    pub min_version: Version,
}

impl LoaderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var_os(key))
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let var = |key: &str| lookup(key).filter(|val| !val.is_empty());

        LoaderConfig {
            library: var(ENV_LIBRARY).map(PathBuf::from),
            preview: var(ENV_PREVIEW).is_some(),
            bin_dir: var(ENV_BIN_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(default_bin_dir),
            probe: var(ENV_PROBE).map(PathBuf::from),
            prefix: None,
            library_path: var(ENV_LIBRARY_PATH)
                .map(|paths| env::split_paths(&paths)
                    .filter(|path| !path.as_os_str().is_empty())
                    .collect())
                .unwrap_or_default(),
            session:
                if var(ENV_SESSION_TYPE).as_deref() == Some(OsStr::new("wayland")) {
                    SessionType::Wayland
                } else {
                    SessionType::X11
                },
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            min_version: MIN_VERSION,
        }
    }

    /// Directories the non-windows search looks in, highest priority first.
    pub fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        dirs.push(env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        if !cfg!(target_os = "macos") {
            dirs.push(self.bin_dir.join(self.session.subdir()));
        }
        dirs.push(self.bin_dir.clone());
        if let Some(prefix) = &self.prefix {
            dirs.push(prefix.join("lib"));
        }
        dirs.extend(SYSTEM_DIRS.iter().map(PathBuf::from));
        dirs.extend(self.library_path.iter().cloned());
        dirs
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// `<exe dir>/nuklear` if it exists, else this crate's `bin/`.
fn default_bin_dir() -> PathBuf {
    env::current_exe().ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(BUNDLED_SUBDIR)))
        .filter(|dir| dir.is_dir())
        .unwrap_or_else(|| PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/bin")))
}


#[cfg(test)]
use std::collections::HashMap;

#[cfg(test)]
fn config_of(vars: &[(&str, &str)]) -> LoaderConfig {
    let vars: HashMap<String, OsString> = vars.iter()
        .map(|&(k, v)| (k.to_owned(), OsString::from(v)))
        .collect();
    LoaderConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_defaults() {
    let config = LoaderConfig::default();
    assert_eq!(config.library, None);
    assert!(!config.preview);
    assert_eq!(config.probe, None);
    assert_eq!(config.session, SessionType::X11);
    assert_eq!(config.probe_timeout, DEFAULT_PROBE_TIMEOUT);
    assert_eq!(config.min_version, Version::new(3, 0, 0));
    assert!(config.library_path.is_empty());
}

#[test]
fn test_env_overrides() {
    let config = config_of(&[
        (ENV_LIBRARY, "/opt/nk/libnuklear.so"),
        (ENV_PREVIEW, "1"),
        (ENV_BIN_DIR, "/srv/nk-bin"),
        (ENV_PROBE, "/srv/nuklear-probe"),
        (ENV_SESSION_TYPE, "wayland"),
    ]);
    assert_eq!(config.library, Some(PathBuf::from("/opt/nk/libnuklear.so")));
    assert!(config.preview);
    assert_eq!(config.bin_dir, PathBuf::from("/srv/nk-bin"));
    assert_eq!(config.probe, Some(PathBuf::from("/srv/nuklear-probe")));
    assert_eq!(config.session, SessionType::Wayland);
}

#[test]
fn test_empty_values_are_unset() {
    let config = config_of(&[
        (ENV_LIBRARY, ""),
        (ENV_PREVIEW, ""),
        (ENV_SESSION_TYPE, "x11"),
    ]);
    assert_eq!(config.library, None);
    assert!(!config.preview);
    assert_eq!(config.session, SessionType::X11);
}

#[cfg(unix)]
#[test]
fn test_search_dir_order() {
    let mut config = config_of(&[
        (ENV_BIN_DIR, "/srv/nk-bin"),
        (ENV_LIBRARY_PATH, "/a/lib::/b/lib"),
    ]);
    config.prefix = Some(PathBuf::from("/prefix"));
    let dirs = config.search_dirs();

    let mut expected = vec![env::current_dir().unwrap()];
    if !cfg!(target_os = "macos") {
        expected.push(PathBuf::from("/srv/nk-bin/x11"));
    }
    expected.push(PathBuf::from("/srv/nk-bin"));
    expected.push(PathBuf::from("/prefix/lib"));
    expected.extend(SYSTEM_DIRS.iter().map(PathBuf::from));
    expected.push(PathBuf::from("/a/lib"));
    expected.push(PathBuf::from("/b/lib"));
    assert_eq!(dirs, expected);
}

#[cfg(unix)]
#[test]
fn test_wayland_session_prefers_wayland_build() {
    let config = config_of(&[
        (ENV_BIN_DIR, "/srv/nk-bin"),
        (ENV_SESSION_TYPE, "wayland"),
    ]);
    let dirs = config.search_dirs();

    assert_eq!(dirs[0], env::current_dir().unwrap());
    if cfg!(target_os = "macos") {
        assert_eq!(dirs[1], PathBuf::from("/srv/nk-bin"));
    } else {
        assert_eq!(dirs[1], PathBuf::from("/srv/nk-bin/wayland"));
        assert_eq!(dirs[2], PathBuf::from("/srv/nk-bin"));
    }
    assert!(!dirs.contains(&PathBuf::from("/srv/nk-bin/x11")));
}
