//! Native library resolution.
//!
//! An explicitly configured library is loaded or resolution fails, with no
//! fallback. Otherwise windows asks the OS loader and then a couple of known
//! locations, and every other platform searches the filesystem for candidates,
//! probes each one's version out of process, and loads the newest acceptable
//! one.

use crate::{
    config::{
        LoaderConfig,
        ENV_LIBRARY,
        ENV_PROBE,
    },
    native::Nuklear,
    probe::{
        PROBE_EXE,
        find_probe,
        probe_version,
        select_library,
    },
    version::Version,
    search::{
        LIBRARY_EXTENSIONS,
        LIBRARY_NAME,
        find_candidates,
    },
};
use std::path::{
    Path,
    PathBuf,
};
use anyhow::{
    Result,
    Context,
    Error,
    anyhow,
    bail,
};
use libloading::Library;


pub const WINDOWS_DLL: &'static str = "nuklear.dll";


pub fn load(config: &LoaderConfig) -> Result<Nuklear> {
    if let Some(path) = &config.library {
        info!(path=%path.display(), "loading library named by {}", ENV_LIBRARY);
        return Nuklear::open(path, config.preview)
            .with_context(|| format!(
                "loading {} named by {}",
                path.display(),
                ENV_LIBRARY,
            ));
    }

    if cfg!(windows) {
        load_windows(config)
    } else {
        load_searched(config)
    }
}

fn load_searched(config: &LoaderConfig) -> Result<Nuklear> {
    load_from_dirs(config, &config.search_dirs())
}

fn load_from_dirs(config: &LoaderConfig, dirs: &[PathBuf]) -> Result<Nuklear> {
    let (path, version) = select_from_dirs(config, dirs)?;
    info!(path=%path.display(), %version, "selected library");
    Nuklear::open(&path, config.preview)
}

/// Find candidates in `dirs` and pick the newest acceptable one by probing.
fn select_from_dirs(config: &LoaderConfig, dirs: &[PathBuf]) -> Result<(PathBuf, Version)> {
    let candidates = find_candidates(dirs, LIBRARY_NAME, LIBRARY_EXTENSIONS)?;
    if candidates.is_empty() {
        bail!("no {} library found in {} search directories", LIBRARY_NAME, dirs.len());
    }
    debug!(count=candidates.len(), "found library candidates");

    let probe = find_probe(config)
        .ok_or_else(|| anyhow!(
            "found {} {} library candidates but no way to check their versions: \
            set {} to a {} executable, or call \
            nuklear::probe::serve_if_requested() first thing in main",
            candidates.len(),
            LIBRARY_NAME,
            ENV_PROBE,
            PROBE_EXE,
        ))?;
    debug!(probe=?probe, "using version probe");

    select_library(&candidates, config.min_version, |candidate| {
        probe_version(&probe, candidate, config.probe_timeout)
    })
        .ok_or_else(|| anyhow!(
            "none of {} candidates is a {} library of version {} or newer",
            candidates.len(),
            LIBRARY_NAME,
            config.min_version,
        ))
}

fn load_windows(config: &LoaderConfig) -> Result<Nuklear> {
    let mut failures: Vec<Error> = Vec::new();

    match Nuklear::open(Path::new(WINDOWS_DLL), config.preview) {
        Ok(nuklear) => return Ok(nuklear),
        Err(e) => failures.push(e),
    }

    match load_bundled_windows(config) {
        Ok(nuklear) => return Ok(nuklear),
        Err(e) => failures.push(e),
    }

    if let Some(prefix) = &config.prefix {
        let path = prefix.join("Library").join("bin").join(WINDOWS_DLL);
        match Nuklear::open(&path, config.preview) {
            Ok(nuklear) => return Ok(nuklear),
            Err(e) => failures.push(e),
        }
    }

    for e in &failures {
        debug!(error=%format!("{:#}", e), "windows load attempt failed");
    }
    bail!(
        "unable to load {}: {}",
        WINDOWS_DLL,
        failures.iter()
            .map(|e| format!("{:#}", e))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// The bundled dll, with the MSVC runtime it was built against loaded first
/// if that is bundled too.
fn load_bundled_windows(config: &LoaderConfig) -> Result<Nuklear> {
    let runtime_name =
        if cfg!(target_pointer_width = "64") {
            "msvcr110.dll"
        } else {
            "msvcr100.dll"
        };
    let runtime_path = config.bin_dir.join(runtime_name);
    let runtime =
        if runtime_path.is_file() {
            let runtime = unsafe { Library::new(&runtime_path) }
                .with_context(|| format!("loading {}", runtime_path.display()))?;
            Some(runtime)
        } else {
            None
        };

    let nuklear = Nuklear::open(&config.bin_dir.join(WINDOWS_DLL), config.preview)?;
    Ok(nuklear.with_runtime(runtime))
}


#[cfg(test)]
use crate::search::scratch_dir;

/// Scratch dir holding `libs` (garbage contents) and a `probe.sh` answering
/// with the version `reply` gives for each candidate file name.
#[cfg(all(test, unix))]
fn scratch_install(label: &str, libs: &[&str], reply: &str) -> (PathBuf, LoaderConfig) {
    use std::os::unix::fs::PermissionsExt;

    let dir = scratch_dir(label);
    for lib in libs {
        std::fs::write(dir.join(lib), b"not a shared object").unwrap();
    }
    let probe = dir.join("probe.sh");
    let script = format!(
        "#!/bin/sh\nread path\ncase \"$(basename \"$path\")\" in\n{}\nesac\n",
        reply,
    );
    std::fs::write(&probe, script).unwrap();
    std::fs::set_permissions(&probe, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mut config = LoaderConfig::default();
    config.probe = Some(probe);
    (dir, config)
}

#[test]
fn test_missing_override_fails_without_fallback() {
    let mut config = LoaderConfig::default();
    config.library = Some("/nonexistent/dir/libnuklear.so".into());
    let e = load(&config).unwrap_err();
    let message = format!("{:#}", e);
    assert!(message.contains(ENV_LIBRARY), "{}", message);
    assert!(message.contains("/nonexistent/dir/libnuklear.so"), "{}", message);
}

#[test]
fn test_invalid_override_fails() {
    let dir = scratch_dir("loader-invalid");
    let path = dir.join("libnuklear.so");
    std::fs::write(&path, b"definitely not a shared object").unwrap();

    let mut config = LoaderConfig::default();
    config.library = Some(path.clone());
    assert!(load(&config).is_err());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[cfg(unix)]
#[test]
fn test_search_probe_and_select_end_to_end() {
    let (dir, config) = scratch_install(
        "loader-select",
        &["libnuklear.so", "libnuklear.so.4", "nuklear2.dylib", "libother.so"],
        concat!(
            "libnuklear.so.4) echo '{\"version\":[4,1,0]}';;\n",
            "libnuklear.so) echo '{\"version\":[3,0,0]}';;\n",
            "*) echo '{\"version\":[2,9,0]}';;",
        ),
    );

    let (path, version) = select_from_dirs(&config, &[dir.clone()]).unwrap();
    assert_eq!(path, dir.join("libnuklear.so.4").canonicalize().unwrap());
    assert_eq!(version, Version::new(4, 1, 0));

    // the selected file is then opened, which fails for this one
    let e = load_from_dirs(&config, &[dir.clone()]).unwrap_err();
    let message = format!("{:#}", e);
    assert!(message.contains("libnuklear.so.4"), "{}", message);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[cfg(unix)]
#[test]
fn test_search_rejects_unversioned_candidates() {
    let (dir, config) = scratch_install(
        "loader-unversioned",
        &["libnuklear.so", "libnuklear.dylib"],
        "*) echo '{\"version\":null}';;",
    );

    let e = select_from_dirs(&config, &[dir.clone()]).unwrap_err();
    assert!(e.to_string().contains("none of 2 candidates"), "{}", e);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_search_without_candidates() {
    let dir = scratch_dir("loader-empty");
    let e = select_from_dirs(&LoaderConfig::default(), &[dir.clone()]).unwrap_err();
    assert!(e.to_string().starts_with("no nuklear library found"), "{}", e);
    std::fs::remove_dir_all(&dir).unwrap();
}
