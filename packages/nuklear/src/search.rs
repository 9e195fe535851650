//! Filesystem search for native library candidates.

use std::{
    collections::HashSet,
    fs,
    path::{
        Path,
        PathBuf,
    },
};
use anyhow::Result;
use regex::{
    Regex,
    escape,
};


pub const LIBRARY_NAME: &'static str = "nuklear";
pub const LIBRARY_EXTENSIONS: &'static [&'static str] = &[".so", ".dylib"];


/// File name pattern for shared builds of library `name`.
///
/// Accepts `lib<name><ext>` or `<name><ext>`, optionally followed by a dotted
/// suffix (`libnuklear.so.4.1`), or with a version between name and extension
/// (`libnuklear4.1.dylib`).
pub fn candidate_pattern(name: &str, extensions: &[&str]) -> Result<Regex> {
    let mut regex = String::new();
    regex.push_str("^(?:lib)?");
    regex.push_str(&escape(name));
    regex.push_str("(?:");
    for (i, ext) in extensions.iter().enumerate() {
        if i > 0 {
            regex.push('|');
        }
        let ext = escape(ext);
        regex.push_str(&format!("{ext}(?:\\..*)?|[0-9.]*{ext}"));
    }
    regex.push_str(")$");
    Ok(Regex::new(&regex)?)
}

/// Matching files in `dirs`, canonicalized, deduplicated and in directory
/// order. Unreadable directories are skipped.
pub fn find_candidates(
    dirs: &[PathBuf],
    name: &str,
    extensions: &[&str],
) -> Result<Vec<PathBuf>> {
    let pattern = candidate_pattern(name, extensions)?;
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for dir in dirs {
        for path in matches_in(dir, &pattern) {
            let path =
                match fs::canonicalize(&path) {
                    Ok(path) => path,
                    Err(e) => {
                        debug!(%e, path=%path.display(), "candidate does not resolve");
                        continue;
                    }
                };
            if seen.insert(path.clone()) {
                trace!(path=%path.display(), "found library candidate");
                candidates.push(path);
            }
        }
    }

    Ok(candidates)
}

fn matches_in(dir: &Path, pattern: &Regex) -> Vec<PathBuf> {
    let read_dir =
        match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                trace!(%e, dir=%dir.display(), "skipping search dir");
                return Vec::new();
            }
        };

    let mut matches = Vec::new();
    for entry in read_dir {
        let entry =
            match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(%e, dir=%dir.display(), "error reading search dir entry");
                    continue;
                }
            };
        let file_name =
            match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
        if pattern.is_match(&file_name) {
            matches.push(entry.path());
        }
    }
    // read_dir order is unspecified
    matches.sort();
    matches
}


#[cfg(test)]
pub(crate) fn scratch_dir(label: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "nuklear-test-{}-{}-{}",
        label,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed),
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_candidate_pattern() {
    let pattern = candidate_pattern(LIBRARY_NAME, LIBRARY_EXTENSIONS).unwrap();
    for name in [
        "libnuklear.so",
        "nuklear.so",
        "libnuklear.so.4",
        "libnuklear.so.4.1.0",
        "libnuklear.dylib",
        "libnuklear4.1.dylib",
        "nuklear4.so",
    ] {
        assert!(pattern.is_match(name), "{} should match", name);
    }
    for name in [
        "libnuklear.a",
        "libnuklear.sox",
        "libnuklear-dev.so",
        "libnuklear_4.so",
        "nuklear.h",
        "xnuklear.so",
        "libnuklearso",
    ] {
        assert!(!pattern.is_match(name), "{} should not match", name);
    }
}

#[test]
fn test_find_candidates_order_and_dedup() {
    let a = scratch_dir("search-a");
    let b = scratch_dir("search-b");
    for name in ["libnuklear.so.4", "libnuklear.so", "readme.txt", "libnuklear.a"] {
        fs::write(a.join(name), b"").unwrap();
    }
    fs::write(b.join("nuklear.so"), b"").unwrap();

    let dirs = vec![
        a.clone(),
        a.join("does-not-exist"),
        b.clone(),
        a.clone(),
    ];
    let found = find_candidates(&dirs, LIBRARY_NAME, LIBRARY_EXTENSIONS).unwrap();
    let expected = vec![
        fs::canonicalize(a.join("libnuklear.so")).unwrap(),
        fs::canonicalize(a.join("libnuklear.so.4")).unwrap(),
        fs::canonicalize(b.join("nuklear.so")).unwrap(),
    ];
    assert_eq!(found, expected);

    fs::remove_dir_all(&a).unwrap();
    fs::remove_dir_all(&b).unwrap();
}

#[cfg(unix)]
#[test]
fn test_find_candidates_resolves_symlinks() {
    let dir = scratch_dir("search-link");
    fs::write(dir.join("libnuklear.so.4.1.0"), b"").unwrap();
    std::os::unix::fs::symlink(
        dir.join("libnuklear.so.4.1.0"),
        dir.join("libnuklear.so"),
    ).unwrap();

    let found = find_candidates(
        &[dir.clone()],
        LIBRARY_NAME,
        LIBRARY_EXTENSIONS,
    ).unwrap();
    assert_eq!(found, vec![fs::canonicalize(dir.join("libnuklear.so.4.1.0")).unwrap()]);

    fs::remove_dir_all(&dir).unwrap();
}
