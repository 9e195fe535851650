//! Builds the native nuklear library from `Nuklear/nuklear.h` and installs it
//! into the nuklear package's bundled binaries directory.

#[macro_use]
extern crate tracing;

use std::{
    env::args,
    fs,
    io,
    path::PathBuf,
    process::Command,
};
use anyhow::{
    Result,
    Context,
    bail,
    ensure,
};
use regex::Regex;


const CLI_HELP: &'static str = r#"Builds the native nuklear library.

Examples:

    build_nuklear
    Build from the current directory, which must contain Nuklear/nuklear.h.

    build_nuklear path/to/project
    Build from another project directory.

    build_nuklear --version=4.12.0
    Build with an explicit version, when nuklear.h doesn't state one.

Env var examples:
    RUST_LOG=build_nuklear=trace
    Changes logging levels"#;

const FEATURE_DEFINES: &'static [&'static str] = &[
    "NK_API __declspec(dllexport)",
    "NK_INCLUDE_FIXED_TYPES",
    "NK_INCLUDE_DEFAULT_ALLOCATOR",
    "NK_INCLUDE_STANDARD_IO",
    "NK_INCLUDE_STANDARD_VARARGS",
    "NK_INCLUDE_VERTEX_BUFFER_OUTPUT",
    "NK_INCLUDE_FONT_BAKING",
    "NK_INCLUDE_DEFAULT_FONT",
    "NK_IMPLEMENTATION",
];

const VCVARS: &'static str =
    r"C:\Program Files\Microsoft Visual Studio\2022\Community\VC\Auxiliary\Build\vcvars64.bat";

const DLL_NAME: &'static str = "nuklear.dll";


/// Directories the build reads from and writes to.
#[derive(Debug, Clone)]
struct Project {
    dir: PathBuf,
}

impl Project {
    fn header(&self) -> PathBuf {
        self.dir.join("Nuklear").join("nuklear.h")
    }

    fn build_dir(&self) -> PathBuf {
        self.dir.join("build")
    }

    fn bin_dir(&self) -> PathBuf {
        self.dir.join("packages").join("nuklear").join("bin")
    }
}

type LibVersion = (i32, i32, i32);

/// Find the version in the banner comment nuklear.h opens with, e.g.
/// `/* nuklear - 4.12.0 - public domain */`.
fn header_version(header: &str) -> Result<Option<LibVersion>> {
    let banner = Regex::new(r"nuklear\s*-\s*(?:v)?(\d+)\.(\d+)\.(\d+)")?;
    let captures =
        match banner.captures(header) {
            Some(captures) => captures,
            None => return Ok(None),
        };
    let part = |i: usize| -> Result<i32> {
        Ok(captures[i].parse().context("version component out of range")?)
    };
    Ok(Some((part(1)?, part(2)?, part(3)?)))
}

fn parse_version(s: &str) -> Result<LibVersion> {
    let parts = s.split('.')
        .map(|part| part.parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("invalid version {:?}", s))?;
    ensure!(parts.len() == 3, "version {:?} must be major.minor.rev", s);
    Ok((parts[0], parts[1], parts[2]))
}

/// The single translation unit compiled into the library: the feature
/// defines, the header with its implementation, and the version export.
fn library_source((major, minor, rev): LibVersion) -> String {
    let mut src = String::new();
    for define in FEATURE_DEFINES {
        src.push_str("#define ");
        src.push_str(define);
        src.push('\n');
    }
    src.push_str("#include \"nuklear.h\"\n");
    src.push('\n');
    src.push_str("NK_API void nk_get_version(int *major, int *minor, int *rev)\n");
    src.push_str("{\n");
    src.push_str(&format!("    if (major) *major = {};\n", major));
    src.push_str(&format!("    if (minor) *minor = {};\n", minor));
    src.push_str(&format!("    if (rev) *rev = {};\n", rev));
    src.push_str("}\n");
    src
}

/// Empty the build directory, creating it if needed.
fn clean(project: &Project) -> Result<()> {
    let build_dir = project.build_dir();
    if build_dir.exists() {
        for entry in fs::read_dir(&build_dir)? {
            let path = entry?.path();
            trace!(path=%path.display(), "removing");
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
    } else {
        fs::create_dir_all(&build_dir)?;
    }
    Ok(())
}

fn setup_files(project: &Project, version: Option<LibVersion>) -> Result<()> {
    let header_path = project.header();
    let header = fs::read_to_string(&header_path)
        .with_context(|| format!("reading {}", header_path.display()))?;

    let version =
        match version {
            Some(version) => version,
            None => match header_version(&header)? {
                Some(version) => version,
                None => bail!(
                    "no version found in {}, pass one with --version",
                    header_path.display(),
                ),
            },
        };
    info!(?version, "generating library source");

    let build_dir = project.build_dir();
    fs::write(build_dir.join("nuklear.h"), header)?;
    fs::write(build_dir.join("nuklear.c"), library_source(version))?;
    Ok(())
}

fn build(project: &Project) -> Result<()> {
    if !cfg!(windows) {
        bail!("unsupported platform, the library can only be built on windows");
    }

    let build_dir = project.build_dir();
    let status = Command::new("cmd")
        .arg("/C")
        .arg(VCVARS)
        .arg("&&")
        .arg("cl")
        .arg("/LD")
        .arg(build_dir.join("nuklear.c"))
        .current_dir(&build_dir)
        .status()
        .context("running the MSVC toolchain")?;
    ensure!(status.success(), "compiler exited with {}", status);
    Ok(())
}

fn install(project: &Project) -> Result<()> {
    let dll = project.build_dir().join(DLL_NAME);
    let bin_dir = project.bin_dir();
    fs::create_dir_all(&bin_dir)?;
    fs::copy(&dll, bin_dir.join(DLL_NAME))
        .with_context(|| format!("copying {} into {}", dll.display(), bin_dir.display()))?;
    info!(path=%bin_dir.join(DLL_NAME).display(), "installed library");
    Ok(())
}

fn run(project: &Project, version: Option<LibVersion>) -> Result<()> {
    clean(project)?;
    setup_files(project, version)?;
    build(project)?;
    install(project)?;
    Ok(())
}

fn main() -> Result<()> {
    nuklear::logging::init_logging(io::stdout)?;

    let mut project_dir = None;
    let mut version = None;
    for arg in args().skip(1) {
        if arg == "--help" || arg == "-h" {
            println!("{}", CLI_HELP);
            return Ok(());
        } else if let Some(s) = arg.strip_prefix("--version=") {
            version = Some(parse_version(s)?);
        } else if arg.starts_with("--") {
            bail!("unknown option {}\n\n{}", arg, CLI_HELP);
        } else if project_dir.is_none() {
            project_dir = Some(PathBuf::from(arg));
        } else {
            bail!("unexpected argument {}\n\n{}", arg, CLI_HELP);
        }
    }

    let dir = project_dir.map(Ok).unwrap_or_else(std::env::current_dir)?;
    let project = Project {
        dir: fs::canonicalize(&dir)
            .with_context(|| format!("project dir {}", dir.display()))?,
    };
    info!(dir=%project.dir.display(), "building nuklear");
    run(&project, version)
}


#[cfg(test)]
fn scratch_project(label: &str) -> Project {
    let dir = std::env::temp_dir().join(format!(
        "build-nuklear-{}-{}",
        label,
        std::process::id(),
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("Nuklear")).unwrap();
    Project { dir }
}

#[cfg(test)]
fn remove(path: &std::path::Path) {
    fs::remove_dir_all(path).unwrap();
}

#[test]
fn test_library_source() {
    let src = library_source((4, 12, 0));
    let lines: Vec<&str> = src.lines().collect();
    assert_eq!(lines[0], "#define NK_API __declspec(dllexport)");
    assert_eq!(lines[8], "#define NK_IMPLEMENTATION");
    assert_eq!(lines[9], "#include \"nuklear.h\"");
    assert_eq!(
        src.lines().filter(|l| l.starts_with("#define ")).count(),
        FEATURE_DEFINES.len(),
    );
    assert!(!src.contains("NK_INCLUDE_STANDARD_BOOL"));
    assert!(src.contains("NK_API void nk_get_version(int *major, int *minor, int *rev)"));
    assert!(src.contains("*major = 4;"));
    assert!(src.contains("*minor = 12;"));
    assert!(src.contains("*rev = 0;"));
    // defines come before the implementation is pulled in
    assert!(src.find("NK_IMPLEMENTATION").unwrap() < src.find("#include").unwrap());
}

#[test]
fn test_versions() {
    let header = "/*\n/// # Nuklear\n/// nuklear - 4.12.0 - public domain\n*/\n";
    assert_eq!(header_version(header).unwrap(), Some((4, 12, 0)));
    assert_eq!(header_version("/* no banner */").unwrap(), None);
    assert_eq!(parse_version("3.1.2").unwrap(), (3, 1, 2));
    assert!(parse_version("3.1").is_err());
    assert!(parse_version("3.x.1").is_err());
}

#[test]
fn test_clean_and_setup_files() {
    let project = scratch_project("setup");
    fs::write(project.header(), "/* nuklear - 4.12.0 - public domain */\nint x;\n").unwrap();
    fs::create_dir_all(project.build_dir().join("stale-dir")).unwrap();
    fs::write(project.build_dir().join("stale.obj"), b"").unwrap();

    clean(&project).unwrap();
    assert_eq!(fs::read_dir(project.build_dir()).unwrap().count(), 0);

    setup_files(&project, None).unwrap();
    assert_eq!(
        fs::read_to_string(project.build_dir().join("nuklear.h")).unwrap(),
        fs::read_to_string(project.header()).unwrap(),
    );
    assert_eq!(
        fs::read_to_string(project.build_dir().join("nuklear.c")).unwrap(),
        library_source((4, 12, 0)),
    );

    setup_files(&project, Some((9, 9, 9))).unwrap();
    assert!(fs::read_to_string(project.build_dir().join("nuklear.c")).unwrap().contains("*major = 9;"));

    remove(&project.dir);
}

#[test]
fn test_setup_requires_a_version() {
    let project = scratch_project("noversion");
    fs::write(project.header(), "int x;\n").unwrap();
    clean(&project).unwrap();
    assert!(setup_files(&project, None).is_err());
    remove(&project.dir);
}

#[cfg(not(windows))]
#[test]
fn test_build_is_windows_only() {
    let project = scratch_project("platform");
    let e = build(&project).unwrap_err();
    assert!(e.to_string().contains("unsupported platform"));
    remove(&project.dir);
}
