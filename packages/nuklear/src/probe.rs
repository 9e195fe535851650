//! Out-of-process version probing of library candidates.
//!
//! Loading a shared object runs its initializers, which can crash the loading
//! process if the file is broken or built for something else. So each
//! candidate is loaded in a short-lived `nuklear-probe` child instead.
//!
//! Protocol: the parent writes the candidate's path and a newline to the
//! child's stdin, and the child answers with a single line of JSON on stdout,
//! either `{"version":[major,minor,rev]}` or `{"version":null}`.
//!
//! Cargo doesn't build the `nuklear-probe` binary for crates depending on this
//! one, so an application can instead serve as its own probe:
//!
//! ```no_run
//! fn main() {
//!     nuklear::probe::serve_if_requested();
//!     // ...
//!     let _nk = nuklear::lib();
//! }
//! ```

use crate::{
    config::{
        LoaderConfig,
        ENV_PROBE,
        ENV_PROBE_SERVE,
    },
    version::Version,
};
use std::{
    env,
    ffi::c_int,
    io::{
        self,
        BufRead,
        Read,
        Write,
    },
    path::{
        Path,
        PathBuf,
    },
    process::{
        self,
        Child,
        Command,
        Stdio,
    },
    sync::atomic::{
        AtomicBool,
        Ordering,
    },
    thread,
    time::Duration,
};
use anyhow::{
    Result,
    Context,
    anyhow,
    bail,
    ensure,
};
use crossbeam_channel::{
    bounded,
    RecvTimeoutError,
};
use serde::{
    Serialize,
    Deserialize,
};


pub const PROBE_EXE: &'static str = "nuklear-probe";

/// Symbol every native build exports to report its version.
pub const VERSION_SYMBOL: &'static [u8] = b"nk_get_version\0";

/// `void nk_get_version(int *major, int *minor, int *rev)`
pub type GetVersionFn = unsafe extern "C" fn(*mut c_int, *mut c_int, *mut c_int);


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReply {
    pub version: Option<Version>,
}


// ==== parent side ====

/// Set once the running executable has called `serve_if_requested`.
static SERVES_PROBE_REQUESTS: AtomicBool = AtomicBool::new(false);

/// An executable that can answer a probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// A `nuklear-probe` binary.
    Exe(PathBuf),
    /// The running executable, re-executed with `NUKLEAR_PROBE_SERVE` set.
    SelfExec(PathBuf),
}

impl Probe {
    pub fn path(&self) -> &Path {
        match self {
            Probe::Exe(path) | Probe::SelfExec(path) => path,
        }
    }

    /// Command to spawn for one probe exchange.
    pub fn command(&self) -> Command {
        let mut command = Command::new(self.path());
        command.env_remove(ENV_PROBE);
        match self {
            Probe::Exe(_) => command.env_remove(ENV_PROBE_SERVE),
            Probe::SelfExec(_) => command.env(ENV_PROBE_SERVE, "1"),
        };
        command
    }
}

/// If this process was started as a probe by `Probe::SelfExec`, answer the
/// request and exit. Otherwise return, and allow this executable to be used as
/// the probe.
///
/// Must run before anything else in `main`, since stdout belongs to the
/// protocol.
pub fn serve_if_requested() {
    if env::var_os(ENV_PROBE_SERVE).is_none() {
        SERVES_PROBE_REQUESTS.store(true, Ordering::Relaxed);
        return;
    }
    let code =
        match serve(io::stdin().lock(), io::stdout().lock()) {
            Ok(()) => 0,
            Err(e) => {
                error!(error=%format!("{:#}", e), "unable to serve probe request");
                1
            }
        };
    process::exit(code);
}

/// Locate a probe: the configured one, else `nuklear-probe` beside the running
/// executable or one directory up, else on `PATH`, else the running executable
/// if it called `serve_if_requested`.
pub fn find_probe(config: &LoaderConfig) -> Option<Probe> {
    locate_probe(config, SERVES_PROBE_REQUESTS.load(Ordering::Relaxed))
}

fn locate_probe(config: &LoaderConfig, self_serving: bool) -> Option<Probe> {
    if let Some(probe) = &config.probe {
        return Some(Probe::Exe(probe.clone()));
    }

    let file_name = format!("{}{}", PROBE_EXE, env::consts::EXE_SUFFIX);
    let exe = env::current_exe().ok();

    let mut dirs = Vec::new();
    if let Some(exe_dir) = exe.as_ref().and_then(|exe| exe.parent()) {
        dirs.push(exe_dir.to_path_buf());
        dirs.extend(exe_dir.parent().map(Path::to_path_buf));
    }
    if let Some(paths) = env::var_os("PATH") {
        dirs.extend(env::split_paths(&paths));
    }

    let dedicated = dirs.into_iter()
        .map(|dir| dir.join(&file_name))
        .find(|path| path.is_file());
    if let Some(path) = dedicated {
        return Some(Probe::Exe(path));
    }

    if self_serving {
        exe.map(Probe::SelfExec)
    } else {
        None
    }
}

/// Determine the version of `candidate` with `probe`. Any failure is logged
/// and yields `None`.
pub fn probe_version(probe: &Probe, candidate: &Path, timeout: Duration) -> Option<Version> {
    match run_probe(probe.command(), candidate, timeout) {
        Ok(version) => {
            debug!(
                candidate=%candidate.display(),
                version=?version,
                "probed candidate",
            );
            version
        }
        Err(e) => {
            warn!(
                error=%format!("{:#}", e),
                probe=%probe.path().display(),
                candidate=%candidate.display(),
                "version probe failed",
            );
            None
        }
    }
}

/// Spawn `command` and run one probe exchange with it, killing it if no reply
/// arrives within `timeout`.
pub fn run_probe(
    mut command: Command,
    candidate: &Path,
    timeout: Duration,
) -> Result<Option<Version>> {
    let candidate = candidate.to_str()
        .ok_or_else(|| anyhow!("candidate path is not utf-8"))?;

    let mut child = command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .context("spawning probe")?;

    let written = child.stdin.take()
        .ok_or_else(|| anyhow!("probe stdin not piped"))
        .and_then(|mut stdin| {
            writeln!(stdin, "{}", candidate).context("writing to probe")
        });
    if let Err(e) = written {
        reap(&mut child);
        return Err(e);
    }

    let mut stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => {
            reap(&mut child);
            bail!("probe stdout not piped");
        }
    };
    let (send_reply, recv_reply) = bounded(1);
    thread::spawn(move || {
        let mut reply = String::new();
        let result = stdout.read_to_string(&mut reply).map(|_| reply);
        let _ = send_reply.send(result);
    });

    let reply =
        match recv_reply.recv_timeout(timeout) {
            Ok(reply) => reply.context("reading probe reply")?,
            Err(RecvTimeoutError::Timeout) => {
                reap(&mut child);
                bail!("probe timed out after {:?}", timeout);
            }
            Err(RecvTimeoutError::Disconnected) => {
                reap(&mut child);
                bail!("probe reader thread died");
            }
        };

    let status = child.wait().context("waiting for probe")?;
    if !status.success() {
        debug!(%status, "probe exited unsuccessfully");
    }

    parse_reply(&reply)
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Parse the first non-blank line of a probe's output.
pub fn parse_reply(output: &str) -> Result<Option<Version>> {
    let line = output.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| anyhow!("probe gave no reply"))?;
    let reply: ProbeReply = serde_json::from_str(line)
        .with_context(|| format!("malformed probe reply {:?}", line))?;
    Ok(reply.version)
}

/// Pick the highest-versioned candidate at or above `min_version`. Candidates
/// whose version can't be determined are rejected. Ties go to the earlier
/// candidate.
pub fn select_library<F>(
    candidates: &[PathBuf],
    min_version: Version,
    mut version_of: F,
) -> Option<(PathBuf, Version)>
where
    F: FnMut(&Path) -> Option<Version>,
{
    let mut best: Option<(PathBuf, Version)> = None;
    for candidate in candidates {
        let version =
            match version_of(candidate) {
                Some(version) => version,
                None => {
                    info!(
                        candidate=%candidate.display(),
                        "rejecting candidate of unknown version",
                    );
                    continue;
                }
            };
        if version < min_version {
            info!(
                candidate=%candidate.display(),
                %version,
                %min_version,
                "rejecting candidate below minimum version",
            );
            continue;
        }
        if best.as_ref().map_or(true, |&(_, best)| version > best) {
            best = Some((candidate.clone(), version));
        }
    }
    best
}


// ==== child side ====

/// Load `path` in this process and ask it for its version. `Ok(None)` if it
/// loads but doesn't export the version symbol.
pub fn query_version(path: &Path) -> Result<Option<Version>> {
    let library = unsafe { libloading::Library::new(path) }
        .with_context(|| format!("loading {}", path.display()))?;
    let get_version =
        match unsafe { library.get::<GetVersionFn>(VERSION_SYMBOL) } {
            Ok(symbol) => *symbol,
            Err(e) => {
                debug!(%e, path=%path.display(), "no version symbol");
                return Ok(None);
            }
        };
    let (mut major, mut minor, mut rev) = (0, 0, 0);
    unsafe { get_version(&mut major, &mut minor, &mut rev) };
    Ok(Some(Version::new(major, minor, rev)))
}

/// Answer one probe request read from `input` on `output`. A candidate that
/// fails to load is answered with a null version.
pub fn serve<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<()> {
    let mut line = String::new();
    input.read_line(&mut line).context("reading candidate path")?;
    let path = line.trim();
    ensure!(!path.is_empty(), "no candidate path given");

    let version =
        match query_version(Path::new(path)) {
            Ok(version) => version,
            Err(e) => {
                warn!(error=%format!("{:#}", e), "candidate failed to load");
                None
            }
        };

    let reply = serde_json::to_string(&ProbeReply { version })?;
    writeln!(output, "{}", reply)?;
    output.flush()?;
    Ok(())
}


#[cfg(test)]
use std::collections::HashMap;

#[test]
fn test_parse_reply() {
    assert_eq!(
        parse_reply("{\"version\":[4,1,0]}\n").unwrap(),
        Some(Version::new(4, 1, 0)),
    );
    assert_eq!(parse_reply("\n  {\"version\": null}  \n").unwrap(), None);
    assert!(parse_reply("").is_err());
    assert!(parse_reply("None\n").is_err());
    assert!(parse_reply("{\"version\":[4,1]}").is_err());
}

#[test]
fn test_select_highest_acceptable_version() {
    let paths: Vec<PathBuf> = ["/a/libnuklear.so", "/b/libnuklear.so", "/c/libnuklear.so", "/d/libnuklear.so"]
        .iter()
        .map(PathBuf::from)
        .collect();
    let versions: HashMap<PathBuf, Version> = [
        (paths[0].clone(), Version::new(2, 9, 9)),
        (paths[1].clone(), Version::new(4, 1, 0)),
        (paths[2].clone(), Version::new(3, 0, 0)),
    ].into_iter().collect();

    let mut probed = Vec::new();
    let selected = select_library(&paths, Version::new(3, 0, 0), |path| {
        probed.push(path.to_path_buf());
        versions.get(path).copied()
    });
    assert_eq!(selected, Some((paths[1].clone(), Version::new(4, 1, 0))));
    assert_eq!(probed, paths);
}

#[test]
fn test_select_ties_and_rejections() {
    let paths = vec![PathBuf::from("/first.so"), PathBuf::from("/second.so")];
    let selected = select_library(&paths, Version::new(3, 0, 0), |_| Some(Version::new(4, 0, 0)));
    assert_eq!(selected, Some((paths[0].clone(), Version::new(4, 0, 0))));

    assert_eq!(select_library(&paths, Version::new(3, 0, 0), |_| None), None);
    assert_eq!(
        select_library(&paths, Version::new(3, 0, 0), |_| Some(Version::new(2, 0, 0))),
        None,
    );
    assert_eq!(select_library(&[], Version::new(3, 0, 0), |_| unreachable!()), None);
}

#[test]
fn test_serve_unloadable_candidate() {
    let mut output = Vec::new();
    serve(&b"/nonexistent/libnuklear.so\n"[..], &mut output).unwrap();
    assert_eq!(output, b"{\"version\":null}\n");

    assert!(serve(&b""[..], Vec::new()).is_err());
}

#[test]
fn test_missing_probe_is_unknown_version() {
    let version = probe_version(
        &Probe::Exe(PathBuf::from("/nonexistent/nuklear-probe")),
        Path::new("/usr/lib/libnuklear.so"),
        Duration::from_secs(1),
    );
    assert_eq!(version, None);
}

#[test]
fn test_configured_probe_wins() {
    let mut config = LoaderConfig::default();
    config.probe = Some(PathBuf::from("/opt/probe"));
    assert_eq!(find_probe(&config), Some(Probe::Exe(PathBuf::from("/opt/probe"))));
}

#[test]
fn test_host_serving_requests_is_a_probe() {
    let probe = locate_probe(&LoaderConfig::default(), true).unwrap();
    match probe {
        Probe::SelfExec(path) => assert_eq!(path, env::current_exe().unwrap()),
        Probe::Exe(path) => assert!(path.ends_with(format!("{}{}", PROBE_EXE, env::consts::EXE_SUFFIX))),
    }
}

#[test]
fn test_probe_commands() {
    let envs = |probe: Probe| -> HashMap<String, Option<String>> {
        probe.command()
            .get_envs()
            .map(|(k, v)| (
                k.to_string_lossy().into_owned(),
                v.map(|v| v.to_string_lossy().into_owned()),
            ))
            .collect()
    };

    let own = envs(Probe::SelfExec(PathBuf::from("/bin/app")));
    assert_eq!(own[ENV_PROBE_SERVE], Some("1".to_owned()));
    assert_eq!(own[ENV_PROBE], None);

    let dedicated = envs(Probe::Exe(PathBuf::from("/bin/nuklear-probe")));
    assert_eq!(dedicated[ENV_PROBE_SERVE], None);
    assert_eq!(dedicated[ENV_PROBE], None);

    assert_eq!(Probe::Exe(PathBuf::from("/x")).command().get_program(), "/x");
}

#[cfg(unix)]
#[test]
fn test_probe_exchange() {
    let mut command = Command::new("sh");
    command
        .arg("-c")
        .arg("read path; case \"$path\" in /x/libnuklear.so) echo '{\"version\":[4,1,0]}';; *) echo '{\"version\":null}';; esac");
    let version = run_probe(command, Path::new("/x/libnuklear.so"), Duration::from_secs(5)).unwrap();
    assert_eq!(version, Some(Version::new(4, 1, 0)));
}

#[cfg(unix)]
#[test]
fn test_probe_timeout_kills_child() {
    use std::time::Instant;

    let mut command = Command::new("sh");
    command.arg("-c").arg("exec sleep 10");
    let start = Instant::now();
    let result = run_probe(command, Path::new("/x/libnuklear.so"), Duration::from_millis(200));
    assert!(result.is_err());
    assert!(start.elapsed() < Duration::from_secs(5));
}
