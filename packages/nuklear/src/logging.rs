//! Log subscriber setup for the binaries in this workspace. The library
//! itself never installs one.

use std::time::Instant;
use anyhow::Result;
use tracing_subscriber::{
    fmt::{
        self,
        MakeWriter,
        format::Writer,
        time::FormatTime,
    },
    prelude::*,
    Registry,
    EnvFilter,
};


/// Timer printing seconds since the subscriber was installed, to the
/// millisecond.
#[derive(Debug, Clone)]
pub struct MsUptime(Instant);

impl MsUptime {
    pub fn new() -> Self {
        MsUptime(Instant::now())
    }
}

impl FormatTime for MsUptime {
    fn format_time(&self, w: &mut Writer) -> std::fmt::Result {
        write!(w, "{:.3}s", self.0.elapsed().as_secs_f32())
    }
}

/// Install a compact `RUST_LOG`-filtered subscriber writing to `writer` as the
/// global default.
pub fn init_logging<W>(writer: W) -> Result<()>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let format = fmt::format()
        .compact()
        .with_timer(MsUptime::new())
        .with_line_number(true);
    let log = fmt::layer()
        .event_format(format)
        .with_writer(writer);
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(log);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}


#[test]
fn test_ms_uptime_format() {
    let mut out = String::new();
    MsUptime::new().format_time(&mut Writer::new(&mut out)).unwrap();
    let (secs, unit) = out.split_at(out.len() - 1);
    assert_eq!(unit, "s");
    assert_eq!(secs.split('.').nth(1).map(str::len), Some(3));
    assert!(secs.parse::<f32>().unwrap() < 60.0);
}
