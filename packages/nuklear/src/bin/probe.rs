//! Version probe child process, see `nuklear::probe`.

use std::io::{
    self,
    stdin,
    stdout,
};
use anyhow::Result;


fn main() -> Result<()> {
    // stdout carries the reply, so log to stderr
    nuklear::logging::init_logging(io::stderr)?;

    nuklear::probe::serve(stdin().lock(), stdout().lock())
}
