//! Re-invoke through sudo
//!
//! Lives at the process boundary only: the core checks privilege and fails,
//! the CLI decides whether to replace itself with an elevated copy.

use anyhow::{bail, Context, Result};
use std::convert::Infallible;
use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::process::Command;
use tracing::info;

/// Set on the elevated copy so a failed elevation cannot loop
pub const ELEVATED_MARKER: &str = "AIRTIGHT_ELEVATED";

/// Arguments passed to `sudo` to rerun `exe` with `args`
pub fn sudo_args(exe: OsString, args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut argv = vec![
        OsString::from("--preserve-env=RUST_LOG"),
        OsString::from("--"),
        // sudo drops VAR=value words after `--` and needs SETENV before it
        OsString::from("env"),
        OsString::from(format!("{}=1", ELEVATED_MARKER)),
        exe,
    ];
    argv.extend(args);
    argv
}

/// Replace this process with `sudo <self> <args>`. Returns only on failure.
pub fn reexec_with_sudo() -> Result<Infallible> {
    if std::env::var_os(ELEVATED_MARKER).is_some() {
        bail!("still unprivileged after sudo; refusing to re-elevate");
    }

    let exe = std::env::current_exe().context("Failed to locate the airtightctl binary")?;
    let argv = sudo_args(exe.into_os_string(), std::env::args_os().skip(1));

    println!("[*] AirTIGHT requires root privileges. Escalating...");
    info!("Re-executing through sudo");

    let err = Command::new("sudo").args(&argv).exec();
    Err(err).context("Escalation through sudo failed")
}
