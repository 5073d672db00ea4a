//! rpm command - build SRPMs and run them through mock.

use anyhow::Result;
use std::path::Path;

use crate::process::Cmd;

use super::{report_generated, setup, srpm, BuildOpts};

/// Execute the rpm (mock) command.
pub fn cmd_mock(yaml: &Path, opts: &BuildOpts, target: &str) -> Result<()> {
    let (set, env) = setup(yaml, opts)?;
    let srpms = srpm::build_all(&set.packages, &env)?;
    report_generated(&srpms);

    println!("Building via mock for the target platform: {target}");
    for srpm in &srpms {
        Cmd::new("mock").args(["-r", target]).arg_path(srpm).run()?;
    }

    println!("Output files can be found in /var/lib/mock/{target}/");
    Ok(())
}
