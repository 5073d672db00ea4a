//! copr command - build SRPMs and submit them to a Copr repository.

use anyhow::Result;
use std::path::Path;

use crate::process::Cmd;

use super::{report_generated, setup, srpm, BuildOpts};

/// Execute the copr command.
pub fn cmd_copr(yaml: &Path, opts: &BuildOpts, copr_repo: &str, no_wait: bool) -> Result<()> {
    let (set, env) = setup(yaml, opts)?;
    let srpms = srpm::build_all(&set.packages, &env)?;
    report_generated(&srpms);

    for srpm in &srpms {
        let mut cmd = Cmd::new("copr").arg("build");
        if no_wait {
            cmd = cmd.arg("--no-wait");
        }
        cmd.arg(copr_repo).arg_path(srpm).run()?;
    }
    Ok(())
}
