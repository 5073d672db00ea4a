//! spec command - generate spec files from existing tarballs.
//!
//! Useful for inspecting what a build would produce without pulling images
//! or invoking rpmbuild (neither podman nor root is needed).

use anyhow::Result;
use std::path::Path;

use super::{setup, srpm, BuildOpts};

/// Execute the spec command.
pub fn cmd_spec(yaml: &Path, opts: &BuildOpts) -> Result<()> {
    let (set, env) = setup(yaml, opts)?;
    std::fs::create_dir_all(env.specs_dir())?;

    for package in &set.packages {
        srpm::write_spec(package, &env, false)?;
    }
    Ok(())
}
