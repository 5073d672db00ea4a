//! Source tarball assembly.
//!
//! Archives a pulled image store into the xz tarball rpmbuild consumes as a
//! source. Archiving runs under sudo: the store contains files owned by
//! arbitrary uids with modes the invoking user cannot read.

use anyhow::{Context, Result};
use std::path::Path;

use crate::process::Cmd;

/// Archive `staging` into `tar_path` and make the result user-writable so
/// rpmbuild can consume and later clean it.
pub fn create_archive(staging: &Path, tar_path: &Path) -> Result<()> {
    println!("  creating {}", tar_path.display());

    Cmd::new("tar")
        .arg("-cJf")
        .arg_path(tar_path)
        .arg(".")
        .dir(staging)
        .sudo()
        .run()
        .with_context(|| format!("failed to archive {}", staging.display()))?;

    Cmd::new("chmod")
        .arg("a+rw")
        .arg_path(tar_path)
        .sudo()
        .run()
        .context("failed to loosen tarball permissions")?;

    Ok(())
}
