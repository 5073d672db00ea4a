//! CLI command handlers.
//!
//! Each submodule drives one subcommand:
//! - `srpm` - generate specs and build source RPMs
//! - `copr` - build SRPMs and submit them to a Copr repository
//! - `mock` - build SRPMs and run them through mock
//! - `spec` - generate spec files only, from existing tarballs

pub mod copr;
pub mod mock;
pub mod spec;
pub mod srpm;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

use crate::config::{BuildEnv, PackageSet};
use crate::preflight;

pub use copr::cmd_copr;
pub use mock::cmd_mock;
pub use spec::cmd_spec;
pub use srpm::cmd_srpm;

/// Directory options shared by the build subcommands.
#[derive(Debug, Clone, Default)]
pub struct BuildOpts {
    pub tmp: Option<PathBuf>,
    pub rpmbuild_dir: Option<PathBuf>,
    pub no_cleanup: bool,
}

pub(crate) fn setup(yaml: &Path, opts: &BuildOpts) -> Result<(PackageSet, BuildEnv)> {
    let set = PackageSet::load(yaml)?;
    let env = BuildEnv::resolve(
        opts.rpmbuild_dir.clone(),
        opts.tmp.clone(),
        opts.no_cleanup,
    )?;
    Ok((set, env))
}

pub(crate) fn report_generated(srpms: &[PathBuf]) {
    println!("The following srpm files have been generated:");
    for srpm in srpms {
        println!(" * {}", srpm.display());
    }
}

/// Execute the preflight command.
pub fn cmd_preflight(strict: bool) -> Result<()> {
    let results = preflight::run_checks();
    let ok = preflight::print_summary(&results);
    if strict && !ok {
        bail!("preflight checks failed");
    }
    Ok(())
}
