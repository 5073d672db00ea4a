//! srpm command - generate specs and build source RPMs.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{Arch, BuildEnv, Package};
use crate::image;
use crate::process::Cmd;
use crate::spec::SpecFile;
use crate::tarball;

use super::{report_generated, setup, BuildOpts};

/// Execute the srpm command.
pub fn cmd_srpm(yaml: &Path, opts: &BuildOpts) -> Result<Vec<PathBuf>> {
    let (set, env) = setup(yaml, opts)?;
    let srpms = build_all(&set.packages, &env)?;
    report_generated(&srpms);
    Ok(srpms)
}

/// Build an SRPM per package, reusing existing ones in no-cleanup mode.
pub(crate) fn build_all(packages: &[Package], env: &BuildEnv) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(env.specs_dir())?;

    let mut srpms = Vec::new();
    for package in packages {
        let srpm = env.srpms_dir().join(package.srpm_filename());

        if srpm.exists() && env.no_cleanup {
            println!("reusing existing {}", srpm.display());
        } else {
            let spec_path = write_spec(package, env, true)?;
            println!("building srpm for {}", spec_path.display());
            Cmd::new("rpmbuild")
                .args(["-bs", "--define"])
                .arg(format!("_topdir {}", env.rpmbuild_dir.display()))
                .arg_path(&spec_path)
                .run()?;
        }

        srpms.push(srpm);
    }
    Ok(srpms)
}

/// Generate one package's spec file, scanning (and if `build_tarballs`,
/// first creating) the per-architecture tarballs in declared order.
pub(crate) fn write_spec(
    package: &Package,
    env: &BuildEnv,
    build_tarballs: bool,
) -> Result<PathBuf> {
    let mut spec = SpecFile::new(&package.name, env.specs_dir().join(package.spec_filename()));

    for arch in &package.arch {
        let tar_path = if build_tarballs {
            ensure_tarball(package, arch, env)?
        } else {
            existing_tarball(package, arch, env)?
        };
        println!(
            "scanning {} to generate files section for arch {}",
            tar_path.display(),
            arch.name
        );
        spec.scan_archive(&tar_path, &arch.name)?;
    }

    spec.set_version(&package.version);
    spec.set_release(package.release.as_deref());
    spec.set_license(package.license.as_deref());
    spec.set_summary(package.summary.as_deref());
    spec.set_description(package.description.as_deref());
    spec.set_image_store(package.path.as_deref());
    spec.set_url(package.url.as_deref());

    let spec_path = spec.finalize()?;
    println!("{} written", spec_path.display());
    Ok(spec_path)
}

/// Pull the architecture's images and archive them, unless a reusable
/// tarball already exists.
fn ensure_tarball(package: &Package, arch: &Arch, env: &BuildEnv) -> Result<PathBuf> {
    let tar_path = env.sources_dir().join(package.tarball_filename(&arch.name));

    if tar_path.exists() && env.no_cleanup {
        println!("reusing existing {}", tar_path.display());
        return Ok(tar_path);
    }

    let staging = env.tmp_dir.join(&package.name).join(&arch.name);
    fs::create_dir_all(&staging)
        .with_context(|| format!("cannot create staging dir {}", staging.display()))?;
    image::pull_images(arch, &staging)?;

    fs::create_dir_all(env.sources_dir())?;
    tarball::create_archive(&staging, &tar_path)?;
    Ok(tar_path)
}

fn existing_tarball(package: &Package, arch: &Arch, env: &BuildEnv) -> Result<PathBuf> {
    let tar_path = env.sources_dir().join(package.tarball_filename(&arch.name));
    if !tar_path.exists() {
        anyhow::bail!(
            "tarball not found: {}\nRun 'storepack srpm' first to pull and archive the images.",
            tar_path.display()
        );
    }
    Ok(tar_path)
}
