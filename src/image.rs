//! Container image retrieval.
//!
//! Pulls every image an architecture declares into a podman storage root,
//! which later gets archived wholesale as the package payload.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Arch;
use crate::process::Cmd;

/// Pull all of `arch`'s images into `store_dir`.
///
/// The pull runs under sudo so the storage root keeps the original
/// uid/gid/permission layout of the image layers.
pub fn pull_images(arch: &Arch, store_dir: &Path) -> Result<()> {
    for image in &arch.images {
        println!(
            "  pulling {} ({}) into {}",
            image,
            arch.image_arch(),
            store_dir.display()
        );
        Cmd::new("podman")
            .args(["pull", "--arch", arch.image_arch(), "--root"])
            .arg_path(store_dir)
            .arg(image)
            .sudo()
            .run()
            .with_context(|| format!("failed to pull {image}"))?;
    }
    Ok(())
}
