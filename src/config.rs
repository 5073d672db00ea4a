//! Package-set description and build environment.
//!
//! The YAML description is deserialized into typed structs and validated at
//! load time, so the rest of the pipeline never sees a half-formed package.
//!
//! Directory defaults follow rpmbuild conventions (`~/rpmbuild`) and can be
//! overridden by CLI flags or the `STOREPACK_RPMBUILD_DIR` /
//! `STOREPACK_TMP` environment variables (a `.env` file is honored too).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level package-set description.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageSet {
    pub packages: Vec<Package>,
}

/// One package definition. Identity is (name, version, release).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub release: Option<String>,
    pub license: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Image store path; defaults to `/usr/lib/container-images/<name>/`.
    pub path: Option<String>,
    pub arch: Vec<Arch>,
}

/// One architecture of a package.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Arch {
    pub name: String,
    /// Architecture name podman should pull for, when it differs from the
    /// rpm architecture (e.g. rpm `x86_64` vs OCI `amd64`).
    pub image_arch: Option<String>,
    pub images: Vec<String>,
}

impl PackageSet {
    /// Load and validate a package-set description from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let set: PackageSet = serde_yaml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> Result<()> {
        if self.packages.is_empty() {
            return Err(Error::Config("no packages declared".into()));
        }
        for package in &self.packages {
            if package.name.is_empty() {
                return Err(Error::Config("package with empty name".into()));
            }
            if package.version.is_empty() {
                return Err(Error::Config(format!(
                    "package {} has an empty version",
                    package.name
                )));
            }
            if package.arch.is_empty() {
                return Err(Error::Config(format!(
                    "package {} declares no architectures",
                    package.name
                )));
            }
            for arch in &package.arch {
                if arch.name.is_empty() {
                    return Err(Error::Config(format!(
                        "package {} has an architecture with no name",
                        package.name
                    )));
                }
                if arch.images.is_empty() {
                    return Err(Error::Config(format!(
                        "package {} arch {} declares no images",
                        package.name, arch.name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Package {
    /// Release string, defaulting to `0` like the generated spec does.
    pub fn release(&self) -> &str {
        self.release.as_deref().unwrap_or("0")
    }

    /// `name-version-release`, the stem shared by spec/srpm/tarball names.
    pub fn nvr(&self) -> String {
        format!("{}-{}-{}", self.name, self.version, self.release())
    }

    pub fn spec_filename(&self) -> String {
        format!("{}.spec", self.nvr())
    }

    pub fn srpm_filename(&self) -> String {
        format!("{}.src.rpm", self.nvr())
    }

    pub fn tarball_filename(&self, arch: &str) -> String {
        format!("{}-{arch}.tar.xz", self.nvr())
    }
}

impl Arch {
    /// Architecture podman pulls for; falls back to the rpm name.
    pub fn image_arch(&self) -> &str {
        self.image_arch.as_deref().unwrap_or(&self.name)
    }
}

/// Resolved build directories and flags for one invocation.
#[derive(Debug, Clone)]
pub struct BuildEnv {
    /// rpmbuild `_topdir` (SPECS/SOURCES/SRPMS live under it).
    pub rpmbuild_dir: PathBuf,
    /// Scratch directory image stores are pulled into.
    pub tmp_dir: PathBuf,
    /// Reuse existing tarballs and SRPMs instead of rebuilding.
    pub no_cleanup: bool,
}

impl BuildEnv {
    /// Resolve directories: CLI flag, then environment, then default.
    pub fn resolve(
        rpmbuild_dir: Option<PathBuf>,
        tmp_dir: Option<PathBuf>,
        no_cleanup: bool,
    ) -> Result<Self> {
        let rpmbuild_dir = match rpmbuild_dir.or_else(|| env_path("STOREPACK_RPMBUILD_DIR")) {
            Some(dir) => expand_tilde(&dir)?,
            None => home_dir()?.join("rpmbuild"),
        };
        let tmp_dir = match tmp_dir.or_else(|| env_path("STOREPACK_TMP")) {
            Some(dir) => expand_tilde(&dir)?,
            None => PathBuf::from("/tmp/containers"),
        };

        Ok(Self {
            rpmbuild_dir,
            tmp_dir,
            no_cleanup,
        })
    }

    pub fn specs_dir(&self) -> PathBuf {
        self.rpmbuild_dir.join("SPECS")
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.rpmbuild_dir.join("SOURCES")
    }

    pub fn srpms_dir(&self) -> PathBuf {
        self.rpmbuild_dir.join("SRPMS")
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).map(PathBuf::from)
}

fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| Error::Config("cannot determine home directory".into()))
}

fn expand_tilde(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(home_dir()?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const GOOD: &str = r#"
packages:
  - name: microshift-images
    version: "4.10"
    release: "3"
    license: Apache-2.0
    summary: Container images for microshift
    path: /usr/lib/microshift-images
    arch:
      - name: x86_64
        image_arch: amd64
        images:
          - quay.io/example/pod:latest
      - name: aarch64
        images:
          - quay.io/example/pod:latest
"#;

    #[test]
    fn parses_a_full_description() {
        let set: PackageSet = serde_yaml::from_str(GOOD).unwrap();
        set.validate().unwrap();

        let package = &set.packages[0];
        assert_eq!(package.nvr(), "microshift-images-4.10-3");
        assert_eq!(package.arch[0].image_arch(), "amd64");
        assert_eq!(package.arch[1].image_arch(), "aarch64");
        assert_eq!(
            package.tarball_filename("x86_64"),
            "microshift-images-4.10-3-x86_64.tar.xz"
        );
    }

    #[test]
    fn release_defaults_to_zero() {
        let yaml = r#"
packages:
  - name: p
    version: "1"
    arch:
      - name: x86_64
        images: [img]
"#;
        let set: PackageSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(set.packages[0].release(), "0");
        assert_eq!(set.packages[0].srpm_filename(), "p-1-0.src.rpm");
    }

    #[test]
    fn rejects_empty_images() {
        let yaml = r#"
packages:
  - name: p
    version: "1"
    arch:
      - name: x86_64
        images: []
"#;
        let set: PackageSet = serde_yaml::from_str(yaml).unwrap();
        let err = set.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_unknown_fields() {
        let yaml = r#"
packages:
  - name: p
    version: "1"
    flavor: spicy
    arch:
      - name: x86_64
        images: [img]
"#;
        assert!(serde_yaml::from_str::<PackageSet>(yaml).is_err());
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = PackageSet::load(Path::new("/nonexistent/set.yaml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    #[serial]
    fn env_overrides_apply_when_flags_absent() {
        std::env::set_var("STOREPACK_RPMBUILD_DIR", "/srv/rpmbuild");
        std::env::set_var("STOREPACK_TMP", "/srv/tmp");
        let env = BuildEnv::resolve(None, None, false).unwrap();
        std::env::remove_var("STOREPACK_RPMBUILD_DIR");
        std::env::remove_var("STOREPACK_TMP");

        assert_eq!(env.rpmbuild_dir, PathBuf::from("/srv/rpmbuild"));
        assert_eq!(env.tmp_dir, PathBuf::from("/srv/tmp"));
    }

    #[test]
    #[serial]
    fn flags_beat_environment() {
        std::env::set_var("STOREPACK_RPMBUILD_DIR", "/srv/rpmbuild");
        let env = BuildEnv::resolve(Some(PathBuf::from("/flag/rpmbuild")), None, true).unwrap();
        std::env::remove_var("STOREPACK_RPMBUILD_DIR");

        assert_eq!(env.rpmbuild_dir, PathBuf::from("/flag/rpmbuild"));
        assert!(env.no_cleanup);
        assert_eq!(env.specs_dir(), PathBuf::from("/flag/rpmbuild/SPECS"));
    }

    #[test]
    #[serial]
    fn tilde_expands_to_home() {
        let env = BuildEnv::resolve(Some(PathBuf::from("~/rpmbuild")), None, false).unwrap();
        let home = dirs::home_dir().unwrap();
        assert_eq!(env.rpmbuild_dir, home.join("rpmbuild"));
    }
}
