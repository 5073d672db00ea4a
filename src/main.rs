//! storepack - build RPMs that ship pre-pulled container images.
//!
//! A YAML description declares packages, each a set of container images per
//! architecture. For every package the images are pulled, archived, and
//! wrapped in a generated spec whose `%post` registers the image store with
//! crio; the result is fed to rpmbuild and optionally Copr or mock.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use storepack::commands::{self, BuildOpts};

#[derive(Parser)]
#[command(name = "storepack")]
#[command(about = "Build RPMs that ship pre-pulled container images")]
#[command(
    after_help = "QUICK START:\n  storepack preflight          Check required tools\n  storepack srpm set.yaml      Build source RPMs\n  storepack rpm set.yaml <target>   Build binary RPMs via mock"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonOpts {
    /// Scratch directory for pulled image stores
    #[arg(short, long)]
    tmp: Option<PathBuf>,

    /// rpmbuild topdir (SPECS/SOURCES/SRPMS live under it)
    #[arg(short, long)]
    rpmbuild_dir: Option<PathBuf>,

    /// Don't clean up; reuse existing tarballs and SRPMs
    #[arg(short, long)]
    no_cleanup: bool,
}

impl CommonOpts {
    fn into_build_opts(self) -> BuildOpts {
        BuildOpts {
            tmp: self.tmp,
            rpmbuild_dir: self.rpmbuild_dir,
            no_cleanup: self.no_cleanup,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build source RPMs from a yaml definition
    Srpm {
        /// yaml package-set definition
        yaml: PathBuf,

        #[command(flatten)]
        opts: CommonOpts,
    },

    /// Build SRPMs and submit them to a Copr repository
    Copr {
        /// yaml package-set definition
        yaml: PathBuf,

        /// copr repository, like @redhat-et/microshift-containers
        copr_repo: String,

        /// Don't wait for copr builds to finish
        #[arg(short = 'N', long)]
        no_wait: bool,

        #[command(flatten)]
        opts: CommonOpts,
    },

    /// Build binary RPMs via mock from a yaml definition
    Rpm {
        /// yaml package-set definition
        yaml: PathBuf,

        /// mock target, like centos-stream-9-aarch64 (see /etc/mock/*.cfg)
        target: String,

        #[command(flatten)]
        opts: CommonOpts,
    },

    /// Generate spec files from existing tarballs (no podman, no rpmbuild)
    Spec {
        /// yaml package-set definition
        yaml: PathBuf,

        #[command(flatten)]
        opts: CommonOpts,
    },

    /// Check that required external tools are available
    Preflight {
        /// Fail with exit code 1 if any required check fails
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Srpm { yaml, opts } => {
            commands::cmd_srpm(&yaml, &opts.into_build_opts())?;
        }
        Commands::Copr {
            yaml,
            copr_repo,
            no_wait,
            opts,
        } => {
            commands::cmd_copr(&yaml, &opts.into_build_opts(), &copr_repo, no_wait)?;
        }
        Commands::Rpm { yaml, target, opts } => {
            commands::cmd_mock(&yaml, &opts.into_build_opts(), &target)?;
        }
        Commands::Spec { yaml, opts } => {
            commands::cmd_spec(&yaml, &opts.into_build_opts())?;
        }
        Commands::Preflight { strict } => {
            commands::cmd_preflight(strict)?;
        }
    }

    Ok(())
}
