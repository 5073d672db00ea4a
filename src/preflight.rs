//! Preflight checks.
//!
//! Verifies the external tools a build will shell out to before any work
//! starts. Run with `storepack preflight`.

/// Tools every build needs.
const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("podman", "install: sudo dnf install podman"),
    ("tar", "install: sudo dnf install tar"),
    ("rpmbuild", "install: sudo dnf install rpm-build"),
    ("sudo", "image pulls and archiving need root"),
];

/// Tools only some subcommands need.
const OPTIONAL_TOOLS: &[(&str, &str)] = &[
    ("copr", "only needed for `storepack copr` (install: copr-cli)"),
    ("mock", "only needed for `storepack rpm` (install: mock)"),
];

/// Result of a single preflight check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    /// Required tool missing; a build will fail.
    Fail,
    /// Optional tool missing.
    Warn,
}

impl CheckResult {
    fn pass(name: &str, details: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            details: Some(details),
        }
    }

    fn fail(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            details: Some(details.to_string()),
        }
    }

    fn warn(name: &str, details: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warn,
            details: Some(details.to_string()),
        }
    }
}

/// Check every tool the pipeline can shell out to.
pub fn run_checks() -> Vec<CheckResult> {
    let mut results = Vec::new();

    for (tool, hint) in REQUIRED_TOOLS {
        match which::which(tool) {
            Ok(path) => results.push(CheckResult::pass(tool, path.display().to_string())),
            Err(_) => results.push(CheckResult::fail(tool, hint)),
        }
    }
    for (tool, hint) in OPTIONAL_TOOLS {
        match which::which(tool) {
            Ok(path) => results.push(CheckResult::pass(tool, path.display().to_string())),
            Err(_) => results.push(CheckResult::warn(tool, hint)),
        }
    }

    results
}

/// Print a summary; returns true when every required check passed.
pub fn print_summary(results: &[CheckResult]) -> bool {
    println!("Preflight checks:");
    let mut ok = true;

    for result in results {
        let marker = match result.status {
            CheckStatus::Pass => "ok  ",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => {
                ok = false;
                "FAIL"
            }
        };
        match &result.details {
            Some(details) => println!("  [{marker}] {:<10} {details}", result.name),
            None => println!("  [{marker}] {}", result.name),
        }
    }

    if ok {
        println!("All required tools available.");
    } else {
        println!("Missing required tools; builds will fail.");
    }
    ok
}
