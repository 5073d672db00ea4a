//! Spec file generation.
//!
//! [`render_fragments`] turns one architecture's archive scan into the text
//! blocks the spec needs (`%files` attributes, guarded extraction, source
//! declaration), and [`SpecFile`] accumulates those blocks across
//! architectures before substituting them into the spec template.
//!
//! Placeholder substitution is strict: required fields with no value fail
//! finalization before anything is written, optional fields fall back to
//! declared defaults.

use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{self, ArchiveEntry, EntryKind};
use crate::error::{Error, Result};

/// Stock spec template. Placeholders use `%%_NAME_%%` tokens so they cannot
/// collide with rpm's own `%` macros.
///
/// The `%post`/`%postun` scriptlets register and deregister the image store
/// with the container runtime's storage configuration; the `%install` fixup
/// gives unreadable files a floor mode so cpio can archive them.
pub const SPEC_TEMPLATE: &str = r#"# Spec file generated by storepack. Do not edit by hand.
Name: %%_NAME_%%

# The payload is an opaque image store; rpm must not post-process it.
%global __os_install_post /bin/true
%global __arch_install_post /bin/true

AutoReqProv: no

%global imageStore %%_IMAGE_STORE_%%

Version: %%_VERSION_%%
Release: %%_RELEASE_%%

Summary: %%_SUMMARY_%%
License: %%_LICENSE_%%
%%_URL_%%

%%_SOURCES_%%

Requires: crio

%description

%%_DESCRIPTION_%%

%prep

if [ -d %{buildroot}%{imageStore} ]
then
   rm -rf %{buildroot}%{imageStore}
fi

%clean
find %{buildroot} -not -writable -not -type l -exec chmod u+w {} +
rm -rf %{buildroot}

%install

mkdir -p %{buildroot}%{imageStore}
cd %{buildroot}%{imageStore}

%%_EXTRACT_%%

# cpio cannot read mode-000 files; give them a floor mode
find ./ -perm 000 -exec chmod %%_FIXUP_MODE_%% {} +

%post

# only on first install (1), not on upgrades (2)
if [ $1 -eq 1 ]; then
   sed -i '/^additionalimagestores =*/a "%{imageStore}",' /etc/containers/storage.conf
   systemctl is-active --quiet crio && systemctl restart --quiet crio || true
fi

%postun

# only on erase (0), not on upgrades (1)
if [ $1 -eq 0 ]; then
  sed -i '\:%{imageStore}:d' /etc/containers/storage.conf
  systemctl is-active --quiet crio && systemctl restart --quiet crio || true
fi

%files
%%_FILES_%%

%changelog
* Tue Jan 2 2024 storepack <storepack@localhost> . %%_VERSION_%%-%%_RELEASE_%%
Read-only crio image store generated by storepack
"#;

/// Text blocks produced from one architecture's archive scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSet {
    /// `%ifarch`-guarded `%attr` lines for the `%files` section.
    pub files: String,
    /// `%ifarch`-guarded extraction statement for `%install`.
    pub extract: String,
    /// `SourceN:` declaration for the archive.
    pub source: String,
}

/// Render the spec fragments for one architecture.
///
/// `source_index` ties the extraction statement and the source declaration
/// to the same archive; the caller must hand out each index exactly once.
pub fn render_fragments(
    entries: &[ArchiveEntry],
    arch: &str,
    source_index: usize,
    archive_name: &str,
) -> FragmentSet {
    let mut files = String::new();
    for entry in entries {
        let line = match entry.kind {
            EntryKind::File => format!(
                "%attr({:o},{},{}) \"%{{imageStore}}{}\"\n",
                entry.mode.unwrap_or(0),
                entry.uid,
                entry.gid,
                entry.path
            ),
            EntryKind::Symlink => format!(
                "%attr(-,{},{}) \"%{{imageStore}}{}\"\n",
                entry.uid, entry.gid, entry.path
            ),
            EntryKind::Directory => format!(
                "%dir %attr({:o},{},{}) \"%{{imageStore}}{}\"\n",
                entry.mode.unwrap_or(0),
                entry.uid,
                entry.gid,
                entry.path
            ),
        };
        files.push_str(&line);
    }

    FragmentSet {
        files: format!("\n\n%ifarch {arch}\n{files}%endif\n"),
        // plain `tar xf`: tar detects the compression itself
        extract: format!("\n\n%ifarch {arch}\ntar xf %{{SOURCE{source_index}}}\n%endif"),
        source: format!("Source{source_index}: {archive_name}\n"),
    }
}

/// Accumulator for one package's spec file.
///
/// Fragments are appended once per architecture, in the package's declared
/// order; [`SpecFile::finalize`] consumes the accumulator, so a finalized
/// spec can never be accumulated into again.
pub struct SpecFile {
    template: &'static str,
    path: PathBuf,
    name: String,
    files: String,
    extract: String,
    sources: String,
    source_index: usize,
    version: Option<String>,
    release: Option<String>,
    license: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    image_store: Option<String>,
    url: Option<String>,
    fixup_mode: Option<String>,
}

impl SpecFile {
    /// Create an accumulator that will write to `path` on finalize.
    pub fn new(name: &str, path: PathBuf) -> Self {
        Self::with_template(name, path, SPEC_TEMPLATE)
    }

    /// Like [`SpecFile::new`] with a caller-supplied template.
    pub fn with_template(name: &str, path: PathBuf, template: &'static str) -> Self {
        Self {
            template,
            path,
            name: name.to_string(),
            files: String::new(),
            extract: String::new(),
            sources: String::new(),
            source_index: 0,
            version: None,
            release: None,
            license: None,
            summary: None,
            description: None,
            image_store: None,
            url: None,
            fixup_mode: None,
        }
    }

    /// The index the next accumulated archive will be declared under.
    pub fn next_source_index(&self) -> usize {
        self.source_index
    }

    /// Append one architecture's fragments and advance the source index.
    pub fn accumulate(&mut self, fragments: FragmentSet) {
        self.files.push_str(&fragments.files);
        self.extract.push_str(&fragments.extract);
        self.sources.push_str(&fragments.source);
        self.source_index += 1;
    }

    /// Scan `tar_path` and accumulate its fragments for `arch`.
    pub fn scan_archive(&mut self, tar_path: &Path, arch: &str) -> Result<()> {
        let entries = archive::scan(tar_path)?;
        let archive_name = tar_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let fragments =
            render_fragments(&entries, arch, self.next_source_index(), &archive_name);
        self.accumulate(fragments);
        Ok(())
    }

    pub fn set_version(&mut self, version: &str) {
        self.version = Some(version.to_string());
    }

    pub fn set_release(&mut self, release: Option<&str>) {
        self.release = release.map(str::to_owned);
    }

    pub fn set_license(&mut self, license: Option<&str>) {
        self.license = license.map(str::to_owned);
    }

    pub fn set_summary(&mut self, summary: Option<&str>) {
        self.summary = summary.map(str::to_owned);
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = description.map(str::to_owned);
    }

    pub fn set_url(&mut self, url: Option<&str>) {
        self.url = url.map(str::to_owned);
    }

    /// Set the image store path. Normalized to end with `/` so the spec can
    /// concatenate member paths directly onto the macro.
    pub fn set_image_store(&mut self, image_store: Option<&str>) {
        self.image_store = image_store.map(|p| {
            if p.ends_with('/') {
                p.to_string()
            } else {
                format!("{p}/")
            }
        });
    }

    /// Override the chmod target for mode-000 files in `%install`.
    pub fn set_fixup_mode(&mut self, mode: &str) {
        self.fixup_mode = Some(mode.to_string());
    }

    /// Validate, substitute, and write the spec file.
    ///
    /// Fails with [`Error::MissingField`] before writing anything if a
    /// required field is empty. Consuming `self` makes a second finalize
    /// (or a late accumulate) unrepresentable.
    pub fn finalize(self) -> Result<PathBuf> {
        let name = require("name", Some(self.name.as_str()))?;
        let version = require("version", self.version.as_deref())?;
        let files = require("files", Some(self.files.as_str()))?;
        let sources = require("sources", Some(self.sources.as_str()))?;
        let extract = require("extract", Some(self.extract.as_str()))?;

        let release = self.release.as_deref().unwrap_or("0");
        let license = self.license.as_deref().unwrap_or("Unknown");
        let summary = self.summary.as_deref().unwrap_or("");
        let description = self.description.as_deref().unwrap_or("");
        let fixup_mode = self.fixup_mode.as_deref().unwrap_or("400");

        let default_store = format!("/usr/lib/container-images/{name}/");
        let image_store = self.image_store.as_deref().unwrap_or(&default_store);

        let url = match self.url.as_deref() {
            Some(url) => format!("URL: {url}"),
            None => String::new(),
        };

        let text = self
            .template
            .replace("%%_NAME_%%", name)
            .replace("%%_VERSION_%%", version)
            .replace("%%_RELEASE_%%", release)
            .replace("%%_SUMMARY_%%", summary)
            .replace("%%_LICENSE_%%", license)
            .replace("%%_URL_%%", &url)
            .replace("%%_DESCRIPTION_%%", description)
            .replace("%%_IMAGE_STORE_%%", image_store)
            .replace("%%_SOURCES_%%", sources)
            .replace("%%_EXTRACT_%%", extract)
            .replace("%%_FILES_%%", files)
            .replace("%%_FIXUP_MODE_%%", fixup_mode);
        debug_assert!(!text.contains("%%_"), "unsubstituted spec placeholder");

        fs::write(&self.path, text)?;
        Ok(self.path)
    }
}

fn require<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::MissingField(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, kind: EntryKind, mode: Option<u32>, uid: u64, gid: u64) -> ArchiveEntry {
        ArchiveEntry {
            path: path.to_string(),
            kind,
            mode,
            uid,
            gid,
        }
    }

    #[test]
    fn file_lines_cover_every_entry_in_order() {
        let entries = vec![
            entry("usr/", EntryKind::Directory, Some(0o755), 0, 0),
            entry("usr/a", EntryKind::File, Some(0o644), 1, 2),
            entry("usr/b", EntryKind::Symlink, None, 3, 4),
        ];
        let fragments = render_fragments(&entries, "x86_64", 0, "pkg.tar.xz");

        let lines: Vec<&str> = fragments
            .files
            .lines()
            .filter(|l| l.contains("%attr"))
            .collect();
        assert_eq!(lines.len(), entries.len());
        assert_eq!(lines[0], "%dir %attr(755,0,0) \"%{imageStore}usr/\"");
        assert_eq!(lines[1], "%attr(644,1,2) \"%{imageStore}usr/a\"");
        assert_eq!(lines[2], "%attr(-,3,4) \"%{imageStore}usr/b\"");
    }

    #[test]
    fn fragments_are_arch_guarded() {
        let entries = vec![entry("a", EntryKind::File, Some(0o600), 0, 0)];
        let fragments = render_fragments(&entries, "aarch64", 2, "pkg-aarch64.tar.xz");

        assert!(fragments.files.contains("%ifarch aarch64\n"));
        assert!(fragments.files.contains("%endif"));
        assert!(fragments.extract.contains("%ifarch aarch64\n"));
        assert_eq!(fragments.source, "Source2: pkg-aarch64.tar.xz\n");
    }

    #[test]
    fn extract_and_source_share_the_index() {
        let entries = vec![entry("a", EntryKind::File, Some(0o600), 0, 0)];
        for index in [0, 1, 7] {
            let fragments = render_fragments(&entries, "x86_64", index, "x.tar.xz");
            assert!(fragments.extract.contains(&format!("%{{SOURCE{index}}}")));
            assert!(fragments.source.starts_with(&format!("Source{index}: ")));
        }
    }

    #[test]
    fn symlink_mode_is_a_dash() {
        let entries = vec![entry("a/b", EntryKind::Symlink, None, 5, 10)];
        let fragments = render_fragments(&entries, "x86_64", 0, "x.tar.xz");
        assert!(fragments
            .files
            .contains("%attr(-,5,10) \"%{imageStore}a/b\""));
    }

    #[test]
    fn zero_mode_rendered_verbatim() {
        let entries = vec![entry("locked", EntryKind::File, Some(0), 0, 0)];
        let fragments = render_fragments(&entries, "x86_64", 0, "x.tar.xz");
        assert!(fragments.files.contains("%attr(0,0,0)"));
    }

    fn spec_in(dir: &Path) -> SpecFile {
        let mut spec = SpecFile::new("demo", dir.join("demo.spec"));
        let entries = vec![entry("a", EntryKind::File, Some(0o644), 0, 0)];
        spec.accumulate(render_fragments(&entries, "x86_64", 0, "demo.tar.xz"));
        spec
    }

    #[test]
    fn missing_version_fails_without_writing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let spec = spec_in(tmp.path());
        let err = spec.finalize().unwrap_err();

        assert!(matches!(err, Error::MissingField("version")));
        assert!(!tmp.path().join("demo.spec").exists());
    }

    #[test]
    fn no_fragments_means_missing_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut spec = SpecFile::new("demo", tmp.path().join("demo.spec"));
        spec.set_version("1.0");
        let err = spec.finalize().unwrap_err();
        assert!(matches!(err, Error::MissingField("files")));
    }

    #[test]
    fn optional_fields_take_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut spec = spec_in(tmp.path());
        spec.set_version("1.0");
        let path = spec.finalize().unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("Release: 0\n"));
        assert!(text.contains("License: Unknown\n"));
        assert!(text.contains("%global imageStore /usr/lib/container-images/demo/\n"));
        assert!(text.contains("chmod 400"));
        assert!(!text.contains("%%_"));
    }

    #[test]
    fn image_store_gains_trailing_slash() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut spec = spec_in(tmp.path());
        spec.set_version("1.0");
        spec.set_image_store(Some("/opt/store"));
        let path = spec.finalize().unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("%global imageStore /opt/store/\n"));
    }

    #[test]
    fn url_renders_as_tag_or_not_at_all() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut spec = spec_in(tmp.path());
        spec.set_version("1.0");
        spec.set_url(Some("https://example.com"));
        let text = fs::read_to_string(spec.finalize().unwrap()).unwrap();
        assert!(text.contains("URL: https://example.com\n"));

        let mut spec = spec_in(tmp.path());
        spec.set_version("1.0");
        let text = fs::read_to_string(spec.finalize().unwrap()).unwrap();
        assert!(!text.contains("URL:"));
    }

    #[test]
    fn source_indices_advance_per_accumulate() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut spec = SpecFile::new("demo", tmp.path().join("demo.spec"));
        let entries = vec![entry("a", EntryKind::File, Some(0o644), 0, 0)];

        for arch in ["x86_64", "aarch64"] {
            let index = spec.next_source_index();
            let name = format!("demo-{arch}.tar.xz");
            spec.accumulate(render_fragments(&entries, arch, index, &name));
        }
        spec.set_version("1.0");

        let text = fs::read_to_string(spec.finalize().unwrap()).unwrap();
        assert!(text.contains("Source0: demo-x86_64.tar.xz"));
        assert!(text.contains("Source1: demo-aarch64.tar.xz"));
        assert!(text.contains("tar xf %{SOURCE0}"));
        assert!(text.contains("tar xf %{SOURCE1}"));
    }
}
