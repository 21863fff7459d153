//! Template retrieval.
//!
//! The knowledge directory starts from a template project served as a ZIP
//! archive (the layout forges use for branch downloads: everything nested
//! under a single root folder, which gets stripped on extraction). A
//! local-directory source exists so the bootstrap flow can be exercised
//! without a network.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Template archive used when `--template` is not given.
pub const DEFAULT_TEMPLATE_URL: &str =
    "https://github.com/agentgrade/agp-template/archive/refs/heads/main.zip";

/// Where the template content comes from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// A ZIP archive fetched over HTTP.
    Remote(String),
    /// A directory copied as-is.
    Local(PathBuf),
}

impl TemplateSource {
    /// Builds a source from a CLI argument, defaulting to the published
    /// template archive. A `file://` or plain-path argument becomes a
    /// local source.
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::Remote(DEFAULT_TEMPLATE_URL.to_string()),
            Some(url) => {
                if let Some(path) = url.strip_prefix("file://") {
                    Self::Local(PathBuf::from(path))
                } else if url.starts_with("http://") || url.starts_with("https://") {
                    Self::Remote(url.to_string())
                } else {
                    Self::Local(PathBuf::from(url))
                }
            }
        }
    }
}

/// Fetches the template into `dest`, creating it if needed.
pub fn fetch(source: &TemplateSource, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create directory: {}", dest.display()))?;

    match source {
        TemplateSource::Remote(url) => fetch_remote(url, dest),
        TemplateSource::Local(dir) => {
            copy_dir(dir, dest).with_context(|| {
                format!("Failed to copy template from {}", dir.display())
            })
        }
    }
}

fn fetch_remote(url: &str, dest: &Path) -> Result<()> {
    tracing::debug!(url, "downloading template");

    let response = reqwest::blocking::Client::new()
        .get(url)
        .header("User-Agent", "agp")
        .send()
        .with_context(|| format!("Failed to download template from {url}"))?;

    if !response.status().is_success() {
        bail!("Template download failed: HTTP {} from {url}", response.status());
    }

    let bytes = response.bytes().context("Failed to read template archive")?;
    tracing::debug!(len = bytes.len(), "template archive downloaded");

    extract_zip(&bytes, dest)
}

/// Extracts a ZIP archive into `dest`, stripping the shared root folder
/// when every entry lives under one.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> Result<()> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Invalid template archive")?;

    let root = common_root(&archive);

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(name) = file.enclosed_name() else {
            continue;
        };

        let relative: PathBuf = match &root {
            Some(root) => match name.strip_prefix(root) {
                Ok(rest) if rest.as_os_str().is_empty() => continue,
                Ok(rest) => rest.to_path_buf(),
                Err(_) => name.clone(),
            },
            None => name.clone(),
        };

        let out = dest.join(&relative);
        if file.is_dir() {
            fs::create_dir_all(&out)?;
        } else {
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut target = fs::File::create(&out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            io::copy(&mut file, &mut target)?;
        }
    }

    Ok(())
}

/// Returns the single first path component shared by all archive entries.
fn common_root<R: io::Read + io::Seek>(archive: &zip::ZipArchive<R>) -> Option<PathBuf> {
    let mut root: Option<String> = None;
    for name in archive.file_names() {
        // A top-level file means there is no shared folder to strip.
        if !name.contains('/') {
            return None;
        }
        let first = name.split('/').next()?.to_string();
        if first.is_empty() {
            return None;
        }
        match &root {
            None => root = Some(first),
            Some(existing) if *existing == first => {}
            Some(_) => return None,
        }
    }
    root.map(PathBuf::from)
}

/// Recursively copies the contents of `src` into `dest`.
pub fn copy_dir(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn make_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            for (name, content) in entries {
                if name.ends_with('/') {
                    writer
                        .add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())
                        .unwrap();
                } else {
                    writer
                        .start_file(*name, SimpleFileOptions::default())
                        .unwrap();
                    writer.write_all(content.as_bytes()).unwrap();
                }
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn extract_strips_single_root_folder() {
        let bytes = make_zip(&[
            ("agp-template-main/", ""),
            ("agp-template-main/INSTRUCTIONS.md", "# Instructions"),
            ("agp-template-main/patterns/README.md", "patterns"),
        ]);

        let dest = tempdir().unwrap();
        extract_zip(&bytes, dest.path()).unwrap();

        assert!(dest.path().join("INSTRUCTIONS.md").is_file());
        assert!(dest.path().join("patterns/README.md").is_file());
        assert!(!dest.path().join("agp-template-main").exists());
    }

    #[test]
    fn extract_keeps_mixed_roots() {
        let bytes = make_zip(&[("a.md", "a"), ("docs/b.md", "b")]);

        let dest = tempdir().unwrap();
        extract_zip(&bytes, dest.path()).unwrap();

        assert!(dest.path().join("a.md").is_file());
        assert!(dest.path().join("docs/b.md").is_file());
    }

    #[test]
    fn local_source_copies_tree() {
        let src = tempdir().unwrap();
        fs::create_dir_all(src.path().join("project")).unwrap();
        fs::write(src.path().join("INSTRUCTIONS.md"), "x").unwrap();
        fs::write(src.path().join("project/README.md"), "y").unwrap();

        let dest = tempdir().unwrap();
        fetch(
            &TemplateSource::Local(src.path().to_path_buf()),
            dest.path(),
        )
        .unwrap();

        assert!(dest.path().join("INSTRUCTIONS.md").is_file());
        assert!(dest.path().join("project/README.md").is_file());
    }

    #[test]
    fn source_from_arg_classifies() {
        assert!(matches!(
            TemplateSource::from_arg(None),
            TemplateSource::Remote(url) if url == DEFAULT_TEMPLATE_URL
        ));
        assert!(matches!(
            TemplateSource::from_arg(Some("https://example.com/t.zip")),
            TemplateSource::Remote(_)
        ));
        assert!(matches!(
            TemplateSource::from_arg(Some("/tmp/template")),
            TemplateSource::Local(_)
        ));
        assert!(matches!(
            TemplateSource::from_arg(Some("file:///tmp/template")),
            TemplateSource::Local(_)
        ));
    }
}
