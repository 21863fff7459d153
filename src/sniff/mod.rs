//! Project type detection.
//!
//! Classifies the host project by the dependency names in its manifest.
//! The result only flavors generated documentation, so detection is a
//! static lookup table, best-effort, and never an error.

use std::fmt;
use std::fs;
use std::path::Path;

/// Classification of the host project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    NextJs,
    React,
    Vue,
    Express,
    Node,
    Rust,
    Unknown,
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectKind::NextJs => "Next.js",
            ProjectKind::React => "React",
            ProjectKind::Vue => "Vue",
            ProjectKind::Express => "Express",
            ProjectKind::Node => "Node.js",
            ProjectKind::Rust => "Rust",
            ProjectKind::Unknown => "unknown",
        };
        write!(f, "{name}")
    }
}

/// Dependency names checked in order; the first match wins.
const NODE_MARKERS: [(&str, ProjectKind); 4] = [
    ("next", ProjectKind::NextJs),
    ("react", ProjectKind::React),
    ("vue", ProjectKind::Vue),
    ("express", ProjectKind::Express),
];

/// Detects the project type from manifests at `project_root`.
pub fn detect(project_root: &Path) -> ProjectKind {
    if let Some(kind) = detect_node(project_root) {
        return kind;
    }
    if project_root.join("Cargo.toml").exists() {
        return ProjectKind::Rust;
    }
    ProjectKind::Unknown
}

fn detect_node(project_root: &Path) -> Option<ProjectKind> {
    let raw = fs::read_to_string(project_root.join("package.json")).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&raw).ok()?;

    let has_dep = |name: &str| {
        ["dependencies", "devDependencies"]
            .iter()
            .any(|section| manifest.get(section).and_then(|d| d.get(name)).is_some())
    };

    for (name, kind) in NODE_MARKERS {
        if has_dep(name) {
            return Some(kind);
        }
    }
    Some(ProjectKind::Node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn with_package_json(content: &str) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), content).unwrap();
        dir
    }

    #[test]
    fn detects_react() {
        let dir = with_package_json(r#"{"dependencies":{"react":"^18"}}"#);
        assert_eq!(detect(dir.path()), ProjectKind::React);
    }

    #[test]
    fn next_wins_over_react() {
        let dir = with_package_json(r#"{"dependencies":{"react":"^18","next":"14"}}"#);
        assert_eq!(detect(dir.path()), ProjectKind::NextJs);
    }

    #[test]
    fn dev_dependencies_count() {
        let dir = with_package_json(r#"{"devDependencies":{"vue":"^3"}}"#);
        assert_eq!(detect(dir.path()), ProjectKind::Vue);
    }

    #[test]
    fn plain_node_without_markers() {
        let dir = with_package_json(r#"{"dependencies":{"left-pad":"1"}}"#);
        assert_eq!(detect(dir.path()), ProjectKind::Node);
    }

    #[test]
    fn rust_from_cargo_manifest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();
        assert_eq!(detect(dir.path()), ProjectKind::Rust);
    }

    #[test]
    fn unknown_without_manifests() {
        let dir = tempdir().unwrap();
        assert_eq!(detect(dir.path()), ProjectKind::Unknown);
    }

    #[test]
    fn malformed_manifest_is_not_fatal() {
        let dir = with_package_json("{broken");
        assert_eq!(detect(dir.path()), ProjectKind::Unknown);
    }
}
