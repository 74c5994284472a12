//! Deployment manifest — the allowlisted project paths present on disk.

use std::path::Path;

use serde::Serialize;

/// Individual files shipped to the VPS, in transfer order.
pub const FILE_ALLOWLIST: &[&str] = &[
    "Dockerfile",
    "docker-compose.yml",
    ".env.production",
    ".dockerignore",
    "package.json",
    "package-lock.json",
    "tsconfig.json",
    "vite.config.ts",
    "drizzle.config.ts",
    "postcss.config.js",
    "tailwind.config.ts",
];

/// Directories shipped recursively, after the individual files.
pub const DIR_ALLOWLIST: &[&str] = &["server", "client", "shared", "migrations"];

/// One manifest entry: a project-relative path slated for archiving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub path: String,
    pub is_dir: bool,
}

impl ManifestEntry {
    /// Display form; directories carry a trailing slash.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.is_dir {
            format!("{}/", self.path)
        } else {
            self.path.clone()
        }
    }
}

/// Build the manifest for `root`: the allowlisted entries that currently
/// exist, preserving allowlist order. Missing entries are skipped without
/// error: the deployment ships whatever subset is present.
#[must_use]
pub fn build(root: &Path) -> Vec<ManifestEntry> {
    let mut entries = Vec::new();

    for name in FILE_ALLOWLIST {
        if root.join(name).is_file() {
            entries.push(ManifestEntry {
                path: (*name).to_string(),
                is_dir: false,
            });
        }
    }

    for name in DIR_ALLOWLIST {
        if root.join(name).is_dir() {
            entries.push(ManifestEntry {
                path: (*name).to_string(),
                is_dir: true,
            });
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, name: &str) {
        std::fs::write(root.join(name), b"x").expect("write file");
    }

    #[test]
    fn test_build_empty_root_yields_empty_manifest() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        assert!(build(dir.path()).is_empty());
    }

    #[test]
    fn test_build_skips_missing_entries_silently() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        touch(dir.path(), "package.json");
        let entries = build(dir.path());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "package.json");
        assert!(!entries[0].is_dir);
    }

    #[test]
    fn test_build_preserves_allowlist_order() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        // Created out of order on purpose.
        touch(dir.path(), "tsconfig.json");
        touch(dir.path(), "Dockerfile");
        std::fs::create_dir(dir.path().join("migrations")).expect("mkdir");
        std::fs::create_dir(dir.path().join("server")).expect("mkdir");

        let entries = build(dir.path());
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["Dockerfile", "tsconfig.json", "server", "migrations"]);
    }

    #[test]
    fn test_build_dockerfile_and_server_only() {
        // End-to-end scenario from the requirements: only Dockerfile and
        // server/ exist, everything else in the allowlist is absent.
        let dir = tempfile::TempDir::new().expect("tempdir");
        touch(dir.path(), "Dockerfile");
        std::fs::create_dir(dir.path().join("server")).expect("mkdir");

        let entries = build(dir.path());
        assert_eq!(
            entries,
            vec![
                ManifestEntry { path: "Dockerfile".to_string(), is_dir: false },
                ManifestEntry { path: "server".to_string(), is_dir: true },
            ]
        );
    }

    #[test]
    fn test_build_ignores_paths_not_in_allowlist() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        touch(dir.path(), "README.md");
        std::fs::create_dir(dir.path().join("node_modules")).expect("mkdir");
        assert!(build(dir.path()).is_empty());
    }

    #[test]
    fn test_build_directory_entry_requires_directory() {
        // A plain file named like an allowlisted directory is not a manifest
        // directory entry.
        let dir = tempfile::TempDir::new().expect("tempdir");
        touch(dir.path(), "server");
        assert!(build(dir.path()).is_empty());
    }

    #[test]
    fn test_display_name_appends_slash_for_directories() {
        let file = ManifestEntry { path: "Dockerfile".to_string(), is_dir: false };
        let dir = ManifestEntry { path: "server".to_string(), is_dir: true };
        assert_eq!(file.display_name(), "Dockerfile");
        assert_eq!(dir.display_name(), "server/");
    }
}
