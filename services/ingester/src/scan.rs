//! Storage-root enumeration and derivative probes.

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// File extensions considered candidate assets (lowercased comparison).
pub const ASSET_EXTENSIONS: &[&str] = &["tif", "tiff", "shp", "geojson", "gpkg"];

/// A candidate asset discovered under the storage root.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    /// Absolute path on the storage mount.
    pub path: PathBuf,

    /// Path relative to the root, forward-slash separated. Used for asset
    /// hrefs and derivative lookups.
    pub rel_path: String,

    /// File size in bytes.
    pub size: u64,
}

/// Read-only view of a storage root: enumeration plus derivative existence
/// probes.
pub struct StorageWalker {
    root: PathBuf,
    derivative_root: PathBuf,
}

impl StorageWalker {
    pub fn new(root: impl Into<PathBuf>, derivative_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            derivative_root: derivative_root.into(),
        }
    }

    /// Enumerate candidate asset files under the root, skipping the
    /// derivative output subtree. Unreadable entries are logged and skipped.
    pub fn candidates(&self) -> Vec<CandidateFile> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !e.path().starts_with(&self.derivative_root));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if !has_asset_extension(entry.path()) {
                continue;
            }

            let rel_path = match entry.path().strip_prefix(&self.root) {
                Ok(rel) => rel_path_string(rel),
                Err(_) => continue,
            };

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

            files.push(CandidateFile {
                path: entry.path().to_path_buf(),
                rel_path,
                size,
            });
        }

        files
    }

    /// Expected derivative location for an asset:
    /// `<derivative_root>/thumb/<relative-path>.jpg`.
    pub fn thumbnail_path(&self, rel_path: &str) -> PathBuf {
        self.derivative_root
            .join("thumb")
            .join(Path::new(rel_path).with_extension("jpg"))
    }

    /// Existence probe for the derivative; absence is not an error.
    pub fn thumbnail_exists(&self, rel_path: &str) -> bool {
        self.thumbnail_path(rel_path).is_file()
    }
}

fn has_asset_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ASSET_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn rel_path_string(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_candidates_filter_and_rel_paths() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        touch(&root.join("2023/2023_Asan_B_cog.tif"));
        touch(&root.join("2022/2022_Gamcho_cog.TIF"));
        touch(&root.join("vectors/2023_Asan_cog.geojson"));
        touch(&root.join("notes/readme.txt"));
        // Derivative subtree must not be re-ingested
        touch(&root.join("result/thumb/2023/2023_Asan_B_cog.jpg"));

        let walker = StorageWalker::new(root, root.join("result"));
        let mut rels: Vec<String> = walker.candidates().into_iter().map(|c| c.rel_path).collect();
        rels.sort();

        assert_eq!(
            rels,
            vec![
                "2022/2022_Gamcho_cog.TIF",
                "2023/2023_Asan_B_cog.tif",
                "vectors/2023_Asan_cog.geojson",
            ]
        );
    }

    #[test]
    fn test_candidate_size() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("2023_Asan_cog.tif"), vec![0u8; 128]).unwrap();

        let walker = StorageWalker::new(root, root.join("result"));
        let candidates = walker.candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].size, 128);
    }

    #[test]
    fn test_thumbnail_probe() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let walker = StorageWalker::new(root, root.join("result"));

        assert_eq!(
            walker.thumbnail_path("2023/2023_Asan_B_cog.tif"),
            root.join("result/thumb/2023/2023_Asan_B_cog.jpg")
        );
        assert!(!walker.thumbnail_exists("2023/2023_Asan_B_cog.tif"));

        touch(&root.join("result/thumb/2023/2023_Asan_B_cog.jpg"));
        assert!(walker.thumbnail_exists("2023/2023_Asan_B_cog.tif"));
    }
}
