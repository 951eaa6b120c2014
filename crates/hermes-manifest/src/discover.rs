//! Manifest discovery.
//!
//! The service directory is the nearest directory, starting at a given one
//! and walking towards the filesystem root, that contains a manifest file.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ManifestError, ManifestResult};

/// Manifest file names tried in each directory, in order.
pub const DEFAULT_MANIFEST_NAMES: [&str; 2] = ["serverless.yml", "serverless.yaml"];

/// Returns the manifest file in `dir`, trying `names` in order.
#[must_use]
pub fn manifest_file_in<S: AsRef<str>>(dir: &Path, names: &[S]) -> Option<PathBuf> {
    names
        .iter()
        .map(|name| dir.join(name.as_ref()))
        .find(|candidate| candidate.is_file())
}

/// Finds the service directory by walking up from `start`.
///
/// # Example
///
/// ```
/// use hermes_manifest::{find_service_path, DEFAULT_MANIFEST_NAMES};
///
/// let root = tempfile::tempdir().unwrap();
/// std::fs::write(root.path().join("serverless.yml"), "service: demo\n").unwrap();
/// let nested = root.path().join("src/handlers");
/// std::fs::create_dir_all(&nested).unwrap();
///
/// let found = find_service_path(&nested, &DEFAULT_MANIFEST_NAMES).unwrap();
/// assert_eq!(found, root.path());
/// ```
pub fn find_service_path<S: AsRef<str>>(start: &Path, names: &[S]) -> ManifestResult<PathBuf> {
    for dir in start.ancestors() {
        if let Some(manifest) = manifest_file_in(dir, names) {
            debug!(
                start = %start.display(),
                manifest = %manifest.display(),
                "found service manifest"
            );
            return Ok(dir.to_path_buf());
        }
    }
    Err(ManifestError::not_found(start))
}

/// Finds the service directory by walking up from the working directory.
pub fn find_service_path_from_cwd<S: AsRef<str>>(names: &[S]) -> ManifestResult<PathBuf> {
    let cwd = std::env::current_dir().map_err(|source| ManifestError::CurrentDir { source })?;
    find_service_path(&cwd, names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_finds_manifest_in_same_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("serverless.yml"), "service: basic\n").unwrap();

        let found = find_service_path(dir.path(), &DEFAULT_MANIFEST_NAMES).unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn test_finds_manifest_in_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("serverless.yml"), "service: basic\n").unwrap();
        let subdir = dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();

        let found = find_service_path(&subdir, &DEFAULT_MANIFEST_NAMES).unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn test_yaml_extension_accepted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("serverless.yaml"), "service: basic\n").unwrap();

        let manifest = manifest_file_in(dir.path(), &DEFAULT_MANIFEST_NAMES).unwrap();
        assert!(manifest.ends_with("serverless.yaml"));
    }

    #[test]
    fn test_name_order_is_preference() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("serverless.yml"), "service: a\n").unwrap();
        fs::write(dir.path().join("serverless.yaml"), "service: b\n").unwrap();

        let manifest = manifest_file_in(dir.path(), &DEFAULT_MANIFEST_NAMES).unwrap();
        assert!(manifest.ends_with("serverless.yml"));
    }

    #[test]
    fn test_directory_named_like_manifest_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("serverless.yml")).unwrap();
        assert!(manifest_file_in(dir.path(), &DEFAULT_MANIFEST_NAMES).is_none());
    }

    #[test]
    fn test_not_found_names_start_dir() {
        let dir = tempfile::tempdir().unwrap();
        let start = dir.path().join("no-serverless-found");
        fs::create_dir(&start).unwrap();

        match find_service_path(&start, &["hermes-test-missing-manifest.yml"]) {
            Err(ManifestError::NotFound { start_dir }) => assert_eq!(start_dir, start),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
