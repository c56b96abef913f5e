//! Locating MERRA-2 granules for tests that need real files.

use std::path::PathBuf;

/// Environment variable pointing at a directory of downloaded granules.
pub const TEST_DATA_ENV: &str = "TEST_DATA_DIR";

/// Workspace root, two levels above this crate's manifest.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// Directories searched for granules, most specific first.
pub fn granule_dirs() -> Vec<PathBuf> {
    let root = workspace_root();
    let mut dirs: Vec<PathBuf> = std::env::var_os(TEST_DATA_ENV)
        .map(PathBuf::from)
        .into_iter()
        .collect();
    dirs.push(root.join("data").join("cache"));
    dirs.push(root.join("testdata"));
    dirs
}

/// First existing path for a granule file name.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    granule_dirs()
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_has_manifest() {
        let root = workspace_root();
        assert!(root.join("Cargo.toml").exists(), "{:?}", root);
        assert!(root.join("crates").join("test-utils").exists());
    }

    #[test]
    fn test_search_order_ends_with_testdata() {
        let dirs = granule_dirs();
        assert_eq!(dirs.last(), Some(&workspace_root().join("testdata")));
    }

    #[test]
    fn test_missing_granule() {
        assert!(find_test_file("MERRA2_000.not_a_granule.19000101.nc4").is_none());
    }
}
