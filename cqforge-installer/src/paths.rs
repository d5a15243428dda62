use std::path::{Path, PathBuf};

pub const QUICKSTART_DIR: &str = "crx-quickstart";
pub const LICENSE_FILE: &str = "license.properties";
pub const TMP_SUFFIX: &str = ".cqforge.tmp";

/// Last path segment of `url`, ignoring any query or fragment.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    let after_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    let (_, path) = after_scheme.split_once('/')?;
    path.rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

pub fn quickstart_dir(instance_home: &Path) -> PathBuf {
    instance_home.join(QUICKSTART_DIR)
}

pub fn license_path(instance_home: &Path) -> PathBuf {
    instance_home.join(LICENSE_FILE)
}

/// `<dest>.cqforge.tmp`, next to `dest` so the final rename stays on one filesystem.
pub fn tmp_path(dest: &Path) -> PathBuf {
    PathBuf::from(format!("{}{TMP_SUFFIX}", dest.display()))
}
