/// Separator between a model name and its version suffix (`name:3`)
pub const VERSION_SEPARATOR: char = ':';

/// Version returned for ids without a usable numeric suffix
pub const UNVERSIONED: i64 = -1;

/// Extract the integer version suffix from a model id.
///
/// `"qwen2.5-0.5b:2"` gives `2`. An empty id, an id without `:`, or a
/// suffix that is not a base-10 integer gives [`UNVERSIONED`], which sorts
/// below every parsed version.
#[must_use]
pub fn version(id: &str) -> i64 {
    id.rsplit_once(VERSION_SEPARATOR)
        .and_then(|(_, suffix)| suffix.parse::<i64>().ok())
        .unwrap_or(UNVERSIONED)
}

/// Id with any version suffix removed
#[must_use]
pub fn strip_version(id: &str) -> &str {
    id.split_once(VERSION_SEPARATOR).map_or(id, |(name, _)| name)
}

/// True if the reference carries an explicit version separator
#[must_use]
pub fn has_version(reference: &str) -> bool {
    reference.contains(VERSION_SEPARATOR)
}
