//! Driver candidate classification by package name

/// Package name prefixes that mark a driver
pub const DRIVER_PREFIXES: &[&str] = &["neeo-", "neeo_"];

/// Packages that match a driver prefix but are not drivers
pub const DENY_LIST: &[&str] = &["neeo-sdk"];

/// Keep the names that start with an allowed prefix and are not deny-listed
///
/// Matching is exact and case-sensitive. Input order is preserved.
#[must_use]
pub fn classify<S>(names: &[String], allowed_prefixes: &[S], deny_list: &[S]) -> Vec<String>
where
    S: AsRef<str>,
{
    names
        .iter()
        .filter(|name| is_driver_candidate(name, allowed_prefixes, deny_list))
        .cloned()
        .collect()
}

/// Whether a single package name is a driver candidate
#[must_use]
pub fn is_driver_candidate<S>(name: &str, allowed_prefixes: &[S], deny_list: &[S]) -> bool
where
    S: AsRef<str>,
{
    let prefixed = allowed_prefixes
        .iter()
        .any(|prefix| name.starts_with(prefix.as_ref()));
    let denied = deny_list.iter().any(|denied| denied.as_ref() == name);

    prefixed && !denied
}
