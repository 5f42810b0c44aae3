//! Release and namespace name rules enforced before helm is spawned.

use crate::{Error, Result};

/// Longest release name helm accepts.
pub const MAX_RELEASE_NAME_LEN: usize = 53;

/// Longest namespace name the API server accepts.
const MAX_NAMESPACE_LEN: usize = 63;

/// Returns `true` for a lowercase DNS-1123 subdomain of at most 53 characters.
///
/// Every dot-separated label is non-empty, made of `a-z`, `0-9` and `-`,
/// and starts and ends with an alphanumeric character.
pub fn is_release_name(name: &str) -> bool {
    !name.is_empty() && name.len() <= MAX_RELEASE_NAME_LEN && name.split('.').all(is_dns_label)
}

/// Returns `true` for a DNS-1123 label usable as a namespace.
pub fn is_namespace_name(name: &str) -> bool {
    name.len() <= MAX_NAMESPACE_LEN && is_dns_label(name)
}

fn is_dns_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };

    first.is_ascii_alphanumeric()
        && last.is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

/// Checks the namespace and release name of a release operation.
pub(crate) fn validate(namespace: &str, release: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(Error::InvalidInput("namespace is required".to_owned()));
    }
    if !is_namespace_name(namespace) {
        return Err(Error::InvalidInput(format!("invalid namespace: {namespace}")));
    }
    validate_release(release)
}

pub(crate) fn validate_release(release: &str) -> Result<()> {
    if release.is_empty() {
        return Err(Error::InvalidInput("release name is required".to_owned()));
    }
    if !is_release_name(release) {
        return Err(Error::InvalidInput(format!(
            "invalid release name: {release} (lowercase letters, digits, '-' and '.', \
             at most {MAX_RELEASE_NAME_LEN} characters)"
        )));
    }
    Ok(())
}
