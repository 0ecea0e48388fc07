use anyhow::{Result, bail};

/// Validates and normalizes a claimed relative asset path from export
/// metadata. This runs both when a pointer is resolved and again right
/// before any byte is written under the destination root; the two call
/// sites must apply the same policy.
///
/// # Errors
///
/// Returns an error if the path is empty, contains a NUL byte or backslash,
/// starts with `/`, carries a drive-letter prefix, or has a `..` segment.
///
/// # Examples
///
/// ```
/// use chatvault::utils::sanitize_asset_path;
///
/// assert_eq!(sanitize_asset_path("./assets//img.png").unwrap(), "assets/img.png");
/// assert!(sanitize_asset_path("../escape.png").is_err());
/// assert!(sanitize_asset_path("/etc/passwd").is_err());
/// ```
pub fn sanitize_asset_path(path: &str) -> Result<String> {
    if path.is_empty() {
        bail!("Asset path is empty");
    }
    if path.contains('\0') {
        bail!("Asset path contains a NUL byte");
    }
    if path.contains('\\') {
        bail!("Asset path contains a backslash: {}", path);
    }
    if path.starts_with('/') {
        bail!("Asset path is absolute: {}", path);
    }
    if has_drive_prefix(path) {
        bail!("Asset path has a drive-letter prefix: {}", path);
    }

    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => bail!("Asset path contains a '..' segment: {}", path),
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        bail!("Asset path has no usable segments: {}", path);
    }

    Ok(segments.join("/"))
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Locates the archive entry holding the payload for a sanitized asset path.
/// Export tools nest assets differently across versions, so this tries the
/// exact key, an `assets/`-prefixed and `assets/`-stripped form, and finally
/// a suffix match against every entry name.
pub fn locate_asset_entry<'a, I>(path: &str, entry_names: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = entry_names.into_iter().collect();

    if names.contains(&path) {
        return Some(path.to_string());
    }

    let prefixed = format!("assets/{}", path);
    if names.iter().any(|n| *n == prefixed) {
        return Some(prefixed);
    }

    if let Some(stripped) = path.strip_prefix("assets/") {
        if names.contains(&stripped) {
            return Some(stripped.to_string());
        }
    }

    let suffix = format!("/{}", path);
    names.iter().find(|n| n.ends_with(&suffix)).map(|n| n.to_string())
}
