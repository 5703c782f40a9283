//! Canonical form of absolute locations.
//!
//! Locations are URL-like strings such as `file:///storage/emulated/0/Download/`.
//! Before two locations are compared they are normalized:
//!
//! - the scheme prefix (everything up to and including `://`) is kept verbatim,
//! - runs of `/` in the remainder collapse to a single `/`,
//! - directory locations end with exactly one `/`, file locations with none,
//! - percent-encoded sequences are left as they are and compared byte-wise.
//!
//! Containment is tested component-wise on the canonical form, so
//! `file:///sdcard2/` is not under `file:///sdcard/`. Relative traversal
//! components (`.` and `..`) have no meaning here and make a location
//! unresolvable against a root.

const SCHEME_SEPARATOR: &str = "://";

/// Split `location` into its scheme prefix (including `://`) and the rest
pub fn split_scheme(location: &str) -> (&str, &str) {
    match location.find(SCHEME_SEPARATOR) {
        Some(idx) => location.split_at(idx + SCHEME_SEPARATOR.len()),
        None => ("", location),
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

/// Canonical form of a directory location
pub fn normalize_dir(location: &str) -> String {
    let (scheme, rest) = split_scheme(location);
    let mut out = format!("{}{}", scheme, collapse_slashes(rest));
    if !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// Canonical form of a file location
pub fn normalize_file(location: &str) -> String {
    let (scheme, rest) = split_scheme(location);
    let collapsed = collapse_slashes(rest);
    format!("{}{}", scheme, collapsed.trim_end_matches('/'))
}

/// Non-empty path components of `location` below `root`.
///
/// Returns `None` when `location` is not `root` or one of its descendants, or
/// when a component is `.` or `..`.
pub fn relative_components(root: &str, location: &str) -> Option<Vec<String>> {
    let root = normalize_dir(root);
    let location = normalize_dir(location);

    let rest = location.strip_prefix(&root)?;
    let components: Vec<String> = rest
        .split('/')
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();

    if components.iter().any(|c| c == "." || c == "..") {
        return None;
    }
    Some(components)
}

/// Whether `location` is `root` or lies below it
pub fn is_within(root: &str, location: &str) -> bool {
    relative_components(root, location).is_some()
}

/// Directory location for `components` below `root`
pub fn join_dir<S: AsRef<str>>(root: &str, components: &[S]) -> String {
    let mut out = normalize_dir(root);
    for component in components {
        out.push_str(component.as_ref());
        out.push('/');
    }
    out
}

/// Parent of a directory location, computed by dropping its final non-empty
/// component. `None` at `root` or outside it.
pub fn parent_dir(root: &str, location: &str) -> Option<String> {
    let components = relative_components(root, location)?;
    let (_, parent) = components.split_last()?;
    Some(join_dir(root, parent))
}
