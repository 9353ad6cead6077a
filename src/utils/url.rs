// src/utils/url.rs

//! URL manipulation utilities.

/// Collapse repeated slashes after the scheme.
///
/// # Examples
/// ```
/// use confluence_sync::utils::url::sanitize;
///
/// assert_eq!(
///     sanitize("http://wiki.example.com//confluence///rest/api/content"),
///     "http://wiki.example.com/confluence/rest/api/content"
/// );
/// ```
pub fn sanitize(url: &str) -> String {
    match url.find("://") {
        Some(idx) => {
            let (scheme, rest) = url.split_at(idx + 3);
            format!("{scheme}{}", collapse_slashes(rest))
        }
        None => collapse_slashes(url),
    }
}

/// Join a server-relative path onto a base URL.
pub fn join(base: &str, path: &str) -> String {
    sanitize(&format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

fn collapse_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_slash = false;
    for c in s.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}
