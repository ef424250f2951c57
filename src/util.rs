use std::iter::repeat;
use std::path::{Path, PathBuf};

use rocket::http::RawStr;

pub fn find_first_subpath<P: AsRef<Path>, F: Fn(&Path) -> bool>(
    root: impl AsRef<Path>,
    subpaths: &[P],
    search: F,
) -> Option<PathBuf> {
    subpaths
        .iter()
        .zip(repeat(root.as_ref()))
        .map(|(b, a)| a.join(b))
        .find(|it: &PathBuf| search(it))
}

/// Appends a one-shot notification to a local URI.
pub fn with_notification(path: &str, message: &str) -> String {
    format!(
        "{}?notification={}",
        path,
        RawStr::new(message).percent_encode()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_is_encoded() {
        let uri = with_notification("/app/workload/", "You have been logged out.");
        assert!(uri.starts_with("/app/workload/?notification=You%20have%20been"));
        assert!(!uri.contains(' '));
    }
}
