use std::path::{Path, PathBuf};

/// File name used when an address names a directory (`.../dir/`)
pub const DIRECTORY_INDEX: &str = "index";

/// Computes the local path an address is mirrored to
///
/// The scheme prefix is stripped and the remaining `host/path` structure is
/// kept under `download_dir`. The fragment is dropped; a query string stays
/// part of the last segment. Addresses that end in `/` (or have no path)
/// map to [`DIRECTORY_INDEX`] inside the corresponding directory.
///
/// Returns None if the address has no host or contains `.`/`..` segments.
///
/// # Examples
///
/// ```
/// use mirror_crawl::url::mirror_path;
/// use std::path::Path;
///
/// let path = mirror_path(Path::new("/tmp/dl"), "https://example.test/sub/b.txt").unwrap();
/// assert_eq!(path, Path::new("/tmp/dl/example.test/sub/b.txt"));
/// ```
pub fn mirror_path(download_dir: &Path, address: &str) -> Option<PathBuf> {
    let without_scheme = match address.find("://") {
        Some(idx) => &address[idx + 3..],
        None => address,
    };
    let without_fragment = without_scheme
        .split_once('#')
        .map_or(without_scheme, |(before, _)| before);

    let mut segments = without_fragment.split('/');
    let host = segments.next().filter(|h| !h.is_empty())?;

    let mut path = download_dir.join(host);
    let mut last_was_file = false;
    for segment in segments {
        if segment.is_empty() {
            last_was_file = false;
            continue;
        }
        if segment == "." || segment == ".." {
            return None;
        }
        path.push(segment);
        last_was_file = true;
    }

    if !last_was_file {
        path.push(DIRECTORY_INDEX);
    }

    Some(path)
}
