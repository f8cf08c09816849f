use std::collections::HashMap;
use url::Url;

/// A path segment seen more often than this marks a crawler trap
pub const DEFAULT_SEGMENT_REPEAT_LIMIT: usize = 4;

/// Department labels allowed directly in front of `uci.edu`
pub const ALLOWED_DEPARTMENTS: [&str; 4] = ["ics", "cs", "informatics", "stat"];

/// Path extensions that never hold crawlable HTML
const DENIED_EXTENSIONS: &[&str] = &[
    "css", "js", "bmp", "gif", "jpg", "jpeg", "ico", "png", "tif", "tiff", "mid", "mp2", "mp3",
    "mp4", "wav", "avi", "mov", "mpeg", "ram", "m4v", "mkv", "ogg", "ogv", "pdf", "ps", "eps",
    "tex", "ppt", "pptx", "doc", "docx", "xls", "xlsx", "names", "data", "dat", "exe", "bz2",
    "tar", "msi", "bin", "7z", "psd", "dmg", "iso", "epub", "dll", "cnf", "tgz", "sha1", "thmx",
    "mso", "arff", "rtf", "jar", "csv", "rm", "smil", "wmv", "swf", "wma", "zip", "rar", "gz",
];

/// Decide whether `url` may be crawled, using the default trap threshold.
/// Anything that fails to parse is simply not valid.
pub fn is_valid(url: &str) -> bool {
    is_valid_with_limit(url, DEFAULT_SEGMENT_REPEAT_LIMIT)
}

/// Same as [`is_valid`] with an explicit repeated-segment limit
pub fn is_valid_with_limit(url: &str, segment_repeat_limit: usize) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    if !is_allowed_host(host) {
        return false;
    }
    let path = parsed.path().to_ascii_lowercase();
    !has_denied_extension(&path) && !is_path_trap(&path, segment_repeat_limit)
}

/// True when the host's labels end in `<department>.uci.edu`
pub fn is_allowed_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    match labels.as_slice() {
        [.., department, "uci", "edu"] => ALLOWED_DEPARTMENTS.contains(department),
        _ => false,
    }
}

/// Host check for a full URL, used when deciding whether to follow a redirect
pub fn is_in_scope(url: &Url) -> bool {
    url.host_str().is_some_and(is_allowed_host)
}

fn has_denied_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('.') {
        Some((_, ext)) => DENIED_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Catches `/page/page/page/...` style paths
fn is_path_trap(path: &str, limit: usize) -> bool {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let count = seen.entry(segment).or_insert(0);
        *count += 1;
        if *count > limit {
            return true;
        }
    }
    false
}

/// Key for visit counting: scheme, host and path with query and fragment dropped
pub fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_query(None);
    normalized.set_fragment(None);
    normalized.to_string()
}
