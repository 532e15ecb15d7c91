use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Returned for anything that does not parse as an absolute URL
pub const FALLBACK_FILENAME: &str = "invalid-url.pdf";

/// Stem used when every segment cleans away to nothing. A base of `.` or `/`
/// has no alphanumerics left to derive from, and a bare `.pdf` is not a usable name.
const EMPTY_STEM: &str = "document";

/// Query parameter carrying the `~~`-delimited product identifier
const PRODUCT_PARAM: &str = "prd";
const SEGMENT_DELIMITER: &str = "~~";

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9]+").expect("valid sanitizer pattern")
});

/// Derive a filesystem-safe `.pdf` filename from a download URL.
///
/// Document-downloader URLs encode the product in `prd`, e.g.
/// `?prd=HRLS00001-3~~PDF~~MTR~~AGHS~~EN` becomes `hrls00001-3-pdf-mtr-aghs-en.pdf`.
/// Direct links fall back to the last path segment.
///
/// Distinct URLs can clean to the same name; the later download then
/// overwrites the earlier file.
pub fn derive_filename(raw_url: &str) -> String {
    let parsed = match Url::parse(raw_url) {
        Ok(url) => url,
        Err(_) => return FALLBACK_FILENAME.to_string(),
    };

    let product = parsed
        .query_pairs()
        .find(|(key, _)| key == PRODUCT_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty());

    let segments: Vec<String> = match product {
        Some(value) => value.split(SEGMENT_DELIMITER).map(str::to_string).collect(),
        None => {
            let base = path_base(&parsed);
            vec![base.strip_suffix(".pdf").unwrap_or(&base).to_string()]
        }
    };

    let cleaned: Vec<String> = segments
        .iter()
        .map(|segment| clean_segment(segment))
        .filter(|segment| !segment.is_empty())
        .collect();

    let mut filename = if cleaned.is_empty() {
        EMPTY_STEM.to_string()
    } else {
        cleaned.join("-")
    };

    if !filename.ends_with(".pdf") {
        filename.push_str(".pdf");
    }
    filename
}

/// Last element of the decoded path. An empty path yields `.`
fn path_base(url: &Url) -> String {
    let path = urlencoding::decode(url.path())
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| url.path().to_string());

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { ".".to_string() } else { "/".to_string() };
    }

    trimmed.rsplit('/').next().unwrap_or(trimmed).to_string()
}

fn clean_segment(segment: &str) -> String {
    NON_ALPHANUMERIC
        .replace_all(segment, "-")
        .trim_matches('-')
        .to_lowercase()
}
