use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

/// Path fragments a download target must contain
pub const ALLOWED_PATTERNS: [&str; 2] = [
    "bio-rad-sds.thewercs.com/DirectDocumentDownloader/Document",
    "bio-rad.com/sites/default/files/webroot/web/pdf",
];

/// Hosts whose scheme-less pieces in a hidden payload get `https://` restored
const KNOWN_HOST_FRAGMENTS: [&str; 2] = [".thewercs.com", ".bio-rad.com"];

/// Separator between URLs packed into a hidden widget value
const PAYLOAD_SEPARATOR: &str = "~https://";

static HIDDEN_INPUT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("input[type='hidden']").expect("valid hidden input selector")
});
static OPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("option").expect("valid option selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("valid anchor selector"));

/// Pulls document download URLs out of rendered listing markup.
///
/// The listing widgets trigger downloads from JavaScript, so most targets sit
/// in hidden input payloads rather than in anchors. Three sources are scanned
/// in order: hidden input values, `<option>` values, then anchor `href`s.
/// Results keep document order and are not deduplicated.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    allowed_patterns: Vec<String>,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self::new(ALLOWED_PATTERNS.iter().map(|p| p.to_string()).collect())
    }
}

impl LinkExtractor {
    pub fn new(allowed_patterns: Vec<String>) -> Self {
        Self { allowed_patterns }
    }

    /// Simple containment check, not a structural URL match
    pub fn is_allowed(&self, url: &str) -> bool {
        self.allowed_patterns.iter().any(|pattern| url.contains(pattern.as_str()))
    }

    /// Extract every allow-listed URL from the markup
    pub fn extract_links(&self, markup: &str) -> Vec<String> {
        let mut urls = Vec::new();

        if markup.trim().is_empty() {
            return urls;
        }

        let document = Html::parse_document(markup);

        for input in document.select(&HIDDEN_INPUT) {
            if let Some(value) = input.value().attr("value") {
                urls.extend(self.unpack_payload(value));
            }
        }
        let from_inputs = urls.len();

        for option in document.select(&OPTION) {
            if let Some(value) = option.value().attr("value") {
                if self.accepts_verbatim(value) {
                    urls.push(value.to_string());
                }
            }
        }
        let from_options = urls.len() - from_inputs;

        for anchor in document.select(&ANCHOR) {
            if let Some(href) = anchor.value().attr("href") {
                if self.accepts_verbatim(href) {
                    urls.push(href.to_string());
                }
            }
        }

        debug!(
            "Extracted {} URLs ({} hidden inputs, {} options, {} anchors)",
            urls.len(),
            from_inputs,
            from_options,
            urls.len() - from_inputs - from_options
        );

        urls
    }

    /// Split a hidden widget payload and rebuild each piece as a full URL
    fn unpack_payload<'a>(&'a self, value: &'a str) -> impl Iterator<Item = String> + 'a {
        value.split(PAYLOAD_SEPARATOR).filter_map(move |piece| {
            let full_url = if piece.starts_with("http") {
                piece.to_string()
            } else if KNOWN_HOST_FRAGMENTS.iter().any(|host| piece.contains(host)) {
                format!("https://{}", piece)
            } else {
                return None;
            };

            self.is_allowed(&full_url).then_some(full_url)
        })
    }

    fn accepts_verbatim(&self, value: &str) -> bool {
        value.starts_with("http") && self.is_allowed(value)
    }
}

/// Extract with the built-in allow-list
pub fn extract_links(markup: &str) -> Vec<String> {
    LinkExtractor::default().extract_links(markup)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SDS_URL: &str = "https://bio-rad-sds.thewercs.com/DirectDocumentDownloader/Document?prd=HRLS00001-3~~PDF~~MTR~~AGHS~~EN";
    const BULLETIN_URL: &str = "https://www.bio-rad.com/sites/default/files/webroot/web/pdf/lsr/literature/Bulletin_6040.pdf";

    #[test]
    fn test_hidden_input_payload() {
        let markup = r#"<html><body>
            <input type="hidden" value="foo~https://example.bio-rad.com/sites/default/files/webroot/web/pdf/X.pdf">
        </body></html>"#;

        assert_eq!(
            extract_links(markup),
            vec!["https://example.bio-rad.com/sites/default/files/webroot/web/pdf/X.pdf".to_string()]
        );
    }

    #[test]
    fn test_hidden_payload_with_multiple_targets() {
        let markup = format!(
            r#"<input type="hidden" name="docs" value="{}~https://www.bio-rad.com/en-us/contact~https://{}">"#,
            SDS_URL,
            BULLETIN_URL.trim_start_matches("https://"),
        );

        assert_eq!(extract_links(&markup), vec![SDS_URL.to_string(), BULLETIN_URL.to_string()]);
    }

    #[test]
    fn test_visible_inputs_are_ignored() {
        let markup = format!(r#"<input type="text" value="{}">"#, SDS_URL);
        assert!(extract_links(&markup).is_empty());
    }

    #[test]
    fn test_sources_scanned_in_order_without_dedup() {
        // Anchor appears first in the document but is scanned last
        let markup = format!(
            r#"<a href="{sds}">SDS</a>
               <select><option value="{bulletin}">EN</option></select>
               <input type="hidden" value="{sds}">"#,
            sds = SDS_URL,
            bulletin = BULLETIN_URL,
        );

        assert_eq!(
            extract_links(&markup),
            vec![SDS_URL.to_string(), BULLETIN_URL.to_string(), SDS_URL.to_string()]
        );
    }

    #[test]
    fn test_disallowed_urls_rejected_from_every_source() {
        let markup = format!(
            r#"<input type="hidden" value="x~https://evil.example.com/sites/default/files/a.pdf~https://cdn.bio-rad.com/images/logo.png~https://{bulletin_bare}">
               <select>
                 <option value="https://www.bio-rad.com/en-us/product/abc">Product</option>
                 <option value="{sds}">SDS</option>
                 <option value="/sites/default/files/webroot/web/pdf/relative.pdf">Relative</option>
               </select>
               <a href="https://example.org/DirectDocumentDownloader/Document?prd=A">Other</a>
               <a href="//bio-rad.com/sites/default/files/webroot/web/pdf/proto.pdf">Proto-relative</a>
               <a href="{bulletin}">Bulletin</a>
               <a>No href</a>"#,
            bulletin_bare = BULLETIN_URL.trim_start_matches("https://"),
            sds = SDS_URL,
            bulletin = BULLETIN_URL,
        );

        let urls = extract_links(&markup);
        assert_eq!(urls, vec![BULLETIN_URL.to_string(), SDS_URL.to_string(), BULLETIN_URL.to_string()]);

        let extractor = LinkExtractor::default();
        for url in &urls {
            assert!(url.starts_with("http"));
            assert!(extractor.is_allowed(url), "not allow-listed: {}", url);
        }
    }

    #[test]
    fn test_empty_or_garbage_markup() {
        assert!(extract_links("").is_empty());
        assert!(extract_links("   \n").is_empty());
        assert!(extract_links("<<<>>> not html at all <input value=").is_empty());
    }

    #[test]
    fn test_custom_allow_list() {
        let extractor = LinkExtractor::new(vec!["example.com/docs/".to_string()]);
        let markup = r#"<a href="https://example.com/docs/a.pdf">a</a><a href="https://example.com/b.pdf">b</a>"#;

        assert_eq!(extractor.extract_links(markup), vec!["https://example.com/docs/a.pdf".to_string()]);
    }
}
