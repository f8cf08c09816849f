use log2::debug;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Elements and attributes that carry link targets
const LINK_SELECTOR: &str =
    "a[href], area[href], link[href], iframe[src], frame[src]";
/// Elements whose text never shows on the page
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Why a page yielded nothing
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("page body is empty")]
    EmptyBody,
    #[error("page body is not valid UTF-8")]
    NotUtf8,
    #[error("invalid selector: {0}")]
    Selector(String),
}

/// Everything the crawler keeps from one parsed page
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PageContent {
    /// Absolute, fragment-free link targets in document order
    pub links: Vec<Url>,
    /// Visible text of the whole document, used for fingerprinting
    pub text: String,
    /// Tokens taken from paragraph text
    pub words: Vec<String>,
}

/// If `path` is a full URL, returns it as-is. Otherwise constructs a full URL by
/// merging with `base_url`. The fragment is always stripped.
pub fn construct_url(path: &str, base_url: &Url) -> Result<Url, url::ParseError> {
    let mut url = match Url::parse(path) {
        Ok(parsed_url) if parsed_url.has_host() => parsed_url,
        Ok(parsed_url) if parsed_url.cannot_be_a_base() => parsed_url,
        _ => base_url.join(path)?,
    };
    url.set_fragment(None);
    Ok(url)
}

/// True when the path of a resolved link contains another absolute URL,
/// e.g. `https://host/a/https://host/b`
pub fn embeds_absolute_url(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    path.contains("http:/") || path.contains("https:/")
}

/// Parse a fetched page into links, visible text and paragraph words.
/// `base_url` is the effective URL of the fetch, after redirects.
pub fn extract_page(body: &[u8], base_url: &Url) -> Result<PageContent, ExtractError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ExtractError::EmptyBody);
    }
    let html = std::str::from_utf8(body).map_err(|_| ExtractError::NotUtf8)?;
    let document = Html::parse_document(html);

    let links = extract_links(&document, base_url)?;
    let text = visible_text(&document);
    let words = paragraph_words(&document)?;

    debug!("Found {} links and {} words on page {}", links.len(), words.len(), base_url);

    Ok(PageContent { links, text, words })
}

fn extract_links(document: &Html, base_url: &Url) -> Result<Vec<Url>, ExtractError> {
    let selector =
        Selector::parse(LINK_SELECTOR).map_err(|e| ExtractError::Selector(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&selector) {
        let target = element
            .value()
            .attr("href")
            .or_else(|| element.value().attr("src"))
            .map(str::trim);
        let Some(target) = target else { continue };
        if target.is_empty() || target == "#" || target == "/" {
            continue;
        }
        match construct_url(target, base_url) {
            Ok(url) if embeds_absolute_url(&url) => {
                debug!("Skipped link embedding another URL: {}", url);
            }
            Ok(url) => {
                if seen.insert(url.clone()) {
                    links.push(url);
                }
            }
            Err(e) => debug!("Skipped unparsable link {:?}: {}", target, e),
        }
    }
    Ok(links)
}

/// All text nodes outside of script-like elements, whitespace collapsed
fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else { continue };
        let hidden = node.ancestors().any(|ancestor| {
            ElementRef::wrap(ancestor)
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.value().name()))
        });
        if !hidden {
            parts.extend(text.split_whitespace());
        }
    }
    parts.join(" ")
}

fn paragraph_words(document: &Html) -> Result<Vec<String>, ExtractError> {
    let selector = Selector::parse("p").map_err(|e| ExtractError::Selector(e.to_string()))?;
    let mut words = Vec::new();
    for paragraph in document.select(&selector) {
        let text: String = paragraph.text().collect::<Vec<_>>().join(" ");
        words.extend(tokenize(&text));
    }
    Ok(words)
}

/// Split on non-alphanumeric characters, lowercase, and drop single-character
/// and purely numeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1)
        .filter(|token| !token.chars().all(|c| c.is_numeric()))
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.ics.uci.edu/about/").unwrap()
    }

    #[test]
    fn test_get_url() -> Result<(), Box<dyn std::error::Error>> {
        let another_full_url = Url::parse("https://www.cs.uci.edu/research")?;
        let result_url = construct_url(another_full_url.as_str(), &base())?;
        assert_eq!(result_url, another_full_url);
        Ok(())
    }

    #[test]
    fn test_get_url_with_relative_path() -> Result<(), Box<dyn std::error::Error>> {
        let result_url = construct_url("people/faculty.php", &base())?;
        let expected_url = Url::parse("https://www.ics.uci.edu/about/people/faculty.php")?;
        assert_eq!(result_url, expected_url);

        let result_url = construct_url("../news", &base())?;
        assert_eq!(result_url, Url::parse("https://www.ics.uci.edu/news")?);
        Ok(())
    }

    #[test]
    fn test_url_with_query() -> Result<(), Box<dyn std::error::Error>> {
        let result_url = construct_url("/events?page=2", &base())?;
        let expected_url = Url::parse("https://www.ics.uci.edu/events?page=2")?;
        assert_eq!(result_url, expected_url);
        Ok(())
    }

    ///Checks if sections are removed
    #[test]
    fn test_hash_fragment() -> Result<(), Box<dyn std::error::Error>> {
        let result_url = construct_url("/some/relative/path#section", &base())?;
        let expected_url = Url::parse("https://www.ics.uci.edu/some/relative/path")?;
        assert_eq!(result_url, expected_url);
        Ok(())
    }

    #[test]
    fn tokenizer_drops_short_and_numeric_tokens() {
        assert_eq!(tokenize("Hello, World! 123 a ab."), vec!["hello", "world", "ab"]);
        assert!(tokenize("  -- 7 42 x ").is_empty());
        assert_eq!(tokenize("CS121 web-crawler"), vec!["cs121", "web", "crawler"]);
    }

    #[test]
    fn extracts_absolute_fragment_free_links() -> Result<(), Box<dyn std::error::Error>> {
        let html = r##"
            <html><body>
                <a href="/page1">One</a>
                <a href="https://www.ics.uci.edu/page1#top">One again</a>
                <a href="people">People</a>
                <a href="#">Nowhere</a>
                <a>No target</a>
            </body></html>
        "##;
        let page = extract_page(html.as_bytes(), &base())?;
        assert_eq!(
            page.links,
            vec![
                Url::parse("https://www.ics.uci.edu/page1")?,
                Url::parse("https://www.ics.uci.edu/about/people")?,
            ]
        );
        Ok(())
    }

    #[test]
    fn skips_links_embedding_urls() -> Result<(), Box<dyn std::error::Error>> {
        let html = r#"<a href="https://www.ics.uci.edu/goto/https://www.cs.uci.edu/x">trap</a>
                      <a href="/ok">ok</a>"#;
        let page = extract_page(html.as_bytes(), &base())?;
        assert_eq!(page.links, vec![Url::parse("https://www.ics.uci.edu/ok")?]);
        Ok(())
    }

    #[test]
    fn collects_paragraph_words_and_visible_text() -> Result<(), Box<dyn std::error::Error>> {
        let html = r#"
            <html><head><title>Home</title><script>var hidden = 1;</script></head>
            <body><h1>Welcome</h1><p>Machine learning at UCI.</p><p>Since 1968!</p></body></html>
        "#;
        let page = extract_page(html.as_bytes(), &base())?;
        assert_eq!(page.words, vec!["machine", "learning", "at", "uci", "since"]);
        assert!(page.text.contains("Welcome"));
        assert!(page.text.contains("Machine learning at UCI."));
        assert!(!page.text.contains("hidden"));
        Ok(())
    }

    #[test]
    fn empty_body_is_an_error() {
        assert!(matches!(extract_page(b"", &base()), Err(ExtractError::EmptyBody)));
        assert!(matches!(extract_page(b" \n ", &base()), Err(ExtractError::EmptyBody)));
    }

    #[test]
    fn binary_body_is_an_error() {
        let body = [0xff, 0xfe, 0x00, 0x81];
        assert!(matches!(extract_page(&body, &base()), Err(ExtractError::NotUtf8)));
    }
}
