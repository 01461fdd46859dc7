//! HTML parser for extracting links
//!
//! Link extraction can be scoped to a single container element identified
//! by its `id` attribute. When the container is missing the scope is empty.

use crate::url::resolve_link;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A hyperlink found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// The href as written in the document
    pub href: String,

    /// The href resolved against the document URL
    pub resolved: String,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Links inside the scope, in document order
    pub links: Vec<ExtractedLink>,

    /// False if a container id was requested but no such element exists
    pub container_found: bool,
}

/// Parses HTML content and extracts the `<a href>` targets
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The base URL for resolving relative links
/// * `container_id` - Restricts extraction to the element with this id
///
/// # Example
///
/// ```
/// use mirror_crawl::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<div id="files"><a href="a.txt">A</a></div><a href="b.txt">B</a>"#;
/// let base_url = Url::parse("https://example.test/").unwrap();
/// let parsed = parse_html(html, &base_url, Some("files"));
/// assert_eq!(parsed.links.len(), 1);
/// assert_eq!(parsed.links[0].resolved, "https://example.test/a.txt");
/// ```
pub fn parse_html(html: &str, base_url: &Url, container_id: Option<&str>) -> ParsedPage {
    let document = Html::parse_document(html);

    match container_id {
        Some(id) => match find_by_id(&document, id) {
            Some(container) => ParsedPage {
                links: extract_links(container, base_url),
                container_found: true,
            },
            None => ParsedPage {
                links: Vec::new(),
                container_found: false,
            },
        },
        None => ParsedPage {
            links: extract_links(document.root_element(), base_url),
            container_found: true,
        },
    }
}

/// Finds the first element whose `id` attribute equals `id`
fn find_by_id<'a>(document: &'a Html, id: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse("[id]").ok()?;
    document
        .select(&selector)
        .find(|element| element.value().id() == Some(id))
}

/// Extracts every resolvable link below `scope`
fn extract_links(scope: ElementRef<'_>, base_url: &Url) -> Vec<ExtractedLink> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in scope.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(resolved) = resolve_link(href, base_url) {
                    links.push(ExtractedLink {
                        href: href.trim().to_string(),
                        resolved,
                    });
                }
            }
        }
    }

    links
}
