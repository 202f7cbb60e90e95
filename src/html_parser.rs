use select::document::Document;
use select::node::Node;
use select::predicate::Any;
use tracing::debug;
use url::Url;

use crate::error::{MirrorError, Result};

/// Anchor targets ending in one of these are downloaded as assets.
pub const DOCUMENT_EXTENSIONS: [&str; 4] = [".txt", ".pdf", ".docx", ".exe"];

/// One fetched page: its URL, the body as received, and the parsed tag tree.
///
/// Parsing never fails; html5ever repairs unclosed tags and anything it
/// cannot make sense of simply yields no elements.
pub struct PageDocument {
    url: Url,
    html: String,
    document: Document,
}

impl PageDocument {
    pub fn parse(url: Url, html: impl Into<String>) -> Self {
        let html = html.into();
        let document = Document::from(html.as_str());
        Self {
            url,
            html,
            document,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    /// Every element of the tree in document order. Text and comment nodes are skipped.
    pub fn elements(&self) -> impl Iterator<Item = Element<'_>> {
        self.document.find(Any).filter_map(Element::from_node)
    }
}

/// Parent of a `<source>` element, which decides whether it is a media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaParent {
    Audio,
    Video,
    Other,
}

/// The element kinds the mirror cares about, each with the attributes it may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element<'a> {
    Image { src: Option<&'a str> },
    Link { rel: Option<&'a str>, href: Option<&'a str> },
    Audio { src: Option<&'a str> },
    Video { src: Option<&'a str> },
    Source { parent: MediaParent, src: Option<&'a str> },
    Anchor { href: Option<&'a str> },
    Other,
}

impl<'a> Element<'a> {
    fn from_node(node: Node<'a>) -> Option<Self> {
        let element = match node.name()? {
            "img" => Element::Image {
                src: node.attr("src"),
            },
            "link" => Element::Link {
                rel: node.attr("rel"),
                href: node.attr("href"),
            },
            "audio" => Element::Audio {
                src: node.attr("src"),
            },
            "video" => Element::Video {
                src: node.attr("src"),
            },
            "source" => Element::Source {
                parent: match node.parent().and_then(|parent| parent.name()) {
                    Some("audio") => MediaParent::Audio,
                    Some("video") => MediaParent::Video,
                    _ => MediaParent::Other,
                },
                src: node.attr("src"),
            },
            "a" => Element::Anchor {
                href: node.attr("href"),
            },
            _ => Element::Other,
        };
        Some(element)
    }

    /// The raw asset reference this element contributes, if any.
    pub fn asset_link(&self) -> Option<&'a str> {
        match *self {
            Element::Image { src }
            | Element::Audio { src }
            | Element::Video { src } => src,
            Element::Link {
                rel: Some(rel),
                href,
            } if is_stylesheet(rel) => href,
            Element::Link { .. } => None,
            Element::Source {
                parent: MediaParent::Audio | MediaParent::Video,
                src,
            } => src,
            Element::Source {
                parent: MediaParent::Other,
                ..
            } => None,
            Element::Anchor { href: Some(href) } if is_document_link(href) => Some(href),
            Element::Anchor { .. } | Element::Other => None,
        }
    }

    /// The anchor target if it looks like a same-site link.
    pub fn internal_href(&self) -> Option<&'a str> {
        match *self {
            Element::Anchor { href: Some(href) } if is_internal_href(href) => Some(href),
            _ => None,
        }
    }
}

fn is_stylesheet(rel: &str) -> bool {
    rel.split_ascii_whitespace()
        .any(|token| token.eq_ignore_ascii_case("stylesheet"))
}

fn is_document_link(href: &str) -> bool {
    DOCUMENT_EXTENSIONS.iter().any(|ext| href.ends_with(ext))
}

/// Same-site heuristic: anything without `http` in it is treated as a relative link.
pub fn is_internal_href(href: &str) -> bool {
    !href.contains("http")
}

#[derive(Debug, Clone)]
pub struct HtmlParser {
    base_url: Url,
}

impl HtmlParser {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| MirrorError::invalid_url(base_url, e))?;
        Ok(Self { base_url })
    }

    pub fn for_url(base_url: Url) -> Self {
        Self { base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Asset references in document order, duplicates kept.
    pub fn extract_assets(&self, document: &PageDocument) -> Vec<String> {
        document
            .elements()
            .filter_map(|element| element.asset_link())
            .map(str::to_string)
            .collect()
    }

    /// Internal anchor targets in document order, resolved against the base URL.
    pub fn internal_links(&self, document: &PageDocument) -> Vec<Url> {
        document
            .elements()
            .filter_map(|element| element.internal_href())
            .filter_map(|href| match self.resolve_url(href) {
                Ok(url) => Some(url),
                Err(e) => {
                    debug!(href, error = %e, "skipping unresolvable link");
                    None
                }
            })
            .collect()
    }

    /// Joins `link` onto the base URL; links that already carry a scheme are kept as they are.
    pub fn resolve_url(&self, link: &str) -> Result<Url> {
        self.base_url
            .join(link.trim())
            .map_err(|e| MirrorError::invalid_url(link, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> PageDocument {
        PageDocument::parse(Url::parse("https://example.test/").unwrap(), html)
    }

    #[test]
    fn test_extract_assets_in_document_order() {
        let doc = page(
            r#"
            <html>
                <head>
                    <link rel="stylesheet" href="/style.css">
                    <link rel="icon" href="/favicon.ico">
                </head>
                <body>
                    <img src="logo.png">
                    <audio src="intro.mp3"></audio>
                    <video><source src="clip.mp4"></video>
                    <picture><source src="ignored.webp"></picture>
                    <a href="manual.pdf">Manual</a>
                    <a href="/about">About</a>
                    <a href="notes.txt">Notes</a>
                </body>
            </html>
        "#,
        );
        let parser = HtmlParser::new("https://example.test/").unwrap();
        assert_eq!(
            parser.extract_assets(&doc),
            vec![
                "/style.css",
                "logo.png",
                "intro.mp3",
                "clip.mp4",
                "manual.pdf",
                "notes.txt"
            ]
        );
    }

    #[test]
    fn test_extract_assets_skips_missing_attributes() {
        let doc = page(r#"<img alt="no source"><link rel="stylesheet"><video></video><a>bare</a>"#);
        let parser = HtmlParser::new("https://example.test/").unwrap();
        assert!(parser.extract_assets(&doc).is_empty());
    }

    #[test]
    fn test_extract_assets_keeps_duplicates() {
        let doc = page(r#"<img src="a.png"><img src="a.png">"#);
        let parser = HtmlParser::new("https://example.test/").unwrap();
        assert_eq!(parser.extract_assets(&doc), vec!["a.png", "a.png"]);
    }

    #[test]
    fn test_stylesheet_rel_is_a_token_list() {
        let doc = page(r#"<link rel="alternate Stylesheet" href="alt.css"><link rel="stylesheets" href="no.css">"#);
        let parser = HtmlParser::new("https://example.test/").unwrap();
        assert_eq!(parser.extract_assets(&doc), vec!["alt.css"]);
    }

    #[test]
    fn test_source_parent_classification() {
        let doc = page(r#"<audio><source src="a.ogg"></audio><video><source src="v.webm"></video>"#);
        let kinds: Vec<_> = doc
            .elements()
            .filter_map(|element| match element {
                Element::Source { parent, src } => Some((parent, src)),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (MediaParent::Audio, Some("a.ogg")),
                (MediaParent::Video, Some("v.webm"))
            ]
        );
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let doc = page(r#"<div><img src="x.png"<p>unclosed <a href="/next">next"#);
        let parser = HtmlParser::new("https://example.test/").unwrap();
        // html5ever recovers whatever it can; nothing panics or errors
        let _ = parser.extract_assets(&doc);
        let _ = parser.internal_links(&doc);
    }

    #[test]
    fn test_internal_links_resolved_against_base() {
        let doc = PageDocument::parse(
            Url::parse("https://example.test/docs/").unwrap(),
            r#"
            <a href="/about">About</a>
            <a href="intro">Intro</a>
            <a href="https://other.test/">Elsewhere</a>
            <a href="http://example.test/absolute">Absolute</a>
            <a name="anchor-without-href"></a>
        "#,
        );
        let parser = HtmlParser::new("https://example.test/docs/").unwrap();
        let links: Vec<String> = parser
            .internal_links(&doc)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://example.test/about",
                "https://example.test/docs/intro"
            ]
        );
    }

    #[test]
    fn test_internal_heuristic_is_substring_based() {
        assert!(is_internal_href("/about"));
        assert!(is_internal_href("mailto:someone@example.test"));
        assert!(!is_internal_href("/redirect?to=https-page"));
        assert!(!is_internal_href("https://example.test/"));
    }

    #[test]
    fn test_url_resolution() {
        let parser = HtmlParser::new("https://example.com/subdir/").unwrap();

        let test_cases = vec![
            ("../style.css", "https://example.com/style.css"),
            ("./script.js", "https://example.com/subdir/script.js"),
            ("images/photo.jpg", "https://example.com/subdir/images/photo.jpg"),
            ("https://cdn.example.com/style.css", "https://cdn.example.com/style.css"),
            ("//cdn.example.com/script.js", "https://cdn.example.com/script.js"),
        ];

        for (input, expected) in test_cases {
            let result = parser.resolve_url(input).unwrap();
            assert_eq!(result.as_str(), expected, "Failed for input: {}", input);
        }
    }

    #[test]
    fn test_invalid_base_url() {
        let error = HtmlParser::new("not a url").unwrap_err();
        assert!(matches!(error, MirrorError::InvalidUrl { .. }));
    }
}
