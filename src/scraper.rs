//! Anchor extraction from fetched HTML.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// One `<a href>` element: the raw attribute and its visible text with
/// whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Anchor {
    pub href: String,
    pub text: String,
}

/// All anchors with an `href`, in document order.
pub(crate) fn extract_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim().to_string();
            let text: String = element
                .text()
                .flat_map(|fragment| fragment.chars())
                .filter(|c| !c.is_whitespace())
                .collect();
            Some(Anchor { href, text })
        })
        .collect()
}
