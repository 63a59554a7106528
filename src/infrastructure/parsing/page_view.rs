//! Read-only view over rendered page elements
//!
//! The extractor only ever asks four questions of an element: find one
//! descendant, find all descendants, read text, read an attribute. `PageView`
//! captures exactly that so extraction runs on a parsed snapshot of the page
//! rather than on live browser handles.

use scraper::{ElementRef, Html, Selector};

/// Element query surface used by the order extractor
pub trait PageView: Sized {
    /// First descendant matching `selector`
    fn find_one(&self, selector: &Selector) -> Option<Self>;

    /// All descendants matching `selector`, in document order
    fn find_all(&self, selector: &Selector) -> Vec<Self>;

    /// Text nodes joined by a single space, otherwise uncleaned. Adjacent
    /// elements never run together into one token.
    fn text(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;
}

/// Parsed snapshot of a whole page
pub struct HtmlDocumentView {
    html: Html,
}

impl HtmlDocumentView {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    pub fn root(&self) -> HtmlElementView<'_> {
        HtmlElementView(self.html.root_element())
    }
}

/// A single element inside an [`HtmlDocumentView`]
#[derive(Clone, Copy)]
pub struct HtmlElementView<'a>(ElementRef<'a>);

impl<'a> PageView for HtmlElementView<'a> {
    fn find_one(&self, selector: &Selector) -> Option<Self> {
        self.0.select(selector).next().map(HtmlElementView)
    }

    fn find_all(&self, selector: &Selector) -> Vec<Self> {
        self.0.select(selector).map(HtmlElementView).collect()
    }

    fn text(&self) -> String {
        self.0.text().collect::<Vec<_>>().join(" ")
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.value().attr(name).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_queries_descendants() {
        let doc = HtmlDocumentView::parse(
            r#"<div class="card"><a href="/x">First</a><a href="/y">Second</a></div>"#,
        );
        let link = Selector::parse("a").unwrap();
        let root = doc.root();

        let all = root.find_all(&link);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].text(), "Second");
        assert_eq!(root.find_one(&link).and_then(|a| a.attribute("href")).as_deref(), Some("/x"));
        assert!(root.find_one(&Selector::parse("span").unwrap()).is_none());
    }

    #[test]
    fn text_separates_adjacent_elements() {
        let doc = HtmlDocumentView::parse("<div><p>May 3</p><p>1, 2023</p></div>");
        let div = doc.root().find_one(&Selector::parse("div").unwrap()).unwrap();
        assert_eq!(div.text(), "May 3 1, 2023");
    }
}
