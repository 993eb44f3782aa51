//! Read-only document tree access for detectors.
//!
//! [`PageTree`] owns a parsed `scraper::Html`. Everything else here is a free
//! function over `ElementRef` so detectors can mix CSS selection with the few
//! structural checks CSS cannot express (own-string text, bounded parent
//! walks, following siblings).

use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};

/// Compile a CSS selector once and reuse it.
///
/// The selector text is a literal; a parse failure is a programming error.
#[macro_export]
macro_rules! static_selector {
    ($css:expr) => {{
        static SELECTOR: ::std::sync::OnceLock<::scraper::Selector> = ::std::sync::OnceLock::new();
        SELECTOR.get_or_init(|| ::scraper::Selector::parse($css).expect("static selector"))
    }};
}

/// Compile a regular expression once and reuse it.
#[macro_export]
macro_rules! static_regex {
    ($pattern:expr) => {{
        static REGEX: ::std::sync::OnceLock<::regex_lite::Regex> = ::std::sync::OnceLock::new();
        REGEX.get_or_init(|| ::regex_lite::Regex::new($pattern).expect("static regex"))
    }};
}

/// A parsed page.
pub struct PageTree {
    html: Html,
}

impl PageTree {
    /// Parse a full HTML document.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Underlying document.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// The `<html>` element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// First element carrying `id`, in document order.
    pub fn element_by_id(&self, id: &str) -> Option<ElementRef<'_>> {
        self.root()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().id() == Some(id))
    }
}

/// Concatenated text of every descendant text node, whitespace preserved.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Single string content of an element.
///
/// Follows single-child chains: `<div><span>x</span></div>` has own string
/// `x`, `<div>x<b>y</b></div>` has none.
pub fn own_string(element: ElementRef<'_>) -> Option<String> {
    let mut node = *element;
    loop {
        let mut children = node.children();
        let only = children.next()?;
        if children.next().is_some() {
            return None;
        }
        if let Some(text) = only.value().as_text() {
            return Some(String::from(&**text));
        }
        if !only.value().is_element() {
            return None;
        }
        node = only;
    }
}

/// Whether the element has a non-empty own string.
pub fn has_own_text(element: ElementRef<'_>) -> bool {
    own_string(element).is_some_and(|s| !s.is_empty())
}

/// Attribute value.
pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name)
}

/// Whether the attribute is present.
pub fn has_attr(element: ElementRef<'_>, name: &str) -> bool {
    element.value().attr(name).is_some()
}

/// Whether any of the attributes is present.
pub fn has_any_attr(element: ElementRef<'_>, names: &[&str]) -> bool {
    names.iter().any(|n| has_attr(element, n))
}

/// Whether the element carries `class` as one of its classes.
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Tag name.
pub fn tag(element: ElementRef<'_>) -> &str {
    element.value().name()
}

/// Attributes ordered by name.
pub fn attributes(element: ElementRef<'_>) -> BTreeMap<String, String> {
    element
        .value()
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Parent element, if the parent is an element.
pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Element `hops` levels up, if every level is an element.
pub fn nth_ancestor(element: ElementRef<'_>, hops: usize) -> Option<ElementRef<'_>> {
    let mut current = element;
    for _ in 0..hops {
        current = parent_element(current)?;
    }
    Some(current)
}

/// Walk toward the root for at most `max_hops` levels.
///
/// The walk never reaches `boundary` or anything above it and stops after the
/// first hop whose element satisfies `stop`. Returns the broadest element
/// reached, which is `element` itself when no hop was possible.
pub fn broaden_to<'a, F>(
    element: ElementRef<'a>,
    max_hops: usize,
    boundary: ElementRef<'a>,
    stop: F,
) -> ElementRef<'a>
where
    F: Fn(ElementRef<'a>) -> bool,
{
    let mut current = element;
    for _ in 0..max_hops {
        let Some(parent) = parent_element(current) else {
            break;
        };
        if parent.id() == boundary.id() {
            break;
        }
        current = parent;
        if stop(current) {
            break;
        }
    }
    current
}

/// Descendants of `scope` matching `selector`, in document order.
///
/// `scope` itself is never yielded.
pub fn descendants<'a, 'b>(
    scope: ElementRef<'a>,
    selector: &'b Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    let scope_id = scope.id();
    scope.select(selector).filter(move |el| el.id() != scope_id)
}

/// First following sibling element with the given tag.
pub fn next_sibling_element<'a>(element: ElementRef<'a>, tag_name: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|s| s.value().name() == tag_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> PageTree {
        PageTree::parse(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn test_element_by_id() {
        let tree = page("<div id='cnt'><p id='x'>hi</p></div>");
        assert_eq!(tag(tree.element_by_id("x").unwrap()), "p");
        assert!(tree.element_by_id("missing").is_none());
    }

    #[test]
    fn test_own_string_follows_single_child_chain() {
        let tree = page("<div id='a'><span><b>deep</b></span></div><div id='b'>x<b>y</b></div>");
        assert_eq!(own_string(tree.element_by_id("a").unwrap()).as_deref(), Some("deep"));
        assert!(own_string(tree.element_by_id("b").unwrap()).is_none());
        assert_eq!(text_of(tree.element_by_id("b").unwrap()), "xy");
    }

    #[test]
    fn test_broaden_stops_below_boundary() {
        let tree = page("<div id='root'><div id='l1'><div id='l2'><span id='s'>x</span></div></div></div>");
        let root = tree.element_by_id("root").unwrap();
        let span = tree.element_by_id("s").unwrap();

        let broad = broaden_to(span, 6, root, |_| false);
        assert_eq!(attr(broad, "id"), Some("l1"));

        let one = broaden_to(span, 1, root, |_| false);
        assert_eq!(attr(one, "id"), Some("l2"));

        let stopped = broaden_to(span, 6, root, |el| attr(el, "id") == Some("l2"));
        assert_eq!(attr(stopped, "id"), Some("l2"));
    }

    #[test]
    fn test_descendants_exclude_scope() {
        let tree = page("<div id='outer' class='k'><div class='k'></div></div>");
        let outer = tree.element_by_id("outer").unwrap();
        let sel = Selector::parse("div.k").unwrap();
        assert_eq!(descendants(outer, &sel).count(), 1);
    }

    #[test]
    fn test_next_sibling_skips_other_tags() {
        let tree = page("<div><a id='a'>x</a><span></span><div id='t'></div></div>");
        let a = tree.element_by_id("a").unwrap();
        assert_eq!(attr(next_sibling_element(a, "div").unwrap(), "id"), Some("t"));
        assert!(next_sibling_element(a, "table").is_none());
    }

    #[test]
    fn test_static_selector_macro() {
        let tree = page("<a href='/x'>x</a><a>y</a>");
        assert_eq!(tree.root().select(static_selector!("a[href]")).count(), 1);
        assert!(static_regex!("^Rated").is_match("Rated 4.5 out of 5"));
    }
}
