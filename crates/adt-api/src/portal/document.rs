// Document queries
//
// Thin helpers over `scraper` shared by the login and dashboard parsers.
// `Html` is not `Send`, so documents are parsed and dropped synchronously,
// never held across an await.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

static CSRF_INPUT: LazyLock<Selector> = LazyLock::new(|| selector(r#"input[name="_csrf"]"#));

/// Compile a built-in CSS selector.
///
/// Only called with string literals from this crate; every one of them is
/// compiled by the unit tests, so the `expect` cannot fire at runtime.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("built-in selector must parse")
}

/// The value of the page's `_csrf` hidden input, if any.
pub(crate) fn csrf_token(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    first_attr(&doc, &CSRF_INPUT, "value")
}

/// The first non-empty value of `attr` among elements matching `sel`.
pub(crate) fn first_attr(doc: &Html, sel: &Selector, attr: &str) -> Option<String> {
    doc.select(sel)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(String::from)
}

/// Whether any element matching `sel` carries `class`.
pub(crate) fn any_has_class(doc: &Html, sel: &Selector, class: &str) -> bool {
    doc.select(sel).any(|el| has_class(el, class))
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Title of the nearest ancestor that has one.
pub(crate) fn enclosing_title(el: ElementRef<'_>) -> Option<String> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .filter_map(|ancestor| ancestor.value().attr("title"))
        .map(str::trim)
        .find(|title| !title.is_empty())
        .map(String::from)
}
