// src/common/html.rs
//! Thin helpers over `scraper` shared by the page specs.
//!
//! Text extraction mirrors what a human reads off the page: text nodes are
//! joined with a single space and whitespace is collapsed, so `<td>ФН:</td>
//! <td>123</td>` and `<td>ФН: 123</td>` read the same.

use scraper::{ElementRef, Selector};

use super::sanitize::normalize_ws;

/// Compile a selector known at build time.
pub fn css(selector: &'static str) -> Selector {
    Selector::parse(selector).expect("static CSS selector")
}

/// Visible text of an element, whitespace-normalized.
pub fn text_of(el: ElementRef<'_>) -> String {
    let joined = el
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    normalize_ws(&joined)
}

/// Text nodes concatenated as they stand, then whitespace-normalized.
/// For value cells, where inline markup can split a number (`12<b>.50</b>`).
pub fn packed_text_of(el: ElementRef<'_>) -> String {
    normalize_ws(&el.text().collect::<String>())
}

/// Every match of `sel` under `el`, in document order.
pub fn select_all<'a>(el: ElementRef<'a>, sel: &Selector) -> Vec<ElementRef<'a>> {
    el.select(sel).collect()
}

/// First class token of an element, if it carries a non-empty class attribute.
pub fn first_class<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    el.value().classes().next()
}

/// True when the element has no class marker at all.
pub fn is_unmarked(el: ElementRef<'_>) -> bool {
    first_class(el).is_none()
}
