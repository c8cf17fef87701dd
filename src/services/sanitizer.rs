//! HTML sanitizer
//!
//! Generated and user-supplied page markup goes through a fixed allow-list
//! before it is stored or returned. Disallowed tags are dropped (their text is
//! kept, except for `script` and `style` whose content is removed too),
//! disallowed attributes are removed, and URLs must use `http`, `https` or,
//! for links only, `mailto`.

use ammonia::{Builder, UrlRelative};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

static SANITIZER: Lazy<Builder<'static>> = Lazy::new(build_sanitizer);

const ALLOWED_TAGS: &[&str] = &[
    "a",
    "abbr",
    "article",
    "aside",
    "b",
    "blockquote",
    "br",
    "button",
    "caption",
    "code",
    "div",
    "em",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "i",
    "img",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "small",
    "span",
    "strong",
    "sub",
    "sup",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "u",
    "ul",
];

const GENERIC_ATTRIBUTES: &[&str] = &["class", "id", "title", "role", "aria-label", "aria-hidden"];

fn build_sanitizer() -> Builder<'static> {
    let mut builder = Builder::default();

    builder.tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>());
    builder.generic_attributes(GENERIC_ATTRIBUTES.iter().copied().collect::<HashSet<_>>());

    let tag_attributes: HashMap<&'static str, HashSet<&'static str>> = HashMap::from([
        ("a", HashSet::from(["href", "target"])),
        ("img", HashSet::from(["src", "alt", "width", "height", "loading"])),
        ("td", HashSet::from(["colspan", "rowspan"])),
        ("th", HashSet::from(["colspan", "rowspan", "scope"])),
        ("button", HashSet::from(["type"])),
    ]);
    builder.tag_attributes(tag_attributes);

    builder.url_schemes(HashSet::from(["http", "https", "mailto"]));
    builder.url_relative(UrlRelative::Deny);
    builder.clean_content_tags(HashSet::from(["script", "style"]));

    // mailto is only meaningful on links
    builder.attribute_filter(|element, attribute, value| {
        if element == "img" && attribute == "src" && !is_http_url(value) {
            None
        } else {
            Some(Cow::Borrowed(value))
        }
    });

    builder
}

fn is_http_url(value: &str) -> bool {
    let lower = value.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Restrict `html` to the allow-list
pub fn sanitize_html(html: &str) -> String {
    SANITIZER.clean(html).to_string()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn sanitized_output_has_no_script(prefix in ".{0,40}", body in ".{0,40}") {
            let input = format!("{}<script>{}</script>", prefix, body);
            let out = sanitize_html(&input).to_lowercase();
            prop_assert!(!out.contains("<script"));
        }

        #[test]
        fn event_handlers_never_survive(handler in "on[a-z]{3,10}") {
            let input = format!(r#"<div {}="alert(1)">x</div>"#, handler);
            let out = sanitize_html(&input);
            prop_assert!(!out.contains(&handler));
        }
    }
}
