//! HTML sanitizer built on lol_html

use lol_html::html_content::Element;
use lol_html::{comments, element, rewrite_str, RewriteStrSettings};

use super::markdown::{RenderError, Sanitizer};

/// Elements removed together with their content
const BLOCKED_ELEMENTS: &[&str] = &[
    "script", "style", "iframe", "frame", "frameset", "object", "embed", "applet", "form",
    "input", "button", "textarea", "select", "link", "meta", "base", "noscript", "template",
    "svg", "math",
];

/// Attributes holding URLs whose scheme is checked
const URL_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "action",
    "formaction",
    "xlink:href",
    "poster",
    "background",
    "cite",
];

/// Schemes a URL attribute may carry. Relative URLs have no scheme.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Sanitizer for rendered post bodies.
///
/// Removes blocked elements with their content, event handler attributes
/// (`on*`) and comments. URL attributes are kept only when they are relative
/// or use an allowed scheme; `data:image/` is also accepted on `src`.
#[derive(Debug, Clone, Default)]
pub struct HtmlSanitizer;

impl HtmlSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, html: &str) -> Result<String, RenderError> {
        let mut element_content_handlers = Vec::with_capacity(BLOCKED_ELEMENTS.len() + 2);

        for name in BLOCKED_ELEMENTS {
            element_content_handlers.push(element!(*name, |el| {
                el.remove();
                Ok(())
            }));
        }
        element_content_handlers.push(element!("*", |el| {
            strip_unsafe_attributes(el);
            Ok(())
        }));
        element_content_handlers.push(comments!("*", |c| {
            c.remove();
            Ok(())
        }));

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers,
                ..RewriteStrSettings::new()
            },
        )
        .map_err(|e| RenderError::Sanitize(e.to_string()))
    }
}

fn strip_unsafe_attributes(el: &mut Element<'_, '_>) {
    let doomed: Vec<String> = el
        .attributes()
        .iter()
        .map(|attr| (attr.name(), attr.value()))
        .filter(|(name, value)| is_unsafe_attribute(name, value))
        .map(|(name, _)| name)
        .collect();

    for name in doomed {
        el.remove_attribute(&name);
    }
}

fn is_unsafe_attribute(name: &str, value: &str) -> bool {
    let name = name.to_ascii_lowercase();
    if name.starts_with("on") || name == "srcdoc" {
        return true;
    }
    if !URL_ATTRIBUTES.contains(&name.as_str()) {
        return false;
    }

    // Browsers decode character references and ignore whitespace and
    // control characters inside the scheme
    let decoded = html_escape::decode_html_entities(value);
    let url: String = decoded
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let end = url.find(&[':', '/', '?', '#'][..]).unwrap_or(url.len());
    let (scheme, rest) = url.split_at(end);

    // A reference the decoder left alone could still spell out a scheme
    if scheme.contains('&') {
        return true;
    }
    if !rest.starts_with(':') {
        return false;
    }
    if scheme == "data" {
        return !(name == "src" && url.starts_with("data:image/"));
    }
    !ALLOWED_SCHEMES.contains(&scheme)
}
