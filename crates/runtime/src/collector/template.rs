//! Placeholder substitution for source templates.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::api::CollectError;
use crate::collector::CollectRequest;

/// Everything but RFC 3986 unreserved characters.
const URL_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Substitutes `{AccountId}`, `{Platform}` and every account variable.
///
/// Account variables take precedence over the built-in names. A placeholder
/// left unresolved fails with [`CollectError::MissingVariable`].
pub fn render_template(template: &str, request: &CollectRequest) -> Result<String, CollectError> {
    render(template, request, Cow::Borrowed)
}

/// Like [`render_template`], with every substituted value percent-encoded so
/// it stays a single path segment or query value.
pub fn render_url(template: &str, request: &CollectRequest) -> Result<String, CollectError> {
    render(template, request, |value| {
        Cow::from(utf8_percent_encode(value, URL_VALUE))
    })
}

fn render<'a>(
    template: &str,
    request: &'a CollectRequest,
    encode: impl Fn(&'a str) -> Cow<'a, str>,
) -> Result<String, CollectError> {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            // Unbalanced brace: keep the remainder verbatim.
            rendered.push_str(&rest[start..]);
            return Ok(rendered);
        };

        let name = &after[..end];
        let value = request.vars.get(name).map(String::as_str).or(match name {
            "AccountId" => Some(request.account_id.as_str()),
            "Platform" => Some(request.platform.as_str()),
            _ => None,
        });
        match value {
            Some(value) => rendered.push_str(&encode(value)),
            None => {
                return Err(CollectError::MissingVariable {
                    name: name.to_string(),
                });
            }
        }
        rest = &after[end + 1..];
    }

    rendered.push_str(rest);
    Ok(rendered)
}
