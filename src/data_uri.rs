//! Plain text data URIs.
//!
//! Content is handed to the host's download machinery inline, as
//! `data:charset=utf-8,<percent-encoded text>`. Encoding follows URI
//! *component* rules: ASCII letters, digits and `- _ . ! ~ * ' ( )` pass
//! through, every other UTF-8 byte becomes `%XX`.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::SaveError;

/// Prefix of every data URI built by this crate.
pub const TEXT_DATA_URI_PREFIX: &str = "data:charset=utf-8,";

/// Everything but ASCII alphanumerics and the URI unreserved marks.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes `text` as a URI component.
#[must_use]
pub fn encode_uri_component(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

/// Builds a plain text data URI for `content`.
#[must_use]
pub fn build_text_data_uri(content: &str) -> String {
    let encoded = encode_uri_component(content);
    let mut uri = String::with_capacity(TEXT_DATA_URI_PREFIX.len() + encoded.len());
    uri.push_str(TEXT_DATA_URI_PREFIX);
    uri.push_str(&encoded);
    uri
}

/// Decodes the text body of a percent-encoded data URI.
///
/// The media type section before the first `,` is not interpreted; only
/// the scheme is checked.
///
/// # Errors
///
/// Returns `SaveError::MalformedDataUri` if the scheme is not `data:`, the
/// `,` separator is missing, or the decoded bytes are not valid UTF-8.
pub fn decode_text_data_uri(uri: &str) -> Result<String, SaveError> {
    let Some((scheme, rest)) = uri.split_once(':') else {
        return Err(SaveError::malformed_data_uri("missing scheme"));
    };
    if !scheme.eq_ignore_ascii_case("data") {
        return Err(SaveError::malformed_data_uri(&format!(
            "expected 'data' scheme, got '{scheme}'"
        )));
    }
    let Some((_media_type, body)) = rest.split_once(',') else {
        return Err(SaveError::malformed_data_uri("missing ',' before body"));
    };
    urlencoding::decode(body)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| SaveError::malformed_data_uri(&e.to_string()))
}
