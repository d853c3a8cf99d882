//! Input normalization for save requests.
//!
//! Save inputs are loosely typed: callers may hand over anything that
//! serializes to a JSON value, or nothing at all. Both normalizers are
//! total and never fail; by the time a strategy runs, content and filename
//! are plain strings.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::debug;

use crate::config::{FilenameConfig, MAX_FILENAME_BYTES, MIN_FILENAME_BYTES};

/// Characters rejected by at least one common filesystem.
pub const ILLEGAL_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const RESERVED_DEVICE_STEMS: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest extension (including the dot) kept when a name is truncated.
const MAX_KEPT_EXTENSION_BYTES: usize = 16;

static GENERATED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Coerces any input into savable text.
///
/// Strings pass through unchanged, including the empty string. Anything
/// else becomes a bracketed type tag such as `[object Number]`; an absent
/// value is `[object Undefined]`.
#[must_use]
pub fn normalize_content(input: Option<&Value>) -> String {
    match input {
        Some(Value::String(text)) => text.clone(),
        other => type_tag(other).to_string(),
    }
}

/// Returns the bracketed runtime type tag for an input.
#[must_use]
pub fn type_tag(input: Option<&Value>) -> &'static str {
    match input {
        None => "[object Undefined]",
        Some(Value::Null) => "[object Null]",
        Some(Value::Bool(_)) => "[object Boolean]",
        Some(Value::Number(_)) => "[object Number]",
        Some(Value::String(_)) => "[object String]",
        Some(Value::Array(_)) => "[object Array]",
        Some(Value::Object(_)) => "[object Object]",
    }
}

/// Coerces any input into a usable filename.
///
/// Non-empty strings have illegal characters stripped. Missing, empty or
/// non-string inputs, and names that sanitize down to nothing, are
/// replaced by a name unique within this process.
#[must_use]
pub fn normalize_filename(input: Option<&Value>, config: &FilenameConfig) -> String {
    match input {
        Some(Value::String(name)) if !name.is_empty() => {
            let stripped = strip_illegal_characters(name, length_limit(config));
            if is_usable_filename(&stripped) {
                stripped
            } else {
                debug!(original = %name, "Filename empty after sanitizing, generating one");
                generate_unique_filename(config)
            }
        }
        _ => generate_unique_filename(config),
    }
}

/// Generates `<prefix>_<unix millis>_<counter>.<extension>`.
///
/// The counter is process-wide and monotonic, so two calls in the same
/// millisecond still differ. Prefix and extension are sanitized like any
/// other name, so an unvalidated config cannot inject path separators.
#[must_use]
pub fn generate_unique_filename(config: &FilenameConfig) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let sequence = GENERATED_COUNTER.fetch_add(1, Ordering::Relaxed);
    let extension: String = config
        .extension
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let name = if extension.is_empty() {
        format!("{}_{millis}_{sequence}", config.prefix)
    } else {
        format!("{}_{millis}_{sequence}.{extension}", config.prefix)
    };
    strip_illegal_characters(&name, length_limit(config))
}

/// Returns `name` with `_<n>` inserted before its extension.
///
/// `numbered_variant("report.txt", 2)` is `report_2.txt`.
#[must_use]
pub fn numbered_variant(name: &str, n: u64) -> String {
    let (stem, extension) = split_extension(name);
    format!("{stem}_{n}{extension}")
}

/// Splits `name` into stem and extension (with its dot).
///
/// A leading dot starts the stem, not an extension.
#[must_use]
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    }
}

fn length_limit(config: &FilenameConfig) -> usize {
    config.max_bytes.clamp(MIN_FILENAME_BYTES, MAX_FILENAME_BYTES)
}

/// Strips characters that are illegal on common filesystems.
///
/// Besides [`ILLEGAL_FILENAME_CHARS`] and control characters this trims
/// surrounding whitespace and trailing dots, escapes Windows device names
/// with a leading `_`, and truncates to `max_bytes` while keeping a short
/// extension. The result may be empty.
#[must_use]
pub fn strip_illegal_characters(name: &str, max_bytes: usize) -> String {
    let kept: String = name
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect();
    let mut cleaned = trim_filename(&kept).to_string();

    if is_reserved_device_name(&cleaned) {
        cleaned.insert(0, '_');
    }

    if cleaned.len() > max_bytes {
        cleaned = truncate_keeping_extension(&cleaned, max_bytes);
    }
    cleaned
}

/// Returns true if `name` can be handed to a host as a save name.
#[must_use]
pub fn is_usable_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".."
}

fn trim_filename(name: &str) -> &str {
    name.trim_start()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
}

fn is_reserved_device_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name).trim_end();
    RESERVED_DEVICE_STEMS
        .iter()
        .any(|reserved| stem.eq_ignore_ascii_case(reserved))
}

/// An empty result means no part of the stem survived.
fn truncate_keeping_extension(name: &str, max_bytes: usize) -> String {
    let (_, extension) = split_extension(name);
    let extension = if extension.len() <= MAX_KEPT_EXTENSION_BYTES && extension.len() < max_bytes {
        extension
    } else {
        ""
    };
    let stem = &name[..name.len() - extension.len()];
    let budget = max_bytes - extension.len();

    let mut end = budget.min(stem.len());
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    let stem = trim_filename(&stem[..end]);
    if stem.is_empty() {
        return String::new();
    }
    format!("{stem}{extension}")
}
