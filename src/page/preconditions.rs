//! Input checks done before anything reaches the engine

use encoding_rs::{Encoding, REPLACEMENT};
use url::Url;

use crate::utils::Precondition;

/// Canonical charset name for an encoding label
pub fn canonical_encoding(label: &str) -> Result<&'static str, Precondition> {
    Encoding::for_label(label.trim().as_bytes())
        // labels that only exist to neuter dangerous encodings name no charset
        .filter(|encoding| *encoding != REPLACEMENT)
        .map(Encoding::name)
        .ok_or_else(|| Precondition::UnknownEncoding(label.to_owned()))
}

pub fn require_mime_type(mime_type: &str) -> Result<(), Precondition> {
    if mime_type.trim().is_empty() {
        Err(Precondition::EmptyMimeType)
    } else {
        Ok(())
    }
}

pub fn require_file_url(url: &Url) -> Result<(), Precondition> {
    if url.scheme() == "file" {
        Ok(())
    } else {
        Err(Precondition::NotFileUrl(url.to_string()))
    }
}
