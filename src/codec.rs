//! Image bytes <-> base64 text, as Forge expects them inside JSON bodies.

use crate::error::{ForgeError, Result};
use base64::{engine::general_purpose, Engine as _};
use std::path::Path;

/// Encodes raw bytes with the standard, padded base64 alphabet.
pub fn encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decodes standard or URL-safe base64. Surrounding whitespace is ignored;
/// anything else malformed is an error.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    match general_purpose::STANDARD.decode(text) {
        Ok(bytes) => Ok(bytes),
        Err(standard_err) => general_purpose::URL_SAFE
            .decode(text)
            .map_err(|_| ForgeError::DecodeError(standard_err)),
    }
}

/// Reads an image file and returns it base64-encoded.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ForgeError::file_io(path, e))?;
    log::debug!("Encoded {} ({} bytes)", path.display(), bytes.len());
    Ok(encode(&bytes))
}

/// Decodes `data` and writes the bytes to `path`. Returns the number of bytes written.
pub async fn decode_to_file(data: &str, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let bytes = decode(data)?;
    tokio::fs::write(path, &bytes)
        .await
        .map_err(|e| ForgeError::file_io(path, e))?;
    log::info!("Saved image to {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes.len())
}
