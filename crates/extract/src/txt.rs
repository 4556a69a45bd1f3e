use super::ExtractionError;

pub fn extract_txt(bytes: &[u8]) -> Result<String, ExtractionError> {
    // Strict decode: a lossy fallback would forward mojibake upstream
    Ok(String::from_utf8(bytes.to_vec())?)
}
