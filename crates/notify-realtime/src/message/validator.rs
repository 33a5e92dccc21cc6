//! Pre-decode checks on raw inbound frames.

use notify_core::error::AppError;

/// Rejects empty frames and frames larger than `max_bytes`.
pub fn validate_inbound(raw: &str, max_bytes: usize) -> Result<(), AppError> {
    if raw.len() > max_bytes {
        return Err(AppError::decode(format!(
            "Frame of {} bytes exceeds maximum of {} bytes",
            raw.len(),
            max_bytes
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::decode("Empty frame"));
    }

    Ok(())
}
