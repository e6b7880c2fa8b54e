//! Utility functions

/// Maximum number of payload bytes included in log previews
pub const PREVIEW_BYTES: usize = 64;

/// Truncated, lossy UTF-8 preview of a payload for log messages
///
/// Never returns more than [`PREVIEW_BYTES`] bytes of the payload, so full
/// payloads (which may hold sensitive data) never reach the logs. An ellipsis is
/// appended when the payload was cut.
pub fn payload_preview(payload: &[u8]) -> String {
    if payload.len() <= PREVIEW_BYTES {
        return String::from_utf8_lossy(payload).into_owned();
    }
    let mut preview = String::from_utf8_lossy(&payload[..PREVIEW_BYTES]).into_owned();
    preview.push_str("...");
    preview
}
