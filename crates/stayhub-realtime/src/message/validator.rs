//! Inbound frame validation rules.

use stayhub_core::error::AppError;

/// Maximum allowed frame size in bytes.
pub const MAX_FRAME_SIZE: usize = 65_536;

/// Maximum room name length.
pub const MAX_ROOM_NAME_LEN: usize = 256;

/// Validates a raw inbound frame before parsing.
pub fn validate_frame(raw: &str) -> Result<(), AppError> {
    if raw.len() > MAX_FRAME_SIZE {
        return Err(AppError::validation(format!(
            "Frame exceeds maximum size of {MAX_FRAME_SIZE} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty frame"));
    }

    Ok(())
}

/// Validates a room name.
pub fn validate_room_name(room: &str) -> Result<(), AppError> {
    if room.is_empty() || room.len() > MAX_ROOM_NAME_LEN {
        return Err(AppError::validation("Invalid room name length"));
    }

    if !room
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == ':' || c == '-' || c == '_')
    {
        return Err(AppError::validation("Room name contains invalid characters"));
    }

    Ok(())
}
