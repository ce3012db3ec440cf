//! Input validation at the API boundary
//!
//! Session ids double as durable record file names, so their charset is
//! restricted. Message content is never validated here: arbitrary text is
//! always accepted and at worst yields zero keywords.

use anyhow::{anyhow, Result};

use crate::constants::MAX_SESSION_ID_LENGTH;

/// Validate a session id
pub fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.is_empty() {
        return Err(anyhow!("session_id cannot be empty"));
    }

    if session_id.len() > MAX_SESSION_ID_LENGTH {
        return Err(anyhow!(
            "session_id too long: {} chars (max: {})",
            session_id.len(),
            MAX_SESSION_ID_LENGTH
        ));
    }

    // Only allow alphanumeric, dash, underscore (ids become file names)
    if !session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(anyhow!(
            "session_id contains invalid characters (allowed: alphanumeric, -, _)"
        ));
    }

    Ok(())
}

/// Validate a configured tier capacity
pub fn validate_tier_limit(name: &str, limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(anyhow!("{name} must be greater than 0"));
    }

    if limit > crate::constants::MAX_TIER_CAPACITY {
        return Err(anyhow!(
            "{name} too large: {limit} (max: {})",
            crate::constants::MAX_TIER_CAPACITY
        ));
    }

    Ok(())
}
