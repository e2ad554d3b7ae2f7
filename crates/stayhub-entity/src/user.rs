//! User summary eagerly loaded alongside messages.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use stayhub_core::types::UserId;

/// The slice of a user record that chat clients render next to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User identifier.
    pub id: UserId,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Avatar URL.
    pub image: Option<String>,
}

impl UserSummary {
    /// Summary with only an id, used when no profile data is known.
    pub fn bare(id: UserId) -> Self {
        Self {
            id,
            first_name: None,
            last_name: None,
            image: None,
        }
    }
}
