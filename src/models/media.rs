use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque pointer to a file held by the object storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct MediaReference {
    pub url: String,
}

impl MediaReference {
    pub fn as_str(&self) -> &str {
        &self.url
    }
}
