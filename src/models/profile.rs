use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub user_id: String,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub is_owner: bool,
    pub city: Option<String>,
}

/// Body of `POST /api/profiles`. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub is_owner: Option<bool>,
    pub city: Option<String>,
}
