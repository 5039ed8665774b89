use serde::{Deserialize, Serialize};

/// One row of the `humans` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Human {
    pub first_name: String,
    pub last_name: String,
    /// ISO date, kept as text the way it was entered.
    pub date_of_birth: String,
    pub has_allergies: bool,
    pub bio: String,
}

impl Human {
    pub fn new(first_name: &str, last_name: &str, date_of_birth: &str, has_allergies: bool, bio: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_of_birth: date_of_birth.to_string(),
            has_allergies,
            bio: bio.to_string(),
        }
    }
}
