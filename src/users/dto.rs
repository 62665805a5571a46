use serde::Serialize;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::users::repo_types::{Gender, Role, User};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Public part of the user returned to the client. Never carries the credential.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub gender: Option<Gender>,
    #[serde(with = "iso_date::option")]
    pub birth_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            role: u.role,
            name: u.name,
            last_name: u.last_name,
            middle_name: u.middle_name,
            gender: u.gender,
            birth_date: u.birth_date,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleChangedResponse {
    pub message: String,
    pub data: PublicUser,
}
