//! User documents

use serde::{Deserialize, Serialize};

use crate::ids::ObjectId;
use crate::store::Document;

/// A stored user, password included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Document for User {
    const COLLECTION: &'static str = "users";
    const FIELDS: &'static [&'static str] = &["name", "email", "password"];
}

/// Body of `POST /api/v1/users` and `PUT /api/v1/users/{userId}`
///
/// On update every field is written, missing ones as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChanges {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl From<UserChanges> for User {
    fn from(changes: UserChanges) -> Self {
        Self {
            id: None,
            name: changes.name,
            email: changes.email,
            password: changes.password,
        }
    }
}

/// A user as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}
