//! HTTP handlers for users and tasks
//!
//! Each handler validates its inputs, issues exactly one store operation
//! (two for the paged task list) and maps the outcome to a response.

use serde::{Deserialize, Serialize};

pub mod tasks;
pub mod users;

/// `{"message": ...}` acknowledgement body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
