//! Task documents

use serde::{Deserialize, Serialize};

use crate::ids::ObjectId;
use crate::store::Document;

/// A stored task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Assigned on insert, absent on input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    /// Owner; never checked against the users collection
    pub user_id: ObjectId,
}

impl Document for Task {
    const COLLECTION: &'static str = "tasks";
    const FIELDS: &'static [&'static str] = &["title", "description", "completed", "userId"];
}

/// Body of `POST /api/v1/tasks`
///
/// Any `id` in the body is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub user_id: Option<ObjectId>,
}

impl CreateTask {
    /// Validate required fields and build the document to insert
    pub fn into_task(self) -> Result<Task, String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        let user_id = self.user_id.ok_or_else(|| "userId is required".to_string())?;

        Ok(Task {
            id: None,
            title: self.title,
            description: self.description,
            completed: self.completed,
            user_id,
        })
    }
}

/// Body of `PUT /api/v1/tasks/{taskId}`, written over the stored fields
///
/// Missing fields overwrite with their zero value; `userId` is not updatable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskChanges {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OWNER: &str = "65f1a2b3c4d5e6f708192a3b";

    #[test]
    fn test_task_wire_format() {
        let task = Task {
            id: Some(ObjectId::parse_str("65f1a2b3c4d5e6f708192a3c").unwrap()),
            title: "x".to_string(),
            description: String::new(),
            completed: false,
            user_id: ObjectId::parse_str(OWNER).unwrap(),
        };

        assert_eq!(
            serde_json::to_value(&task).unwrap(),
            json!({
                "id": "65f1a2b3c4d5e6f708192a3c",
                "title": "x",
                "description": "",
                "completed": false,
                "userId": OWNER,
            })
        );
    }

    #[test]
    fn test_stored_content_omits_missing_id() {
        let task = CreateTask {
            title: "x".to_string(),
            user_id: Some(ObjectId::parse_str(OWNER).unwrap()),
            ..CreateTask::default()
        }
        .into_task()
        .unwrap();

        let content = serde_json::to_value(&task).unwrap();
        assert!(content.get("id").is_none());
        assert_eq!(content["completed"], json!(false));
    }

    #[test]
    fn test_create_task_defaults() {
        let request: CreateTask =
            serde_json::from_value(json!({"title": "x", "userId": OWNER, "id": "ignored"})).unwrap();
        let task = request.into_task().unwrap();
        assert_eq!(task.description, "");
        assert!(!task.completed);
        assert_eq!(task.user_id.to_hex(), OWNER);
    }

    #[test]
    fn test_create_task_requires_title() {
        let request: CreateTask = serde_json::from_value(json!({"title": "  ", "userId": OWNER})).unwrap();
        assert_eq!(request.into_task().unwrap_err(), "title is required");
    }

    #[test]
    fn test_create_task_requires_user_id() {
        let request: CreateTask = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert_eq!(request.into_task().unwrap_err(), "userId is required");
    }

    #[test]
    fn test_create_task_rejects_malformed_user_id() {
        let result = serde_json::from_value::<CreateTask>(json!({"title": "x", "userId": "nope"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_changes_default_missing_fields() {
        let changes: TaskChanges = serde_json::from_value(json!({"title": "only title"})).unwrap();
        assert_eq!(
            serde_json::to_value(&changes).unwrap(),
            json!({"title": "only title", "description": "", "completed": false})
        );
    }
}
