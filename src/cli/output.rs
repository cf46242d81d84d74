use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cli::OutputFormat;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
    #[serde(default)]
    pub group_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupView {
    pub id: Uuid,
    pub name: String,
    pub parent_group_id: Option<Uuid>,
    #[serde(default)]
    pub child_group_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Any response that only carries a confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub message: String,
}

/// One-line human rendering.
pub trait Render {
    fn render(&self) -> String;
}

fn join_ids(ids: &[Uuid]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
}

impl Render for UserView {
    fn render(&self) -> String {
        format!(
            "{}  {}  {}  roles={}  groups={}",
            self.id,
            self.email,
            self.name.as_deref().unwrap_or("-"),
            join_ids(&self.role_ids),
            join_ids(&self.group_ids),
        )
    }
}

impl Render for RoleView {
    fn render(&self) -> String {
        format!(
            "{}  {}  {}",
            self.id,
            self.name,
            self.description.as_deref().unwrap_or("-")
        )
    }
}

impl Render for GroupView {
    fn render(&self) -> String {
        let parent = self
            .parent_group_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}  {}  parent={}  children={}",
            self.id,
            self.name,
            parent,
            join_ids(&self.child_group_ids)
        )
    }
}

impl Render for MessageView {
    fn render(&self) -> String {
        format!("✓ {}", self.message)
    }
}

/// Prints one item in the requested format.
pub fn print_item<T: Serialize + Render>(format: &OutputFormat, item: &T) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", sonic_rs::to_string_pretty(item)?),
        OutputFormat::Text => println!("{}", item.render()),
    }
    Ok(())
}

/// Prints a collection in the requested format.
pub fn print_list<T: Serialize + Render>(
    format: &OutputFormat,
    items: &[T],
    empty_message: &str,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", sonic_rs::to_string_pretty(&items)?),
        OutputFormat::Text if items.is_empty() => println!("{}", empty_message),
        OutputFormat::Text => {
            for item in items {
                println!("{}", item.render());
            }
        }
    }
    Ok(())
}

/// Prints a bare confirmation.
pub fn print_message(format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    print_item(
        format,
        &MessageView {
            message: message.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_view_ignores_server_only_fields() {
        let body = r#"{
            "id": "6f1c1f8e-6d4a-4c59-9d55-3b8f9b2a1c11",
            "email": "alice@example.com",
            "name": null,
            "role_ids": [],
            "group_ids": [],
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "deleted_at": null
        }"#;

        let user: UserView = sonic_rs::from_str(body).unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(user.render().contains("roles=-"));
    }
}
