use clap::Subcommand;
use reqwest::Method;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::{
    client::ApiClient,
    output::{self, MessageView, RoleView},
    OutputFormat,
};

#[derive(Subcommand)]
pub enum RoleCommands {
    #[command(about = "List roles")]
    List,

    #[command(about = "Show one role")]
    Get { id: Uuid },

    #[command(about = "Create a role")]
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    #[command(about = "Update a role")]
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    #[command(about = "Delete a role")]
    Delete { id: Uuid },
}

#[derive(Serialize)]
struct RoleBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

pub async fn handle(
    cmd: RoleCommands,
    client: &ApiClient,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        RoleCommands::List => {
            let roles: Vec<RoleView> = client.get("/roles").await?;
            output::print_list(format, &roles, "No roles")
        }
        RoleCommands::Get { id } => {
            let role: RoleView = client.get(&format!("/roles/{}", id)).await?;
            output::print_item(format, &role)
        }
        RoleCommands::Create { name, description } => {
            let body = RoleBody {
                name: Some(name),
                description,
            };
            let role: RoleView = client.request(Method::POST, "/roles", Some(&body)).await?;
            output::print_item(format, &role)
        }
        RoleCommands::Update {
            id,
            name,
            description,
        } => {
            let body = RoleBody { name, description };
            let role: RoleView = client
                .request(Method::PUT, &format!("/roles/{}", id), Some(&body))
                .await?;
            output::print_item(format, &role)
        }
        RoleCommands::Delete { id } => {
            let response: MessageView = client.delete(&format!("/roles/{}", id)).await?;
            output::print_item(format, &response)
        }
    }
}
