use clap::Subcommand;
use reqwest::Method;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::{
    client::ApiClient,
    output::{self, GroupView, MessageView},
    OutputFormat,
};

#[derive(Subcommand)]
pub enum GroupCommands {
    #[command(about = "List groups")]
    List,

    #[command(about = "Show one group and its children")]
    Get { id: Uuid },

    #[command(about = "Create a group")]
    Create {
        name: String,
        #[arg(long)]
        parent: Option<Uuid>,
    },

    #[command(about = "Rename or move a group")]
    Update {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "detach")]
        parent: Option<Uuid>,
        #[arg(long, help = "Make the group a root")]
        detach: bool,
    },

    #[command(about = "Delete a group; its children become roots")]
    Delete { id: Uuid },
}

#[derive(Serialize)]
struct CreateBody {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_group_id: Option<Uuid>,
}

#[derive(Serialize)]
struct UpdateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    /// `Some(None)` is sent as `null` and detaches the group.
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_group_id: Option<Option<Uuid>>,
}

pub async fn handle(
    cmd: GroupCommands,
    client: &ApiClient,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        GroupCommands::List => {
            let groups: Vec<GroupView> = client.get("/groups").await?;
            output::print_list(format, &groups, "No groups")
        }
        GroupCommands::Get { id } => {
            let group: GroupView = client.get(&format!("/groups/{}", id)).await?;
            output::print_item(format, &group)
        }
        GroupCommands::Create { name, parent } => {
            let body = CreateBody {
                name,
                parent_group_id: parent,
            };
            let group: GroupView = client.request(Method::POST, "/groups", Some(&body)).await?;
            output::print_item(format, &group)
        }
        GroupCommands::Update {
            id,
            name,
            parent,
            detach,
        } => {
            let parent_group_id = match (parent, detach) {
                (_, true) => Some(None),
                (Some(parent), false) => Some(Some(parent)),
                (None, false) => None,
            };
            let body = UpdateBody {
                name,
                parent_group_id,
            };
            let group: GroupView = client
                .request(Method::PUT, &format!("/groups/{}", id), Some(&body))
                .await?;
            output::print_item(format, &group)
        }
        GroupCommands::Delete { id } => {
            let response: MessageView = client.delete(&format!("/groups/{}", id)).await?;
            output::print_item(format, &response)
        }
    }
}
