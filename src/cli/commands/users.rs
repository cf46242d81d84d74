use clap::Subcommand;
use reqwest::Method;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::{
    client::ApiClient,
    output::{self, MessageView, UserView},
    OutputFormat,
};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List users")]
    List,

    #[command(about = "Show one user")]
    Get { id: Uuid },

    #[command(about = "Create a user")]
    Create {
        email: String,
        #[arg(long, env = "USERGATE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },

    #[command(about = "Update a user; omitted fields are left unchanged")]
    Update {
        id: Uuid,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long, value_delimiter = ',', num_args = 0.., help = "Replace roles (comma separated, empty to clear)")]
        roles: Option<Vec<Uuid>>,
        #[arg(long, value_delimiter = ',', num_args = 0.., help = "Replace groups (comma separated, empty to clear)")]
        groups: Option<Vec<Uuid>>,
    },

    #[command(about = "Delete a user")]
    Delete { id: Uuid },
}

#[derive(Serialize)]
struct CreateBody<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct UpdateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_ids: Option<Vec<Uuid>>,
}

pub async fn handle(
    cmd: UserCommands,
    client: &ApiClient,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List => {
            let users: Vec<UserView> = client.get("/users").await?;
            output::print_list(format, &users, "No users")
        }
        UserCommands::Get { id } => {
            let user: UserView = client.get(&format!("/users/{}", id)).await?;
            output::print_item(format, &user)
        }
        UserCommands::Create {
            email,
            password,
            name,
        } => {
            let body = CreateBody {
                email: &email,
                password: &password,
                name: name.as_deref(),
            };
            let user: UserView = client.request(Method::POST, "/users", Some(&body)).await?;
            output::print_item(format, &user)
        }
        UserCommands::Update {
            id,
            email,
            name,
            password,
            roles,
            groups,
        } => {
            let body = UpdateBody {
                email,
                name,
                password,
                role_ids: roles,
                group_ids: groups,
            };
            let user: UserView = client
                .request(Method::PUT, &format!("/users/{}", id), Some(&body))
                .await?;
            output::print_item(format, &user)
        }
        UserCommands::Delete { id } => {
            let response: MessageView = client.delete(&format!("/users/{}", id)).await?;
            output::print_item(format, &response)
        }
    }
}
