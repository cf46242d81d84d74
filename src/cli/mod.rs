pub mod client;
pub mod commands;
pub mod output;
pub mod session;

use std::io::Write;

use clap::{parser::ValueSource, CommandFactory, FromArgMatches, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "usergate-cli")]
#[command(about = "Command-line client for the usergate API")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "USERGATE_SERVER",
        default_value = "http://127.0.0.1:8080",
        help = "Base URL of the server"
    )]
    pub server: String,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    /// Without a subcommand the CLI reads commands from stdin, one per line.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Register a new account")]
    Signup {
        email: String,
        #[arg(long, env = "USERGATE_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: Option<String>,
    },

    #[command(about = "Log in and store the session token")]
    Login {
        email: String,
        #[arg(long, env = "USERGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    #[command(about = "Log out and forget the stored token")]
    Logout,

    #[command(about = "Show the logged-in user")]
    Whoami,

    #[command(about = "User management")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "Role management")]
    Roles {
        #[command(subcommand)]
        cmd: commands::roles::RoleCommands,
    },

    #[command(about = "Group management")]
    Groups {
        #[command(subcommand)]
        cmd: commands::groups::GroupCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Some(command) => execute(command, &cli.server, output_format).await,
        None => shell(&cli.server, output_format).await,
    }
}

/// Runs one command against `server`, using the stored session for it if there is one.
pub async fn execute(
    command: Commands,
    server: &str,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let server = server.trim_end_matches('/');
    let token = session::load_for(server)?.map(|stored| stored.token);
    let client = ApiClient::new(server, token)?;
    let format = &output_format;

    match command {
        Commands::Signup {
            email,
            password,
            name,
        } => commands::auth::signup(&client, format, &email, &password, name.as_deref()).await,
        Commands::Login { email, password } => {
            commands::auth::login(&client, format, &email, &password).await
        }
        Commands::Logout => commands::auth::logout(&client, format).await,
        Commands::Whoami => commands::auth::whoami(&client, format).await,
        Commands::Users { cmd } => commands::users::handle(cmd, &client, format).await,
        Commands::Roles { cmd } => commands::roles::handle(cmd, &client, format).await,
        Commands::Groups { cmd } => commands::groups::handle(cmd, &client, format).await,
    }
}

/// Splits a shell line into the arguments `Cli` is parsed from.
fn shell_args(line: &str) -> Vec<&str> {
    std::iter::once("usergate-cli")
        .chain(line.split_whitespace())
        .collect()
}

/// Parses one shell line. The line's `--server` wins only when given on the
/// line itself; otherwise the server the shell was started with applies.
fn parse_shell_line(line: &str, server: &str) -> Result<Cli, clap::Error> {
    let matches = Cli::command().try_get_matches_from(shell_args(line))?;
    let mut cli = Cli::from_arg_matches(&matches)?;

    if matches.value_source("server") != Some(ValueSource::CommandLine) {
        cli.server = server.to_string();
    }

    Ok(cli)
}

/// Interactive mode: one command per line until EOF or `exit`.
async fn shell(server: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            "exit" | "quit" => break,
            _ => {}
        }

        let cli = match parse_shell_line(line, server) {
            Ok(cli) => cli,
            Err(e) => {
                e.print()?;
                continue;
            }
        };

        let format = if cli.json {
            OutputFormat::Json
        } else {
            output_format
        };

        if let Some(command) = cli.command {
            if let Err(e) = execute(command, &cli.server, format).await {
                eprintln!("Error: {e}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn shell_lines_parse_like_arguments() {
        let cli = Cli::try_parse_from(shell_args("  roles   create admins --description ops ")).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Roles {
                cmd: commands::roles::RoleCommands::Create { .. }
            })
        ));
    }

    #[test]
    fn shell_keeps_the_startup_server() {
        let cli = parse_shell_line("users list", "http://api:9000").unwrap();
        assert_eq!(cli.server, "http://api:9000");

        let cli = parse_shell_line("--server http://other:1 users list", "http://api:9000").unwrap();
        assert_eq!(cli.server, "http://other:1");

        let cli = parse_shell_line("users list --server http://other:2", "http://api:9000").unwrap();
        assert_eq!(cli.server, "http://other:2");
    }

    #[test]
    fn empty_role_list_clears_memberships() {
        let id = uuid::Uuid::new_v4().to_string();
        let cli = Cli::try_parse_from(shell_args(&format!("users update {} --roles", id))).unwrap();

        match cli.command {
            Some(Commands::Users {
                cmd: commands::users::UserCommands::Update { roles, groups, .. },
            }) => {
                assert_eq!(roles, Some(Vec::new()));
                assert_eq!(groups, None);
            }
            _ => panic!("expected users update"),
        }
    }
}
