pub mod commands;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "company")]
#[command(about = "Company Portal administration: user accounts and password hashes")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Manage login accounts in app_user")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Print an Argon2 hash for a password without touching the database")]
    HashPassword {
        #[arg(long, env = "COMPANY_USER_PASSWORD", hide_env_values = true, help = "Password to hash")]
        password: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
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
        Commands::User { cmd } => commands::user::handle(cmd, output_format).await,
        Commands::HashPassword { password } => commands::password::handle(&password, output_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_user_add() {
        let cli = Cli::try_parse_from([
            "company", "user", "add", "admin", "--role", "admin", "--password", "somepassword",
        ])
        .unwrap();
        match cli.command {
            Commands::User { cmd: commands::user::UserCommands::Add { username, role, password } } => {
                assert_eq!(username, "admin");
                assert_eq!(role, crate::database::models::Role::Admin);
                assert_eq!(password, "somepassword");
            }
            _ => panic!("expected user add"),
        }
    }

    #[test]
    fn rejects_unknown_role() {
        assert!(Cli::try_parse_from([
            "company", "user", "add", "bob", "--role", "root", "--password", "somepassword",
        ])
        .is_err());
    }
}
