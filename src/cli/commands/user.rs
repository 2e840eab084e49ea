use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::auth::password::{hash_password, validate_password};
use crate::auth::PgCredentialStore;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::models::Role;
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user")]
    Add {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, default_value = "viewer", help = "admin or viewer")]
        role: Role,
        #[arg(long, env = "COMPANY_USER_PASSWORD", hide_env_values = true, help = "Password")]
        password: String,
    },

    #[command(about = "Replace a user's password")]
    Passwd {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, env = "COMPANY_USER_PASSWORD", hide_env_values = true, help = "New password")]
        password: String,
    },

    #[command(about = "List users and their roles")]
    List,
}

async fn store() -> anyhow::Result<PgCredentialStore> {
    let config = AppConfig::from_env();
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("could not connect to DATABASE_URL")?;
    Ok(PgCredentialStore::new(pool))
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add { username, role, password } => {
            validate_password(&password)?;
            let hash = hash_password(&password)?;
            let user = store().await?.create_user(username.trim(), &hash, role).await?;

            match output_format {
                OutputFormat::Json => {
                    println!("{}", json!({ "id": user.id, "username": user.username, "role": user.role }))
                }
                OutputFormat::Text => println!("Created {} user '{}' (id {})", user.role, user.username, user.id),
            }
            Ok(())
        }
        UserCommands::Passwd { username, password } => {
            validate_password(&password)?;
            let hash = hash_password(&password)?;
            store().await?.set_password(&username, &hash).await?;

            match output_format {
                OutputFormat::Json => println!("{}", json!({ "username": username, "updated": true })),
                OutputFormat::Text => println!("Password updated for '{}'", username),
            }
            Ok(())
        }
        UserCommands::List => {
            let users = store().await?.list_users().await?;

            match output_format {
                OutputFormat::Json => {
                    let list: Vec<_> = users
                        .iter()
                        .map(|u| json!({ "id": u.id, "username": u.username, "role": u.role }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&list)?);
                }
                OutputFormat::Text => {
                    for user in &users {
                        println!("{:>5}  {:<8}  {}", user.id, user.role.as_str(), user.username);
                    }
                }
            }
            Ok(())
        }
    }
}
