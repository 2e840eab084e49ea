use serde_json::json;

use crate::auth::password::{hash_password, validate_password};
use crate::cli::OutputFormat;

pub fn handle(password: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    validate_password(password)?;
    let hash = hash_password(password)?;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "password_hash": hash })),
        OutputFormat::Text => println!("{}", hash),
    }
    Ok(())
}
