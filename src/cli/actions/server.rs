use crate::api;
use crate::cli::actions::Action;
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server { port, dsn, config } => {
            // Validate the connection string before touching the network.
            let dsn = Url::parse(&dsn).context("invalid database connection string")?;

            api::new(port, dsn.to_string(), config).await?;
        }
    }

    Ok(())
}
