use anyhow::anyhow;
use tokio::process::Command;

use crate::settings::Config;

async fn run_sqlx(args: &[&str]) -> anyhow::Result<()> {
    let status = Command::new("sqlx").args(args).status().await?;
    if !status.success() {
        return Err(anyhow!("sqlx {} exited with {}", args.join(" "), status));
    }
    Ok(())
}

pub async fn db_generate(migration_name: &str) -> anyhow::Result<()> {
    run_sqlx(&["migrate", "add", migration_name, "-r"]).await
}

pub async fn db_list(config: &Config) -> anyhow::Result<()> {
    run_sqlx(&["migrate", "info", "-D", config.database_url.as_str()]).await
}

pub async fn db_migrate(config: &Config) -> anyhow::Result<()> {
    run_sqlx(&["migrate", "run", "-D", config.database_url.as_str()]).await
}

pub async fn db_revert(config: &Config) -> anyhow::Result<()> {
    run_sqlx(&["migrate", "revert", "-D", config.database_url.as_str()]).await
}
