//! Login command handler

use crate::config::Config;

pub async fn cmd_login(config: &Config, username: &str) -> anyhow::Result<()> {
    let bus = super::event_bus(config);
    let backend = super::backend(config, &bus)?;

    println!("Password for {username}:");
    let mut password = String::new();
    std::io::stdin().read_line(&mut password)?;
    let password = password.trim_end_matches(['\r', '\n']);

    let token = backend.login(username, password).await?;

    println!();
    println!("✓ Logged in.");
    println!("Export the token for later commands:");
    println!("  export JUDOLWATCH_TOKEN={token}");
    println!("Or set backend.access_token in config.toml.");

    Ok(())
}
