//! Login / logout / status commands.

use std::path::Path;

use anyhow::Result;
use openerp_rpc::{JsonRpcTransport, RecordClient, TransportOptions};
use tracing::info;

use crate::config::ClientConfig;

/// Authenticate against the current context and store the uid.
pub fn login(username: &str, password: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let ctx = config
        .current()
        .ok_or_else(|| anyhow::anyhow!("No current context. Run `openerp use context <name>`."))?
        .clone();
    super::require_server(&ctx)?;

    let client = RecordClient::authenticate(&ctx.server, &ctx.db, username, password)
        .map_err(|e| anyhow::anyhow!("Login failed: {}", e))?;

    let ctx_mut = config
        .get_mut(&ctx.name)
        .ok_or_else(|| anyhow::anyhow!("Context disappeared"))?;
    ctx_mut.login = username.to_string();
    ctx_mut.password = password.to_string();
    ctx_mut.uid = Some(client.uid().0);
    config.save(client_config_path)?;
    info!(context = %ctx.name, path = %client_config_path.display(), "credentials saved");

    println!("Logged in as {} (uid {}).", username, client.uid());
    println!("Credentials saved to context \"{}\".", ctx.name);
    Ok(())
}

/// Logout: clear credential and uid from current context.
pub fn logout(client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let current_name = config.current_context.clone();
    if current_name.is_empty() {
        anyhow::bail!("No current context.");
    }

    let ctx = config
        .get_mut(&current_name)
        .ok_or_else(|| anyhow::anyhow!("Current context not found."))?;

    ctx.clear_login();
    config.save(client_config_path)?;
    println!("Logged out from context \"{}\".", current_name);
    Ok(())
}

/// STATUS: show the context and ask the server for its version.
pub fn status(client_config_path: &Path) -> Result<()> {
    let ctx = super::current_context(client_config_path)?;
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

    println!("Context:   {}", ctx.name);
    println!("Server:    {}", or_dash(&ctx.server));
    println!("Database:  {}", or_dash(&ctx.db));
    match ctx.uid {
        Some(uid) => println!("Login:     {} (uid {})", ctx.login, uid),
        None => println!("Login:     -"),
    }

    if ctx.server.is_empty() {
        println!("Status:    no server configured");
        return Ok(());
    }

    let transport = JsonRpcTransport::new(&ctx.server, &TransportOptions::default())?;
    match RecordClient::version(&transport) {
        Ok(info) => {
            let version = info
                .get("server_version")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            println!("Status:    connected (server {})", version);
        }
        Err(e) if e.is_transport() => println!("Status:    disconnected ({})", e),
        Err(e) => println!("Status:    error ({})", e),
    }
    Ok(())
}
