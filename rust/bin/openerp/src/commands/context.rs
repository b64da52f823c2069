//! Context management commands.

use std::path::Path;

use anyhow::Result;

use crate::config::{ClientConfig, Context};

/// Server URL as stored: no trailing slash.
fn server_url(server: &str) -> String {
    server.trim_end_matches('/').to_string()
}

/// Register a new context (server + database). The first one becomes current.
pub fn add(name: &str, server: &str, db: &str, client_config_path: &Path) -> Result<()> {
    if server.is_empty() || db.is_empty() {
        anyhow::bail!("Both --server and --db are required.");
    }

    let mut config = ClientConfig::load(client_config_path)?;
    if config.contexts.iter().any(|c| c.name == name) {
        anyhow::bail!("Context \"{}\" already exists. Use `openerp context set {}`.", name, name);
    }

    let server = server_url(server);
    config.upsert_context(Context {
        name: name.to_string(),
        server: server.clone(),
        db: db.to_string(),
        ..Default::default()
    });
    if config.current_context.is_empty() {
        config.current_context = name.to_string();
    }
    config.save(client_config_path)?;

    println!("Context \"{}\" created.", name);
    println!("  Server:   {}", server);
    println!("  Database: {}", db);
    Ok(())
}

/// List all contexts.
pub fn list(client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: openerp context add <name> --server <url> --db <name>");
        return Ok(());
    }

    println!("{:2} {:16} {:32} {:16} {:12}", "", "NAME", "SERVER", "DATABASE", "LOGIN");
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context { "*" } else { " " };
        let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
        let login = match ctx.uid {
            Some(uid) => format!("{} ({})", ctx.login, uid),
            None => "-".to_string(),
        };
        println!(
            "{:2} {:16} {:32} {:16} {:12}",
            marker,
            ctx.name,
            or_dash(&ctx.server),
            or_dash(&ctx.db),
            login
        );
    }

    Ok(())
}

/// Switch current context.
pub fn use_context(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.contexts.iter().any(|c| c.name == name) {
        anyhow::bail!("Context \"{}\" not found. Run `openerp context list` to see available contexts.", name);
    }

    config.current_context = name.to_string();
    config.save(client_config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

/// Set properties on a context. Changing server or database drops the login.
pub fn set(name: &str, server: Option<&str>, db: Option<&str>, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    let ctx = config
        .get_mut(name)
        .ok_or_else(|| anyhow::anyhow!("Context \"{}\" not found.", name))?;

    if let Some(s) = server {
        ctx.server = server_url(s);
        ctx.clear_login();
    }
    if let Some(d) = db {
        ctx.db = d.to_string();
        ctx.clear_login();
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" updated.", name);
    Ok(())
}

/// Delete a context.
pub fn delete(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.remove_context(name) {
        anyhow::bail!("Context \"{}\" not found.", name);
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" deleted.", name);
    Ok(())
}
