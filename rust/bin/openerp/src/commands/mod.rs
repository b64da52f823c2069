pub mod context;
pub mod login;
pub mod record;
pub mod tour;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use openerp_rpc::{JsonRpcTransport, RecordClient, Session, TransportOptions, Uid};
use tracing::debug;

use crate::config::{ClientConfig, Context};

/// The current context, or an error telling the user how to pick one.
pub fn current_context(client_config_path: &Path) -> Result<Context> {
    let config = ClientConfig::load(client_config_path)?;
    config
        .current()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No current context. Run `openerp use context <name>`."))
}

/// Fail early when a context can't reach a server.
pub fn require_server(ctx: &Context) -> Result<()> {
    if ctx.server.is_empty() || ctx.db.is_empty() {
        anyhow::bail!(
            "Context \"{}\" needs a server and a database. Run `openerp context set {} --server <url> --db <name>`.",
            ctx.name,
            ctx.name
        );
    }
    Ok(())
}

/// Build a client for the current context from its stored login.
pub fn connect(client_config_path: &Path) -> Result<RecordClient> {
    let ctx = current_context(client_config_path)?;
    require_server(&ctx)?;

    let uid = match ctx.uid {
        Some(uid) if !ctx.password.is_empty() => uid,
        _ => anyhow::bail!("Not logged in to context \"{}\". Run `openerp login`.", ctx.name),
    };

    debug!(context = %ctx.name, server = %ctx.server, db = %ctx.db, uid, "resuming session");
    let transport = JsonRpcTransport::new(&ctx.server, &TransportOptions::default())?;
    Ok(RecordClient::from_session(
        Arc::new(transport),
        Session {
            endpoint: ctx.server,
            db: ctx.db,
            login: ctx.login,
            password: ctx.password,
            uid: Uid(uid),
        },
    ))
}
