//! `openerp`: command line client for the OpenERP/Odoo external RPC API.
//!
//! Manages contexts (server + database + login) and runs record
//! operations against remote models. Think of it as `kubectl` for an ERP.

mod commands;
mod config;
mod input;
mod output;

use std::io::Write;

use clap::{Parser, Subcommand};
use openerp_rpc::Permission;

use crate::output::Format;

/// OpenERP RPC client.
#[derive(Parser, Debug)]
#[command(name = "openerp", about = "OpenERP/Odoo RPC client")]
struct Cli {
    /// Path to client config file (default: ~/.openerp/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format.
    #[arg(long = "output", short = 'o', global = true, value_enum, default_value = "table")]
    output: Format,

    #[command(subcommand)]
    command: Commands,
}

/// Filter flags shared by search-like commands.
#[derive(clap::Args, Debug)]
struct FilterArgs {
    /// Condition "field operator value" (repeatable, ANDed).
    #[arg(long = "where", short = 'w')]
    conditions: Vec<String>,
    /// Raw domain as JSON, e.g. '[["gender", "=", "male"]]'.
    #[arg(long)]
    domain: Option<String>,
}

/// Field value flags shared by create/update.
#[derive(clap::Args, Debug)]
struct ValueArgs {
    /// Field assignment key=value (repeatable).
    #[arg(long = "set", short = 's')]
    assignments: Vec<String>,
    /// JSON object body.
    #[arg(long = "json")]
    json_body: Option<String>,
    /// Read the JSON object body from a file.
    #[arg(short = 'f', long = "file")]
    file: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage contexts.
    #[command(name = "context")]
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Switch the current context.
    #[command(name = "use")]
    Use {
        #[command(subcommand)]
        what: UseWhat,
    },

    /// Authenticate against the current context's server.
    Login {
        /// Login name.
        #[arg(long)]
        user: Option<String>,
        /// Password or API key (prompted when absent).
        #[arg(long, env = "OPENERP_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Clear the stored credential of the current context.
    Logout,

    /// Check whether the current user holds a permission on a model.
    Access {
        model: String,
        /// read, write, create or unlink.
        #[arg(long = "perm", default_value = "read")]
        permission: Permission,
    },

    /// List ids of matching records.
    Search {
        model: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Count matching records.
    Count {
        model: String,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Read records by id.
    Read {
        model: String,
        #[arg(required = true, num_args = 1.., value_delimiter = ',')]
        ids: Vec<i64>,
        /// Fields to read (default: all).
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
    },

    /// Search and read in one call.
    #[command(name = "search-read")]
    SearchRead {
        model: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Fields to read (default: all).
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show field definitions of a model.
    Fields {
        model: String,
        /// Only these fields.
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Only these attributes, e.g. string,help,type.
        #[arg(long, value_delimiter = ',')]
        attributes: Vec<String>,
    },

    /// Create a record.
    Create {
        model: String,
        #[command(flatten)]
        values: ValueArgs,
    },

    /// Update records (write).
    Update {
        model: String,
        #[arg(required = true, num_args = 1.., value_delimiter = ',')]
        ids: Vec<i64>,
        #[command(flatten)]
        values: ValueArgs,
    },

    /// Delete records (unlink).
    Delete {
        model: String,
        #[arg(required = true, num_args = 1.., value_delimiter = ',')]
        ids: Vec<i64>,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Walk a model through every record operation, creating and
    /// deleting one scratch record.
    Tour {
        #[arg(long, default_value = "united_medical.patients")]
        model: String,
    },

    /// Check server status.
    Status,

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Register a new context.
    Add {
        /// Context name.
        name: String,
        /// Server URL, e.g. http://localhost:8069.
        #[arg(long)]
        server: String,
        /// Database name.
        #[arg(long)]
        db: String,
    },
    /// List all contexts.
    List,
    /// Set properties on a context.
    Set {
        name: String,
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        db: Option<String>,
    },
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum UseWhat {
    /// Switch to a context.
    Context { name: String },
}

fn read_line(prompt: &str) -> anyhow::Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;
    let mut s = String::new();
    std::io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

fn field_values(values: ValueArgs) -> anyhow::Result<openerp_rpc::FieldSet> {
    let body = match values.file {
        Some(path) => Some(std::fs::read_to_string(&path)?),
        None => values.json_body,
    };
    input::build_fields(&values.assignments, body.as_deref())
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries results only.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);
    let format = cli.output;

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Add { name, server, db } => {
                commands::context::add(&name, &server, &db, &config_path)?;
            }
            ContextAction::List => {
                commands::context::list(&config_path)?;
            }
            ContextAction::Set { name, server, db } => {
                commands::context::set(&name, server.as_deref(), db.as_deref(), &config_path)?;
            }
            ContextAction::Delete { name } => {
                commands::context::delete(&name, &config_path)?;
            }
        },

        Commands::Use { what } => match what {
            UseWhat::Context { name } => {
                commands::context::use_context(&name, &config_path)?;
            }
        },

        Commands::Login { user, password } => {
            let username = match user {
                Some(u) => u,
                None => read_line("Login: ")?,
            };
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")?,
            };
            if username.is_empty() || password.is_empty() {
                anyhow::bail!("Login and password cannot be empty.");
            }
            commands::login::login(&username, &password, &config_path)?;
        }

        Commands::Logout => {
            commands::login::logout(&config_path)?;
        }

        Commands::Access { model, permission } => {
            commands::record::access(&model, permission, format, &config_path)?;
        }

        Commands::Search {
            model,
            filter,
            offset,
            limit,
        } => {
            let domain = input::build_domain(&filter.conditions, filter.domain.as_deref())?;
            commands::record::search(&model, &domain, offset, limit, format, &config_path)?;
        }

        Commands::Count { model, filter } => {
            let domain = input::build_domain(&filter.conditions, filter.domain.as_deref())?;
            commands::record::count(&model, &domain, format, &config_path)?;
        }

        Commands::Read { model, ids, fields } => {
            commands::record::read(&model, &ids, &fields, format, &config_path)?;
        }

        Commands::SearchRead {
            model,
            filter,
            fields,
            offset,
            limit,
        } => {
            let domain = input::build_domain(&filter.conditions, filter.domain.as_deref())?;
            commands::record::search_read(&model, &domain, &fields, offset, limit, format, &config_path)?;
        }

        Commands::Fields {
            model,
            fields,
            attributes,
        } => {
            commands::record::fields(&model, &fields, &attributes, format, &config_path)?;
        }

        Commands::Create { model, values } => {
            let fields = field_values(values)?;
            commands::record::create(&model, &fields, format, &config_path)?;
        }

        Commands::Update { model, ids, values } => {
            let fields = field_values(values)?;
            commands::record::update(&model, &ids, &fields, format, &config_path)?;
        }

        Commands::Delete { model, ids, yes } => {
            if !yes {
                let answer = read_line(&format!("Delete {} record(s) from {}? [y/N]: ", ids.len(), model))?;
                if !answer.eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
            commands::record::delete(&model, &ids, format, &config_path)?;
        }

        Commands::Tour { model } => {
            commands::tour::tour(&model, &config_path)?;
        }

        Commands::Status => {
            commands::login::status(&config_path)?;
        }

        Commands::Version => {
            println!("openerp cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
