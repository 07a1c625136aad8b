//! Command-line front end for the contact store.
//!
//! # Responsibility
//! - Build one `DaoFactory` from flags/env and run a single CRUD command.
//! - Print contacts as JSON lines for easy piping.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use contacts_core::{
    default_log_level, init_logging, Contact, ContactId, ContactService, DaoConfig, DaoFactory,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Manage address-book contacts", long_about = None)]
struct Cli {
    /// Storage backend: mem | jpa | sqlite
    #[arg(long, env = "CONTACTS_BACKEND", default_value = "mem")]
    backend: String,

    /// SQLite database file (sqlite backend only)
    #[arg(long, env = "CONTACTS_DB")]
    db: Option<PathBuf>,

    /// Insert the sample contacts before running the command
    #[arg(long)]
    seed: bool,

    /// Absolute directory for rotating log files; logging is off when unset
    #[arg(long, env = "CONTACTS_LOG_DIR")]
    log_dir: Option<String>,

    /// Log level: trace | debug | info | warn | error
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List contacts, optionally filtered by a title substring
    List {
        #[arg(short, long)]
        title: Option<String>,
    },
    /// Show one contact
    Get { id: ContactId },
    /// Create a contact
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        email: String,
    },
    /// Merge-update a contact; omitted optional fields are cleared
    Update {
        id: ContactId,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        photo_url: Option<String>,
    },
    /// Delete a contact
    Delete { id: ContactId },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let mut config = DaoConfig::new(cli.backend.parse()?).with_seed_samples(cli.seed);
    if let Some(db) = cli.db {
        config = config.with_db_path(db);
    }
    let factory = DaoFactory::open(config).context("failed to open contact store")?;
    let service = ContactService::new(factory.contact_dao());

    let outcome = run(&service, cli.command);
    factory.shutdown()?;
    outcome
}

fn run(service: &ContactService, command: Command) -> Result<()> {
    match command {
        Command::List { title } => {
            for contact in service.list_contacts(title.as_deref())? {
                print_contact(&contact)?;
            }
        }
        Command::Get { id } => match service.get_contact(id)? {
            Some(contact) => print_contact(&contact)?,
            None => bail!("contact {id} not found"),
        },
        Command::Add { title, name, email } => {
            match service.create_contact(&title, &name, &email)? {
                Some(id) => println!("{id}"),
                None => bail!("contact store rejected the new contact"),
            }
        }
        Command::Update {
            id,
            title,
            name,
            email,
            photo_url,
        } => {
            let update = Contact {
                title,
                name,
                email,
                photo_url,
                ..Contact::new()
            };
            if !service.update_contact(id, &update)? {
                bail!("contact store rejected the update of {id}");
            }
        }
        Command::Delete { id } => {
            if !service.delete_contact(id)? {
                bail!("contact {id} not found");
            }
        }
    }
    Ok(())
}

fn print_contact(contact: &Contact) -> Result<()> {
    println!("{}", serde_json::to_string(contact)?);
    Ok(())
}
