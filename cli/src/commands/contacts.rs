use anyhow::Result;
use clap::Subcommand;
use products_crm::ListParams;
use tracing::info;
use uuid::Uuid;

use super::{Context, print_json};

#[derive(Subcommand, Debug)]
pub enum ContactsCommand {
    /// List contacts, newest first.
    List {
        #[arg(long, default_value_t = 50)]
        limit: u64,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        /// Only contacts carrying this tag.
        #[arg(long)]
        tag: Option<String>,
    },
    /// Match name, email or company.
    Search {
        term: String,
        #[arg(long, default_value_t = 50)]
        limit: u64,
    },
    /// Delete a contact after confirmation.
    Delete { id: Uuid },
}

pub async fn run(command: ContactsCommand, ctx: &Context) -> Result<()> {
    let contacts = &ctx.crm.contacts;
    match command {
        ContactsCommand::List { limit, offset, tag } => {
            let params = ListParams::page(limit, offset);
            let rows = match tag {
                Some(tag) => contacts.with_tag(&tag, params).await?,
                None => contacts.list(params).await?,
            };
            print_json(&rows)
        }
        ContactsCommand::Search { term, limit } => {
            print_json(&contacts.search(&term, ListParams::page(limit, 0)).await?)
        }
        ContactsCommand::Delete { id } => {
            let contact = contacts.get(id).await?;
            ctx.require_confirmation(&format!(
                "Delete contact {} ({id})?",
                contact.display_name()
            ))?;
            let deleted = contacts.delete(id).await?;
            info!(%id, "contact deleted");
            print_json(&deleted)
        }
    }
}
