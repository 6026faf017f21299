use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result, anyhow};
use clap::Subcommand;
use platform_client::{ProgressCallback, UploadProgress};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Context, print_json};

#[derive(Subcommand, Debug)]
pub enum AssetsCommand {
    /// Upload a file into the asset library.
    Upload {
        file: PathBuf,
        #[arg(long)]
        folder: Option<Uuid>,
        /// Defaults to a guess from the file extension.
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Delete a folder and every file in it after confirmation.
    DeleteFolder { id: Uuid },
}

pub async fn run(command: AssetsCommand, ctx: &Context) -> Result<()> {
    let library = &ctx.crm.assets;
    match command {
        AssetsCommand::Upload {
            file,
            folder,
            content_type,
        } => {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow!("{} has no usable file name", file.display()))?
                .to_string();
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let content_type = content_type.unwrap_or_else(|| guess_content_type(&file_name).into());

            let progress: ProgressCallback = Arc::new(|p: UploadProgress| {
                debug!(sent = p.sent, total = p.total, "upload progress {:.0}%", p.fraction() * 100.0);
            });
            let asset = library
                .upload(folder, &file_name, &content_type, bytes, Some(progress))
                .await?;
            info!(path = %asset.storage_path, "asset uploaded");
            let url = library.public_url(&asset)?;
            print_json(&serde_json::json!({ "asset": asset, "public_url": url }))
        }
        AssetsCommand::DeleteFolder { id } => {
            let contents = library.assets_in(Some(id)).await?;
            ctx.require_confirmation(&format!(
                "Delete folder {id} and its {} file(s)?",
                contents.len()
            ))?;
            print_json(&library.delete_folder(id).await?)
        }
    }
}

fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "mp4" => "video/mp4",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_from_extension() {
        assert_eq!(guess_content_type("Logo.PNG"), "image/png");
        assert_eq!(guess_content_type("brochure.pdf"), "application/pdf");
        assert_eq!(guess_content_type("README"), "application/octet-stream");
    }
}
