use anyhow::Context;
use clap::Parser;
use snippet_catalog::backend::{OpenSearchClient, SearchBackend};
use snippet_catalog::cli::{Cli, Commands};
use snippet_catalog::config::Config;
use snippet_catalog::index::{IndexManager, IndexStatus};
use snippet_catalog::search::{QueryBuilder, SynonymTable};
use snippet_catalog::service::SnippetService;
use snippet_catalog::store::SnippetStore;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    snippet_catalog::tracing::init_with_level(cli.verbose.then_some(tracing::Level::DEBUG));

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.backend.url = url;
    }
    if let Some(index) = cli.index {
        config.index_name = index;
    }

    let backend: Arc<dyn SearchBackend> = Arc::new(
        OpenSearchClient::new(&config.backend).context("Failed to create search backend client")?,
    );
    let synonyms = Arc::new(SynonymTable::load(config.synonyms_path.as_deref()));

    let status = IndexManager::new(Arc::clone(&backend), config.index_name.clone())
        .ensure_index()
        .await;

    let store = SnippetStore::new(backend, QueryBuilder::new(synonyms), config.index_name.clone())
        .with_default_limit(config.default_limit)
        .with_write_mode(config.write_mode);
    let service = SnippetService::new(store);

    match cli.command {
        Commands::Provision => {
            if status == IndexStatus::Unavailable {
                anyhow::bail!("Index '{}' could not be provisioned", config.index_name);
            }
            print_json(&serde_json::json!({
                "index": config.index_name,
                "status": format!("{status:?}"),
            }))?;
        }
        Commands::Create { file } => {
            let raw = read_document(&file).await?;
            let snippet = service
                .create(&raw)
                .await
                .context("Failed to create snippet")?;
            print_json(&snippet)?;
        }
        Commands::Delete { id } => {
            service
                .delete(&id)
                .await
                .with_context(|| format!("Failed to delete snippet '{}'", id))?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        Commands::Search { query, limit } => {
            let snippets = service
                .search(query.as_deref(), limit)
                .await
                .context("Search failed")?;
            print_json(&snippets)?;
        }
    }

    Ok(())
}

/// Read a document from a file, or stdin for `-`.
async fn read_document(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("Failed to read document from stdin")?;
        return Ok(raw);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
