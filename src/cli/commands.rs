//! Subcommand implementations.

use super::output::Output;
use super::{Cli, Commands};
use crate::chat::ChatService;
use crate::rag::{IngestReport, JsonDocumentSource};
use crate::utils::toml_config::RagdeskConfig;
use crate::AppState;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the parsed command line against a loaded configuration.
pub async fn run(cli: Cli, config: RagdeskConfig, output: &Output) -> Result<()> {
    match cli.command {
        None => serve(config, output, None, None, false).await,
        Some(Commands::Serve {
            host,
            port,
            no_ingest,
        }) => serve(config, output, host, port, no_ingest).await,
        Some(Commands::Ingest { file, reindex }) => {
            ingest(&config, output, file.as_deref(), reindex).await
        }
        Some(Commands::Ask {
            question,
            no_context,
        }) => ask(&config, output, &question, !no_context).await,
        Some(Commands::Chat { no_context }) => chat(&config, output, !no_context).await,
        Some(Commands::Search { query, k }) => search(&config, output, &query, k).await,
        Some(Commands::Stats) => stats(&config, output).await,
        Some(Commands::Clear { yes }) => clear(&config, output, yes).await,
        Some(Commands::Config { validate }) => show_config(&cli.config, &config, output, validate),
    }
}

async fn build_service(config: &RagdeskConfig) -> Result<ChatService> {
    ChatService::from_config(config)
        .await
        .context("Failed to initialize the chat service")
}

fn report_ingest(output: &Output, report: &IngestReport) {
    if report.skipped {
        output.info("Index already contains data; nothing to do (use --reindex to rebuild)");
    } else if report.indexed == 0 {
        output.warning("No text was indexed; check the document file");
    } else {
        output.success(&format!(
            "Indexed {} chunks from {} documents",
            report.indexed, report.documents
        ));
    }
}

async fn serve(
    mut config: RagdeskConfig,
    output: &Output,
    host: Option<String>,
    port: Option<u16>,
    no_ingest: bool,
) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    output.banner();
    output.step(1, 3, "Connecting providers and opening the index");
    let service = build_service(&config).await?;

    if no_ingest {
        output.step(2, 3, "Skipping document ingestion");
    } else {
        output.step(2, 3, "Indexing documents");
        match service.initialize_data().await {
            Ok(report) => report_ingest(output, &report),
            Err(e) => {
                warn!(error = %e, "Ingestion failed, serving with the existing index");
                output.warning(&format!("Ingestion failed: {}", e));
            }
        }
    }

    let address = config.bind_address();
    let state = AppState {
        config: Arc::new(config),
        chat: Arc::new(service),
    };
    let app = crate::api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    output.step(3, 3, &format!("Listening on http://{}", address));
    info!(%address, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

async fn ingest(
    config: &RagdeskConfig,
    output: &Output,
    file: Option<&Path>,
    reindex: bool,
) -> Result<()> {
    let service = build_service(config).await?;
    let path = file
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.data.documents_file.clone().into());

    output.info(&format!("Reading documents from {}", path.display()));
    let source = JsonDocumentSource::new(&path);
    let report = service
        .ingest_from(&source, reindex)
        .await
        .context("Ingestion failed")?;
    report_ingest(output, &report);
    Ok(())
}

async fn ask(config: &RagdeskConfig, output: &Output, question: &str, use_context: bool) -> Result<()> {
    let service = build_service(config).await?;
    let response = service.respond(None, question, use_context).await;

    output.answer(&response.response);
    output.sources(&response.sources);
    if let Some(error) = response.error {
        output.warning(&error);
    }
    Ok(())
}

async fn chat(config: &RagdeskConfig, output: &Output, use_context: bool) -> Result<()> {
    let service = build_service(config).await?;
    let session_id = uuid::Uuid::new_v4().to_string();

    output.banner();
    output.header("Suggested questions");
    for question in service.suggested_questions() {
        output.list_item(question);
    }
    output.hint("Type /history to show the conversation, /clear to reset it, /exit to quit.");

    loop {
        let Some(line) = output.prompt("you") else {
            break;
        };

        match line.as_str() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                service.clear_history(&session_id).await;
                output.success("Conversation cleared");
            }
            "/history" => {
                let turns = service.history(&session_id).await;
                if turns.is_empty() {
                    output.info("No messages yet");
                }
                for turn in &turns {
                    output.turn(turn);
                }
            }
            question => {
                let response = service
                    .respond(Some(session_id.clone()), question, use_context)
                    .await;
                output.answer(&response.response);
                output.sources(&response.sources);
                if let Some(error) = response.error {
                    output.warning(&error);
                }
            }
        }
    }

    output.newline();
    Ok(())
}

async fn search(config: &RagdeskConfig, output: &Output, query: &str, k: usize) -> Result<()> {
    let service = build_service(config).await?;
    let results = service
        .search_documents(query, Some(k))
        .await
        .context("Search failed")?;

    output.header(&format!("Results for \"{}\"", query));
    if results.is_empty() {
        output.info("No matching passages (is the index empty?)");
    }
    for result in &results {
        output.search_hit(result);
    }
    Ok(())
}

async fn stats(config: &RagdeskConfig, output: &Output) -> Result<()> {
    let service = build_service(config).await?;
    let stats = service.index_stats().await.context("Failed to read index statistics")?;

    output.header("Index");
    output.kv("provider", &stats.provider);
    output.kv("collection", &stats.collection_name);
    output.kv("entries", &stats.total_entries.to_string());
    output.kv(
        "dimensions",
        &stats
            .dimensions
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string()),
    );
    output.kv("embedding model", &stats.embedding_model);
    Ok(())
}

async fn clear(config: &RagdeskConfig, output: &Output, yes: bool) -> Result<()> {
    if !yes && !output.confirm("Remove every entry from the index?") {
        output.info("Aborted");
        return Ok(());
    }

    let service = build_service(config).await?;
    service.clear_index().await.context("Failed to clear the index")?;
    output.success("Index cleared");
    Ok(())
}

fn show_config(path: &Path, config: &RagdeskConfig, output: &Output, validate: bool) -> Result<()> {
    output.header("Configuration");
    output.kv("file", &path.display().to_string());
    output.kv("server", &config.bind_address());
    output.kv(
        "llm",
        &format!("{:?} / {}", config.llm.provider, config.llm.model),
    );
    output.kv("temperature", &config.llm.temperature.to_string());
    output.kv("max tokens", &config.llm.max_tokens.to_string());
    output.kv(
        "embeddings",
        &format!("{:?} / {}", config.embeddings.provider, config.embeddings.model),
    );
    output.kv(
        "index",
        &format!(
            "{} @ {}",
            config.index.collection,
            config.index.persist_directory.as_deref().unwrap_or("(memory)")
        ),
    );
    output.kv(
        "chunking",
        &format!("{} / overlap {}", config.rag.chunk_size, config.rag.chunk_overlap),
    );
    output.kv(
        "retrieval",
        &format!(
            "top {} within {} tokens",
            config.rag.context_top_k, config.rag.max_context_tokens
        ),
    );
    output.kv("documents", &config.data.documents_file);
    output.kv("feedback", &config.data.feedback_file);

    if validate {
        config.validate().context("Invalid configuration")?;
        config
            .validate_secrets()
            .context("Missing credentials")?;
        output.success("Configuration is valid");
    }
    Ok(())
}
