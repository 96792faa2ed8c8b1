use std::io::BufRead;
use std::path::{Path, PathBuf};

use mnemo::cli::{Cli, Commands, ConfigAction};
use mnemo::config::Config;
use mnemo::document::Document;
use mnemo::error::{MnemoError, Result};
use mnemo::retrieval::{HybridSearcher, SearchResult, SearchStrategy};
use mnemo::storage::DocumentStore;

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Add { file, source } => {
            cmd_add(cli.config, &file, source)?;
        }
        Commands::Search { query, limit, json } => {
            cmd_search(cli.config, &query, limit, json)?;
        }
        Commands::Keyword { query, limit, json } => {
            cmd_keyword(cli.config, &query, limit, json)?;
        }
        Commands::Stats => {
            cmd_stats(cli.config)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mnemo=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn cmd_add(config_path: Option<PathBuf>, file: &Path, source: Option<String>) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let store = DocumentStore::from_config(&config)?;

    let documents = read_documents(file, source)?;
    let total = documents.len();
    let inserted = store.add_documents(&documents)?;

    println!("✓ Added {} of {} documents", inserted, total);
    if inserted < total {
        println!("  ({} dropped by the admission filter)", total - inserted);
    }
    Ok(())
}

fn cmd_search(config_path: Option<PathBuf>, query: &str, limit: usize, json: bool) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let store = DocumentStore::from_config(&config)?;
    let response = HybridSearcher::new(&store).search(query, limit)?;

    if json {
        let output =
            serde_json::to_string_pretty(&response).map_err(|e| MnemoError::Json {
                source: e,
                context: "Failed to serialize search response".to_string(),
            })?;
        println!("{}", output);
        return Ok(());
    }

    if response.results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    match response.strategy {
        SearchStrategy::StrongMatch => println!("\n✓ Top semantic matches:\n"),
        SearchStrategy::Keyword => {
            println!("\nNo strong conceptual matches, but found these mentions:\n")
        }
        SearchStrategy::WeakMatch => println!("\n⚠ Low confidence / related concepts:\n"),
        SearchStrategy::NoResults => unreachable!("no_results always carries empty results"),
    }

    for result in &response.results {
        print_result(result);
    }
    Ok(())
}

fn cmd_keyword(config_path: Option<PathBuf>, query: &str, limit: usize, json: bool) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let store = DocumentStore::from_config(&config)?;
    let results = store.search_keyword(query, limit)?;

    if json {
        let output = serde_json::to_string_pretty(&results).map_err(|e| MnemoError::Json {
            source: e,
            context: "Failed to serialize keyword results".to_string(),
        })?;
        println!("{}", output);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    for result in &results {
        print_result(result);
    }
    Ok(())
}

fn cmd_stats(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let store = DocumentStore::from_config(&config)?;
    let stats = store.stats()?;

    println!("Mnemo Store");
    println!("===========");
    println!("Documents: {}", stats.document_count);
    println!("Vectors:   {}", stats.vector_count);
    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            let config = Config::default();
            config.save(&path)?;
            println!("✓ Configuration initialized at: {}", path.display());
        }
        ConfigAction::Show => {
            let config = Config::load_or_default(config_path)?;
            let output = toml::to_string_pretty(&config)?;
            println!("{}", output);
        }
    }
    Ok(())
}

/// Read a batch of documents from a JSONL file (one JSON object per line)
fn read_documents(file: &Path, source: Option<String>) -> Result<Vec<Document>> {
    let reader = std::fs::File::open(file).map_err(|e| MnemoError::Io {
        source: e,
        context: format!("Failed to open document file: {:?}", file),
    })?;

    let mut documents = Vec::new();
    for (line_no, line) in std::io::BufReader::new(reader).lines().enumerate() {
        let line = line.map_err(|e| MnemoError::Io {
            source: e,
            context: format!("Failed to read {:?} at line {}", file, line_no + 1),
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let mut doc: Document = serde_json::from_str(&line).map_err(|e| MnemoError::Json {
            source: e,
            context: format!("Invalid document in {:?} at line {}", file, line_no + 1),
        })?;
        if let Some(source) = &source {
            doc.source = source.clone();
        }
        documents.push(doc);
    }
    Ok(documents)
}

fn print_result(result: &SearchResult) {
    let score_display = match result.distance {
        Some(distance) => format!("[Score: {:.4}] ", distance),
        None => String::new(),
    };

    let mut meta_info = Vec::new();
    if let Some(channel) = result.metadata.get("channel_name").and_then(|v| v.as_str()) {
        meta_info.push(format!("#{}", channel));
    }
    let user = result
        .metadata
        .get("user_real_name")
        .or_else(|| result.metadata.get("user"))
        .and_then(|v| v.as_str());
    if let Some(user) = user {
        meta_info.push(format!("@{}", user));
    }
    if let Some(ts) = result.metadata.get("ts").and_then(|v| v.as_str()) {
        meta_info.push(format!("TS:{}", ts));
    }

    let meta_str = if meta_info.is_empty() {
        String::new()
    } else {
        format!(" ({})", meta_info.join(" | "))
    };

    println!("{}Source: {}{}", score_display, result.source, meta_str);
    println!("{}", result.content.trim());
    println!("{}", "-".repeat(40));
}
