use std::sync::Arc;

use clap::Parser;
use docstyle::{
    ChunkStore,
    ConfigDb,
    DataDir,
    DocumentIngestor,
    Error,
    HardwareProfile,
    HashingEmbedder,
    Result,
    StyleQueryEngine,
    cli::{self, Cli, Command, ConfigAction, EmbedderKind, SettingKey},
    config_db::{COLLECTION_KEY, MODEL_NAME_KEY, THROUGHPUT_KEY},
    embedding::Embedder,
    ingestion,
    media::MediaStore,
    model_manager::{
        ColbertEmbedder,
        DEFAULT_MODEL_ID,
        MODEL_ENV_VAR,
        ModelManager,
    },
    walker,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("DOCSTYLE_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let config_db = ConfigDb::open(&data_dir.config_db())?;
    let collection = match &cli.collection {
        Some(name) => name.clone(),
        None => config_db.default_collection()?,
    };

    match &cli.command {
        Command::Calibrate(args) => {
            return cmd_calibrate(&config_db, args.tokens_per_second);
        }
        Command::Config { action } => {
            let model = resolve_model_id(cli.model.clone(), &config_db)?;
            return cmd_config(&config_db, action, &collection, &model);
        }
        _ => {}
    }

    let embedder = build_embedder(cli.embedder, cli.model.clone(), &config_db)?;
    let store = ChunkStore::open(&data_dir.store_db(), &collection, embedder)?;
    let profile = current_profile(&config_db)?;

    match cli.command {
        Command::Ingest(args) => {
            let media = MediaStore::open(&data_dir.media_dir()?)?;
            cmd_ingest(&DocumentIngestor::new(media), &store, &args)?;
        }
        Command::Search(args) => {
            let engine = StyleQueryEngine::new(&store, profile.limits());
            cmd_search(&engine, &args)?;
        }
        Command::Reference(args) => {
            let engine = StyleQueryEngine::new(&store, profile.limits());
            cmd_reference(&engine, &args)?;
        }
        Command::Remove(args) => cmd_remove(&store, &args.document)?,
        Command::List(args) => cmd_list(&store, args.json)?,
        Command::Status(args) => {
            cmd_status(&data_dir, &store, &profile, args.json)?;
        }
        Command::Calibrate(_)
        | Command::Config { .. }
        | Command::Completions(_) => {}
    }

    Ok(())
}

/// Model id from `--model`, then `DOCSTYLE_MODEL`, then the stored
/// setting, then the built-in default.
fn resolve_model_id(
    model: Option<String>,
    config_db: &ConfigDb,
) -> Result<String> {
    match model.or_else(|| std::env::var(MODEL_ENV_VAR).ok()) {
        Some(id) => Ok(id),
        None => config_db.get_setting_or(MODEL_NAME_KEY, DEFAULT_MODEL_ID),
    }
}

fn build_embedder(
    kind: EmbedderKind,
    model: Option<String>,
    config_db: &ConfigDb,
) -> Result<Arc<dyn Embedder>> {
    Ok(match kind {
        EmbedderKind::Hashing => Arc::new(HashingEmbedder::default()),
        EmbedderKind::Colbert => {
            let model_id = resolve_model_id(model, config_db)?;
            let manager = ModelManager::with_model_id(model_id);
            Arc::new(ColbertEmbedder::new(manager))
        }
    })
}

fn current_profile(config_db: &ConfigDb) -> Result<HardwareProfile> {
    let detected = HardwareProfile::detect();
    Ok(match config_db.throughput()? {
        Some(tps) => detected.with_benchmark(tps),
        None => detected,
    })
}

fn cmd_ingest(
    ingestor: &DocumentIngestor,
    store: &ChunkStore,
    args: &cli::IngestArgs,
) -> Result<()> {
    let mut files = Vec::new();
    for path in &args.paths {
        files.extend(walker::discover_files(path)?);
    }

    if files.is_empty() {
        eprintln!("No .docx files found.");
        return Ok(());
    }

    let outcomes =
        ingestion::ingest_files(ingestor, store, &files, args.replace);
    for outcome in &outcomes {
        match &outcome.result {
            Ok(count) => {
                eprintln!("  {}: {count} paragraphs", outcome.document);
            }
            Err(e) if ingestion::is_duplicate(outcome) => {
                eprintln!("  {}: {e} (use --replace)", outcome.document);
            }
            Err(e) => eprintln!("  {}: failed: {e}", outcome.document),
        }
    }

    let failed = ingestion::failures(&outcomes);
    eprintln!(
        "Ingested {} of {} documents into '{}'.",
        outcomes.len() - failed,
        outcomes.len(),
        store.collection()
    );
    ingestion::batch_result(&outcomes)?;
    Ok(())
}

fn cmd_search(
    engine: &StyleQueryEngine<'_>,
    args: &cli::SearchArgs,
) -> Result<()> {
    let hits = engine.search(&args.query, args.count)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if hits.is_empty() {
        println!("No results.");
    } else {
        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "{}. [{:.3}] {} #{} ({})",
                rank + 1,
                hit.score,
                hit.metadata.source_document,
                hit.metadata.source_index,
                hit.metadata.style_name
            );
            for line in hit.rich_content.lines() {
                println!("    {line}");
            }
        }
    }
    Ok(())
}

fn cmd_reference(
    engine: &StyleQueryEngine<'_>,
    args: &cli::ReferenceArgs,
) -> Result<()> {
    let palette = engine.search_style_reference(&args.query)?.ok_or_else(|| {
        Error::NotFound {
            kind: "reference document",
            name: args.query.clone(),
        }
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&palette.to_reference())?);
    } else {
        println!("{}", palette.full_context());
    }
    Ok(())
}

fn cmd_remove(store: &ChunkStore, document: &str) -> Result<()> {
    let removed = store.remove_document(document)?;
    if removed == 0 {
        return Err(Error::NotFound {
            kind: "document",
            name: document.to_string(),
        });
    }
    println!("Removed '{document}' ({removed} paragraphs)");
    Ok(())
}

fn cmd_list(store: &ChunkStore, json: bool) -> Result<()> {
    let documents = store.list_documents()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
    } else if documents.is_empty() {
        println!("No documents in '{}'.", store.collection());
    } else {
        for doc in &documents {
            println!(
                "{}\t{} paragraphs\t{} headers",
                doc.name, doc.paragraphs, doc.headers
            );
        }
    }
    Ok(())
}

fn cmd_calibrate(config_db: &ConfigDb, tokens_per_second: f64) -> Result<()> {
    config_db.set_throughput(tokens_per_second)?;
    let profile = HardwareProfile::detect().with_benchmark(tokens_per_second);
    let limits = profile.limits();
    println!(
        "Recorded {tokens_per_second} tokens/s ({} mode): \
         {} examples, {} candidates",
        if profile.low_power { "low-power" } else { "high-power" },
        limits.max_examples,
        limits.retrieval_limit
    );
    Ok(())
}

fn setting_key(key: SettingKey) -> &'static str {
    match key {
        SettingKey::Model => MODEL_NAME_KEY,
        SettingKey::Collection => COLLECTION_KEY,
        SettingKey::Throughput => THROUGHPUT_KEY,
    }
}

fn cmd_config(
    config_db: &ConfigDb,
    action: &ConfigAction,
    collection: &str,
    model: &str,
) -> Result<()> {
    match action {
        ConfigAction::Show { json } => {
            let stored = config_db.list_settings()?;
            let throughput = config_db.throughput()?;
            if *json {
                let stored: serde_json::Map<_, _> = stored
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                let config = json!({
                    "stored": stored,
                    "collection": collection,
                    "model": model,
                    "throughput_tps": throughput,
                });
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Collection: {collection}");
                println!("Model: {model}");
                match throughput {
                    Some(tps) => println!("Throughput: {tps} tokens/s"),
                    None => println!("Throughput: not calibrated"),
                }
                for (key, value) in &stored {
                    println!("  {key} = {value}");
                }
            }
        }
        ConfigAction::Set { key, value } => {
            match key {
                SettingKey::Model => {
                    config_db.set_setting(MODEL_NAME_KEY, value)?;
                }
                SettingKey::Collection => {
                    config_db.set_default_collection(value)?;
                }
                SettingKey::Throughput => {
                    let tps = value.parse().map_err(|_| {
                        Error::Config(format!("invalid throughput '{value}'"))
                    })?;
                    config_db.set_throughput(tps)?;
                }
            }
            println!("Set {} = {value}", setting_key(*key));
        }
        ConfigAction::Clear { key } => {
            let name = setting_key(*key);
            if config_db.remove_setting(name)? {
                println!("Cleared {name}");
            } else {
                println!("{name} was not set");
            }
        }
    }
    Ok(())
}

fn cmd_status(
    data_dir: &DataDir,
    store: &ChunkStore,
    profile: &HardwareProfile,
    json: bool,
) -> Result<()> {
    let entries = store.len()?;
    let documents = store.list_documents()?.len();
    let limits = profile.limits();

    if json {
        let status = json!({
            "data_dir": data_dir.root(),
            "collection": store.collection(),
            "embedder": store.embedder_name(),
            "documents": documents,
            "entries": entries,
            "profile": profile,
            "limits": limits,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("Data directory: {}", data_dir.root().display());
        println!("Collection: {}", store.collection());
        println!("Embedder: {}", store.embedder_name());
        println!("Documents: {documents}");
        println!("Paragraphs: {entries}");
        println!(
            "Profile: {} ({} cores, {:.1} tokens/s)",
            if profile.low_power { "low-power" } else { "high-power" },
            profile.cores,
            profile.tokens_per_second
        );
        println!(
            "Limits: {} examples, {} candidates, {} context",
            limits.max_examples, limits.retrieval_limit, limits.context_window
        );
    }
    Ok(())
}
