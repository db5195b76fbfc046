//! `casebook` - CLI for the casebook record manager
//!
//! This binary provides the command-line interface for adding, editing,
//! searching, importing and exporting case records.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use tracing::debug;

use casebook::cli::{
    AddCommand, Cli, Command, ConfigCommand, EditCommand, ExportCommand, ListCommand,
    OutputFormat, StatsCommand, WatchCommand,
};
use casebook::{
    codec, init_logging, query, Config, Record, RecordDraft, RecordStore, SqliteBackend,
    Statistics, StoreWatcher,
};

type Store = RecordStore<SqliteBackend>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config =
        Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::List(cmd) => handle_list(&open_store(&config)?, &cmd),
        Command::Show(cmd) => handle_show(&open_store(&config)?, &cmd.id, cmd.json),
        Command::Add(cmd) => handle_add(&mut open_store(&config)?, cmd),
        Command::Edit(cmd) => handle_edit(&mut open_store(&config)?, cmd),
        Command::Delete(cmd) => {
            if open_store(&config)?.delete(&cmd.id)? {
                println!("Deleted {}", cmd.id);
            } else {
                println!("No record with id {}", cmd.id);
            }
            Ok(())
        }
        Command::Import(cmd) => {
            let document = codec::read_document(&cmd.file)
                .await
                .with_context(|| format!("failed to read {}", cmd.file.display()))?;
            let count = codec::import_into(&mut open_store(&config)?, &document)?;
            println!("Imported {count} records");
            Ok(())
        }
        Command::Export(cmd) => handle_export(&config, &open_store(&config)?, cmd).await,
        Command::Clear(cmd) => {
            if !cmd.yes {
                println!("This will delete every record.");
                println!("Use --yes to confirm.");
                return Ok(());
            }
            open_store(&config)?.clear()?;
            println!("All records deleted");
            Ok(())
        }
        Command::Stats(cmd) => handle_stats(&open_store(&config)?, &cmd),
        Command::Dump(cmd) => {
            let diagnostics = open_store(&config)?.diagnostic_dump();
            if cmd.json {
                println!("{}", serde_json::to_string_pretty(&diagnostics)?);
            } else {
                println!("Storage key:   {}", diagnostics.storage_key);
                println!("Records:       {}", diagnostics.record_count);
                println!("Storage bytes: {}", diagnostics.storage_bytes);
                println!("Revision:      {}", diagnostics.revision);
                println!("Corrupt:       {}", diagnostics.corrupt);
                if let (Some(id), Some(name)) =
                    (&diagnostics.first_record_id, &diagnostics.first_record_name)
                {
                    println!("First record:  {id} ({name})");
                }
            }
            Ok(())
        }
        Command::Watch(cmd) => handle_watch(&config, &cmd).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_backend(config: &Config) -> anyhow::Result<SqliteBackend> {
    let path = config.database_path();
    let backend = SqliteBackend::open(&path)
        .with_context(|| format!("failed to open record database at {}", path.display()))?;
    Ok(backend.with_quota(config.storage.quota_bytes))
}

fn open_store(config: &Config) -> anyhow::Result<Store> {
    let mut store = RecordStore::from_config(open_backend(config)?, config);
    store.init()?;
    Ok(store)
}

fn handle_list(store: &Store, cmd: &ListCommand) -> anyhow::Result<()> {
    let records = query::apply(
        &store.get_all(),
        &cmd.search,
        cmd.sort.into(),
        &cmd.category,
    );
    debug!(count = records.len(), "Query matched records");

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Plain => {
            for r in &records {
                println!("{}\t{}\t{}\t{}", r.id, r.name, r.phone, category_label(r));
            }
        }
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No records found.");
                return Ok(());
            }
            println!(
                "{:<36}  {:<24}  {:<16}  {:<14}  TAGS",
                "ID", "NAME", "PHONE", "CATEGORY"
            );
            for r in &records {
                println!(
                    "{:<36}  {:<24}  {:<16}  {:<14}  {}",
                    r.id,
                    truncate(&r.name, 24),
                    r.phone,
                    category_label(r),
                    r.tags.iter().collect::<Vec<_>>().join(", ")
                );
            }
        }
    }
    Ok(())
}

fn handle_show(store: &Store, id: &str, json: bool) -> anyhow::Result<()> {
    let Some(record) = store.get_by_id(id) else {
        bail!("no record with id {id}");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(());
    }

    println!("Id:        {}", record.id);
    println!("Name:      {}", record.name);
    println!("Phone:     {}", record.phone);
    println!("Category:  {}", category_label(&record));
    println!("Tags:      {}", record.tags.iter().collect::<Vec<_>>().join(", "));
    println!("Created:   {}", format_created(&record));
    println!("Photo:     {}", if record.has_image() { "yes" } else { "no" });
    println!();
    println!("{}", record.case_details);
    Ok(())
}

fn handle_add(store: &mut Store, cmd: AddCommand) -> anyhow::Result<()> {
    let mut draft = RecordDraft::new(cmd.name, cmd.phone, cmd.details);
    draft.category = cmd.category;
    draft.image = cmd.image;
    for tag in &cmd.tags {
        draft.add_tag(tag);
    }

    let id = uuid::Uuid::new_v4().to_string();
    let record = draft.submit_new(id)?;
    store.add(record.clone())?;

    let image_dropped = record.has_image()
        && store
            .get_by_id(&record.id)
            .is_some_and(|saved| !saved.has_image());
    if image_dropped {
        eprintln!("Warning: photo dropped to fit the storage quota");
    }
    println!("{}", record.id);
    Ok(())
}

fn handle_edit(store: &mut Store, cmd: EditCommand) -> anyhow::Result<()> {
    let Some(existing) = store.get_by_id(&cmd.id) else {
        bail!("no record with id {}", cmd.id);
    };

    let mut draft = RecordDraft::from_record(&existing);
    if let Some(name) = cmd.name {
        draft.name = name;
    }
    if let Some(phone) = cmd.phone {
        draft.phone = phone;
    }
    if let Some(details) = cmd.details {
        draft.case_details = details;
    }
    if cmd.clear_category {
        draft.category = None;
    } else if let Some(category) = cmd.category {
        draft.category = Some(category);
    }
    for tag in &cmd.tags {
        draft.add_tag(tag);
    }
    for tag in &cmd.untag {
        draft.remove_tag(tag);
    }
    if cmd.clear_image {
        draft.image = Some(String::new());
    } else if let Some(image) = cmd.image {
        draft.image = Some(image);
    }

    store.update(draft.submit_edit(existing.id)?)?;
    println!("Updated {}", cmd.id);
    Ok(())
}

async fn handle_export(config: &Config, store: &Store, cmd: ExportCommand) -> anyhow::Result<()> {
    let records = store.get_all();
    if cmd.stdout {
        println!("{}", codec::export(&records)?);
        return Ok(());
    }

    let dir = cmd.dir.unwrap_or_else(|| config.export_dir());
    let path = codec::write_export(&dir, &records, Utc::now().date_naive()).await?;
    println!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

fn handle_stats(store: &Store, cmd: &StatsCommand) -> anyhow::Result<()> {
    let stats = Statistics::compute(
        &store.get_all(),
        cmd.range.into(),
        Utc::now().timestamp_millis(),
    );

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Records ({}): {}", stats.range, stats.total);
    println!("Distinct tags: {}", stats.distinct_tags);
    println!();
    println!("[Categories]");
    for c in &stats.categories {
        println!("  {:<16} {}", c.name, c.count);
    }
    println!();
    println!("[Top tags]");
    for t in &stats.top_tags {
        println!("  {:<16} {}", t.name, t.count);
    }
    println!();
    println!("[Timeline]");
    for d in &stats.timeline {
        println!("  {}  {}", d.name, d.count);
    }
    println!();
    println!("[Recent]");
    for r in &stats.recent {
        println!("  {}  {}  {}", format_created(r), r.name, category_label(r));
    }
    Ok(())
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> anyhow::Result<()> {
    let interval = cmd
        .interval
        .map_or_else(|| config.poll_interval(), std::time::Duration::from_millis);
    let store = open_store(config)?;
    let watcher = StoreWatcher::new(open_backend(config)?, interval)?;
    let (handle, mut rx, task) = watcher.spawn();

    println!(
        "Watching {} ({} records). Press Ctrl-C to stop.",
        config.database_path().display(),
        store.count()
    );

    loop {
        tokio::select! {
            change = rx.recv() => {
                let Some(change) = change else { break };
                println!(
                    "[{}] store changed (revision {}), {} records",
                    change.origin,
                    change.revision.unwrap_or_default(),
                    store.count()
                );
            }
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    handle.stop();
    task.await.context("watcher task failed")?;
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Storage key:        {}", config.storage.storage_key);
                println!("  Quota (bytes):      {}", config.storage.quota_bytes);
                println!();
                println!("[Notify]");
                println!("  Cross-view signal:  {}", config.notify.cross_view);
                println!("  Poll interval (ms): {}", config.notify.poll_interval_ms);
                println!();
                println!("[Export]");
                println!("  Directory:          {}", config.export_dir().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn category_label(record: &Record) -> &str {
    record.category.as_ref().map_or("-", |c| c.label())
}

fn format_created(record: &Record) -> String {
    record
        .created_at
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map_or_else(
            || "Unknown date".to_string(),
            |t| t.format("%Y-%m-%d %H:%M").to_string(),
        )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
