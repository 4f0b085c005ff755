//! `cfield` - CLI for contentfield
//!
//! This binary provides the command-line interface for inspecting and
//! editing content values stored as JSON files.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use clap::Parser;
use serde_json::json;
use tracing::warn;

use contentfield::cli::{
    apply_at, CheckCommand, Cli, Command, ConfigCommand, InferCommand, ListCommand, MediaCommand,
    OutputFormat, RenderCommand, UploadCommand,
};
use contentfield::editor::RawEditor;
use contentfield::upload::UploadKind;
use contentfield::{
    init_logging, Config, Dispatcher, EditSession, EditorOptions, Item, ListDocument, ListStore,
    LocalUploader, MediaLibrary, Schema, Section, UploadFile, Uploader,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() -> CliResult {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Infer(cmd) => handle_infer(&config, &cmd),
        Command::Render(cmd) => handle_render(&config, &cmd),
        Command::Check(cmd) => handle_check(&cmd),
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Upload(cmd) => handle_upload(&config, cmd),
        Command::Media(cmd) => handle_media(&config, cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn handle_infer(config: &Config, cmd: &InferCommand) -> CliResult {
    let options = EditorOptions::from_config(config)?;
    let document = ListDocument::load(&cmd.file)?;
    let schema = options.inferencer.infer(&document.items);

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schema)?),
        OutputFormat::Plain => {
            if document.schema.is_some() {
                println!("# file carries a saved schema; showing the inferred one");
            }
            print_schema(&schema, 0);
        }
    }
    Ok(())
}

fn print_schema(schema: &Schema, indent: usize) {
    let pad = "  ".repeat(indent);
    for field in schema.fields() {
        println!("{pad}{}: {}", field.key, field.field_type);
        if let Some(item_schema) = &field.item_schema {
            print_schema(item_schema, indent + 1);
        }
    }
}

fn handle_render(config: &Config, cmd: &RenderCommand) -> CliResult {
    let options = EditorOptions::from_config(config)?;
    let dispatcher = Dispatcher::from_options(&options);
    let section = Section::load(&cmd.section)?;

    let components: Vec<_> = section
        .components
        .iter()
        .filter(|c| cmd.component.as_ref().map_or(true, |name| &c.name == name))
        .collect();
    if components.is_empty() {
        if let Some(name) = &cmd.component {
            return Err(format!("section '{}' has no component '{name}'", section.name).into());
        }
    }

    match cmd.format {
        OutputFormat::Json => {
            let rendered: Vec<_> = components
                .iter()
                .map(|c| {
                    json!({
                        "name": c.name,
                        "type": c.kind,
                        "widget": dispatcher.render_component(c),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rendered)?);
        }
        OutputFormat::Plain => {
            println!("{}", section.name);
            println!("{}", "=".repeat(section.name.chars().count().max(1)));
            for component in components {
                println!();
                println!("[{}] ({})", component.name, component.kind);
                println!("{}", dispatcher.render_component(component));
            }
        }
    }
    Ok(())
}

fn handle_check(cmd: &CheckCommand) -> CliResult {
    let text = read_text(&cmd.file)?;
    let mut editor = RawEditor::new(serde_json::Value::Null);
    if editor.set_source(text) {
        let value = editor.to_field_value();
        println!(
            "{}: valid JSON ({}, nesting depth {})",
            cmd.file.display(),
            value.shape(),
            value.depth()
        );
        Ok(())
    } else {
        let message = editor.error().unwrap_or("Invalid JSON");
        Err(format!("{}: {message}", cmd.file.display()).into())
    }
}

fn handle_list(config: &Config, cmd: &ListCommand) -> CliResult {
    let options = EditorOptions::from_config(config)?;
    let document = ListDocument::load(&cmd.file)?;
    let mut store = ListStore::from_document(document, options);

    let summary = apply_at(&mut store, &cmd.at, &cmd.op)?;
    let output = store.to_document().to_json_pretty()?;

    if cmd.dry_run {
        println!("{output}");
        eprintln!("{summary} (dry run, nothing written)");
    } else {
        write_text(&cmd.file, &output)?;
        println!("{summary}");
    }
    Ok(())
}

fn handle_upload(config: &Config, cmd: UploadCommand) -> CliResult {
    let runtime = tokio::runtime::Runtime::new()?;
    let library = MediaLibrary::open(config.database_path())?;
    let uploader = LocalUploader::from_config(config).with_library(library);

    let mut file = runtime.block_on(UploadFile::read(&cmd.file))?;
    if let Some(mimetype) = cmd.mimetype {
        file = file.with_mimetype(mimetype);
    }

    let (Some(list_path), Some(index), Some(key)) = (cmd.into, cmd.item, cmd.key) else {
        let uploaded = runtime.block_on(uploader.upload(file))?;
        println!("{}", uploaded.url);
        return Ok(());
    };

    let options = EditorOptions::from_config(config)?;
    let document = ListDocument::load(&list_path)?;
    let store = ListStore::from_document(document, options);
    let mut session = EditSession::new(store, |_: &[Item]| {});

    let notice = runtime.block_on(session.upload_into(index, &key, &uploader, file));
    if !notice.is_success() {
        return Err(notice.message().into());
    }

    let output = session.into_store().to_document().to_json_pretty()?;
    write_text(&list_path, &output)?;
    println!("{}", notice.message());
    Ok(())
}

fn handle_media(config: &Config, cmd: MediaCommand) -> CliResult {
    let library = MediaLibrary::open(config.database_path())?;

    match cmd {
        MediaCommand::List {
            kind,
            search,
            limit,
            format,
        } => {
            let kind: Option<UploadKind> = kind.map(Into::into);
            let records = match (search, kind) {
                (Some(query), kind) => {
                    let mut found = library.search(&query, limit)?;
                    if let Some(kind) = kind {
                        found.retain(|r| r.kind == kind);
                    }
                    found
                }
                (None, Some(kind)) => library.list_by_kind(kind, limit)?,
                (None, None) => library.list_recent(limit)?,
            };

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
                OutputFormat::Plain => {
                    if records.is_empty() {
                        println!("No media files.");
                    }
                    for record in &records {
                        println!(
                            "{:>5}  {:<8}  {:>10}  {}  {}",
                            record.id.unwrap_or_default(),
                            record.kind.to_string(),
                            record.size,
                            record.url,
                            record.original_name
                        );
                    }
                }
            }
        }
        MediaCommand::Stats { json } => {
            let stats = library.stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let when = |dt: Option<chrono::DateTime<chrono::Utc>>| {
                    dt.map_or_else(|| "-".to_string(), |dt| dt.to_rfc3339())
                };
                println!("Media Library");
                println!("=============");
                println!("  Database:    {}", library.path().display());
                println!("  Files:       {}", stats.total_files);
                println!("  Total size:  {} bytes", stats.total_bytes);
                println!("  Oldest:      {}", when(stats.oldest));
                println!("  Newest:      {}", when(stats.newest));
                println!("  DB size:     {} bytes", stats.db_size_bytes);
            }
        }
        MediaCommand::Delete { id, keep_file } => {
            let Some(record) = library.delete(id)? else {
                return Err(format!("no media file with id {id}").into());
            };
            if !keep_file {
                let path = config.media_dir().join(&record.filename);
                match std::fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        warn!(path = %path.display(), "Stored file already gone");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            println!("Deleted {} ({})", record.original_name, record.url);
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> CliResult {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Inference]");
                println!(
                    "  Long text threshold: {}",
                    config.inference.long_text_threshold
                );
                println!();
                println!("[Editor]");
                println!("  Max depth:           {}", config.editor.max_depth);
                println!("  Key pattern:         {}", config.editor.key_pattern);
                println!("  Field prefix:        {}", config.editor.field_prefix);
                println!();
                println!("[Upload]");
                println!("  Media dir:           {}", config.media_dir().display());
                println!("  Base URL:            {}", config.upload.base_url);
                println!("  Max size (bytes):    {}", config.upload.max_size_bytes);
                println!(
                    "  Allowed types:       {}",
                    config.upload.allowed_mimetypes.join(", ")
                );
                println!();
                println!("[Media]");
                println!("  Database path:       {}", config.database_path().display());
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
                Err(e) => return Err(format!("Configuration error: {e}").into()),
            }
        }
    }
    Ok(())
}

fn read_text(path: &Path) -> Result<String, contentfield::Error> {
    std::fs::read_to_string(path).map_err(|source| contentfield::Error::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn write_text(path: &Path, text: &str) -> Result<(), contentfield::Error> {
    std::fs::write(path, format!("{text}\n"))?;
    Ok(())
}
