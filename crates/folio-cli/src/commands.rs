use anyhow::{bail, Context};
use colored::Colorize;
use folio_models::{import_book_crossing, schema_for, Catalog};
use folio_store::{
    FieldType, Record, RecordStore, Registry, Schema, StoreConfig, Table, Value,
};
use std::sync::Arc;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let mut config = StoreConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let format = cli.format;
    debug!(data_dir = %config.data_dir.display(), sync_writes = config.sync_writes, "configuration loaded");

    match cli.command {
        Command::Tables => cmd_tables(config, format),
        Command::Dump(args) => cmd_dump(config, args, format),
        Command::Get(args) => cmd_get(config, args, format),
        Command::Search(args) => cmd_search(config, args, format),
        Command::Drop(args) => cmd_drop(config, args),
        Command::ImportBooks(args) => cmd_import_books(config, args, format),
        Command::CacheInfo => cmd_cache_info(config, format),
    }
}

fn open_table(registry: &Registry, name: &str) -> anyhow::Result<Arc<Table>> {
    let Some(schema) = schema_for(name) else {
        bail!("unknown table {name:?}");
    };
    Ok(registry.table(schema)?)
}

/// Interpret a command-line key according to the primary-key type.
fn parse_key(schema: &Schema, raw: &str) -> anyhow::Result<Value> {
    let field = schema.primary_key_field();
    Ok(match field.ty.inner() {
        FieldType::Integer => Value::Integer(
            raw.parse()
                .with_context(|| format!("{} is an integer key", field.name))?,
        ),
        _ => Value::from(raw),
    })
}

fn record_json(schema: &Schema, record: &Record) -> serde_json::Value {
    serde_json::Value::Object(
        schema
            .field_names()
            .zip(record.values())
            .map(|(name, value)| (name.to_string(), value.to_json()))
            .collect(),
    )
}

fn print_record(schema: &Schema, record: &Record, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", record_json(schema, record)),
        OutputFormat::Text => {
            let key = record.primary_key(schema).map(Value::to_string).unwrap_or_default();
            println!("{}", key.yellow().bold());
            for (field, value) in schema.fields().iter().zip(record.values()) {
                if field.name == schema.primary_key_field().name {
                    continue;
                }
                let shown = match value {
                    Value::Null => "-".dimmed().to_string(),
                    Value::Structured(v) => v.to_string(),
                    other => other.to_string(),
                };
                println!("  {}: {}", field.name.cyan(), shown);
            }
        }
    }
}

fn cmd_tables(config: StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    let registry = Registry::new(config);
    let mut rows = Vec::new();
    for name in registry.stored_tables()? {
        let count = match schema_for(&name) {
            Some(schema) => Some(registry.table(schema)?.count()?),
            None => None,
        };
        rows.push((name, count));
    }

    match format {
        OutputFormat::Json => {
            let tables: serde_json::Map<String, serde_json::Value> = rows
                .into_iter()
                .map(|(name, count)| (name, count.map_or(serde_json::Value::Null, Into::into)))
                .collect();
            println!("{}", serde_json::Value::Object(tables));
        }
        OutputFormat::Text if rows.is_empty() => {
            println!("No tables in {}.", registry.config().data_dir.display());
        }
        OutputFormat::Text => {
            for (name, count) in rows {
                match count {
                    Some(n) => println!("{:<20} {} rows", name.bold(), n),
                    None => println!("{:<20} {}", name.bold(), "unknown type".dimmed()),
                }
            }
        }
    }
    Ok(())
}

fn cmd_dump(config: StoreConfig, args: DumpArgs, format: OutputFormat) -> anyhow::Result<()> {
    let registry = Registry::new(config);
    let table = open_table(&registry, &args.table)?;
    let limit = args.limit.unwrap_or(usize::MAX);
    let mut shown = 0;
    for record in table.get_all()?.take(limit) {
        print_record(table.schema(), &record?, format);
        shown += 1;
    }
    if format == OutputFormat::Text {
        println!("{}", format!("({shown} rows)").dimmed());
    }
    Ok(())
}

fn cmd_get(config: StoreConfig, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let registry = Registry::new(config);
    let table = open_table(&registry, &args.table)?;
    let key = parse_key(table.schema(), &args.key)?;
    match table.get_by_primary_key(&key)? {
        Some(record) => print_record(table.schema(), &record, format),
        None => bail!("no {} with key {:?}", table.name(), args.key),
    }
    Ok(())
}

fn cmd_search(config: StoreConfig, args: SearchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let registry = Registry::new(config);
    let table = open_table(&registry, &args.table)?;
    let conditions: Vec<(&str, Value)> = args
        .conditions
        .iter()
        .map(|(field, text)| (field.as_str(), Value::from(text.as_str())))
        .collect();

    let mut found = 0;
    for record in table.get_where_like(&conditions)? {
        print_record(table.schema(), &record?, format);
        found += 1;
    }
    if format == OutputFormat::Text && found == 0 {
        println!("No matches.");
    }
    Ok(())
}

fn cmd_drop(config: StoreConfig, args: DropArgs) -> anyhow::Result<()> {
    let registry = Registry::new(config);
    let table = open_table(&registry, &args.table)?;
    if !args.yes {
        bail!("refusing to drop {} without --yes", table.name());
    }
    table.drop_all()?;
    println!("{} Dropped {}", "✓".green().bold(), table.name().yellow());
    Ok(())
}

fn cmd_import_books(
    config: StoreConfig,
    args: ImportBooksArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let catalog = Catalog::open(config)?;
    let summary = import_book_crossing(&catalog, &args.dir)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
        OutputFormat::Text => {
            println!("{} Import complete", "✓".green().bold());
            println!("  Books:   {} read, {} new", summary.books_read, summary.books_inserted.to_string().green());
            println!("  Reviews: {} read, {} new", summary.reviews_read, summary.reviews_inserted.to_string().green());
            if summary.skipped > 0 {
                println!("  Skipped: {} malformed lines", summary.skipped.to_string().yellow());
            }
        }
    }
    Ok(())
}

fn cmd_cache_info(config: StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    let catalog = Catalog::open(config)?;
    let stats = catalog.book_cache_stats()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&stats)?),
        OutputFormat::Text => {
            println!("Book cache stats:");
            println!("  entries: {}", stats.entries);
            println!("  hits: {}", stats.hits);
            println!("  misses: {}", stats.misses);
            println!("  max_entries: {}", stats.max_entries.to_string().bold());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_models::{Book, User};
    use folio_store::Entity;

    fn config(dir: &tempfile::TempDir) -> StoreConfig {
        StoreConfig::with_data_dir(dir.path()).with_env_vars([("FOLIO_SYNC_WRITES", "false")])
    }

    #[test]
    fn keys_follow_the_primary_key_type() {
        assert_eq!(parse_key(User::schema(), "42").unwrap(), Value::from("42"));
    }

    #[test]
    fn record_json_uses_field_names() {
        let book = Book::new("b1", "Dracula", vec!["Bram Stoker".into()]);
        let json = record_json(Book::schema(), &book.to_record());
        assert_eq!(json["title"], "Dracula");
        assert_eq!(json["authors"][0], "Bram Stoker");
        assert!(json["description"].is_null());
    }

    #[test]
    fn drop_needs_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::open(config(&dir)).unwrap();
        catalog.books.put(&Book::new("b1", "Dracula", vec![])).unwrap();

        let refused = cmd_drop(config(&dir), DropArgs { table: "Book".into(), yes: false });
        assert!(refused.is_err());
        assert!(dir.path().join("Book.csv").exists());

        cmd_drop(config(&dir), DropArgs { table: "book".into(), yes: true }).unwrap();
        assert!(!dir.path().join("Book.csv").exists());
    }

    #[test]
    fn unknown_tables_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_get(config(&dir), GetArgs { table: "Nope".into(), key: "1".into() }, OutputFormat::Text)
            .unwrap_err();
        assert!(err.to_string().contains("unknown table"));
    }
}
