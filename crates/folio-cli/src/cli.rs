use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio: inspect and maintain flat-file record tables",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the table files (overrides config and environment)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List table files with their row counts
    Tables,
    /// Print the rows of a table
    Dump(DumpArgs),
    /// Print one record by primary key
    Get(GetArgs),
    /// Fuzzy search a table by field
    Search(SearchArgs),
    /// Permanently delete a table
    Drop(DropArgs),
    /// Import the Book-Crossing dataset
    ImportBooks(ImportBooksArgs),
    /// Show the book cache configuration and counters
    CacheInfo,
}

#[derive(Args)]
pub struct DumpArgs {
    /// Entity type, e.g. Book
    pub table: String,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct GetArgs {
    pub table: String,
    pub key: String,
}

#[derive(Args)]
pub struct SearchArgs {
    pub table: String,
    /// Conditions of the form field=text
    #[arg(required = true, value_parser = parse_condition)]
    pub conditions: Vec<(String, String)>,
}

#[derive(Args)]
pub struct DropArgs {
    pub table: String,
    /// Confirm the deletion
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ImportBooksArgs {
    /// Directory containing BX_Books.csv and BX-Book-Ratings.csv
    pub dir: PathBuf,
}

fn parse_condition(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, text)) if !field.is_empty() => Ok((field.to_string(), text.to_string())),
        _ => Err(format!("expected field=text, got {s:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tables() {
        let cli = Cli::try_parse_from(["folio", "tables"]).unwrap();
        assert!(matches!(cli.command, Command::Tables));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_dump_with_limit() {
        let cli = Cli::try_parse_from(["folio", "dump", "Book", "-n", "5", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        if let Command::Dump(args) = cli.command {
            assert_eq!(args.table, "Book");
            assert_eq!(args.limit, Some(5));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_get() {
        let cli = Cli::try_parse_from(["folio", "--data-dir", "/srv/folio", "get", "User", "u1"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/folio")));
        if let Command::Get(args) = cli.command {
            assert_eq!((args.table.as_str(), args.key.as_str()), ("User", "u1"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_search_conditions() {
        let cli = Cli::try_parse_from(["folio", "search", "Book", "title=modern prometheus", "id="]).unwrap();
        if let Command::Search(args) = cli.command {
            assert_eq!(
                args.conditions,
                vec![
                    ("title".to_string(), "modern prometheus".to_string()),
                    ("id".to_string(), String::new()),
                ]
            );
        } else { panic!("wrong command"); }
    }

    #[test]
    fn search_rejects_bare_words() {
        assert!(Cli::try_parse_from(["folio", "search", "Book", "dracula"]).is_err());
        assert!(Cli::try_parse_from(["folio", "search", "Book"]).is_err());
    }

    #[test]
    fn parse_drop() {
        let cli = Cli::try_parse_from(["folio", "drop", "Book", "--yes"]).unwrap();
        if let Command::Drop(args) = cli.command {
            assert!(args.yes);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_import_and_cache_info() {
        let cli = Cli::try_parse_from(["folio", "import-books", "data/raw"]).unwrap();
        assert!(matches!(cli.command, Command::ImportBooks(_)));
        let cli = Cli::try_parse_from(["folio", "-v", "cache-info"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::CacheInfo));
    }
}
