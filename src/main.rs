use clap::{Parser, Subcommand};
use mimeguess::{MimeError, MimeRegistry};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(author, version, about = "Look up MIME types and file extensions", long_about = None)]
struct Args {
    /// JSON table to use instead of the bundled one
    #[arg(long, global = true)]
    table: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the MIME type for an extension
    Type { extension: String },

    /// Print the canonical extension for a MIME type
    Ext { mime_type: String },

    /// Print every extension for a MIME type, one per line
    Exts { mime_type: String },

    /// Check whether an extension is known
    HasExt { extension: String },

    /// Check whether a MIME type is known
    HasType { mime_type: String },

    /// Guess the MIME type of a file from its name, then its content
    GuessType {
        path: PathBuf,

        /// Name to take the extension from instead of the path
        #[arg(long)]
        name: Option<String>,

        /// Printed when nothing matches
        #[arg(long, default_value = mimeguess::DEFAULT_TYPE)]
        default: String,
    },

    /// Guess an extension for a file from its name, then its content
    GuessExt {
        path: PathBuf,

        /// Name to take the extension from instead of the path
        #[arg(long)]
        name: Option<String>,

        /// Printed when nothing matches
        #[arg(long, default_value = mimeguess::DEFAULT_EXTENSION)]
        default: String,
    },

    /// Print the MIME type detected from file content
    Magic { path: PathBuf },

    /// Print the whole table
    List,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = args
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);
    tracing_subscriber::fmt::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    debug!("mimeguess v{}", env!("CARGO_PKG_VERSION"));

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

/// Run one command. `Ok(false)` means the lookup found nothing.
fn run(args: Args) -> Result<bool, MimeError> {
    let owned;
    let registry = match &args.table {
        Some(path) => {
            debug!("Loading MIME table from {}", path.display());
            owned = MimeRegistry::from_path(path)?;
            &owned
        }
        None => mimeguess::registry()?,
    };

    let found = match args.command {
        Command::Type { extension } => print_found(registry.type_for_extension(&extension)),
        Command::Ext { mime_type } => print_found(registry.extension_for_type(&mime_type)),
        Command::Exts { mime_type } => match registry.extensions_for_type(&mime_type) {
            Some(extensions) => {
                for extension in extensions {
                    println!("{}", extension);
                }
                true
            }
            None => false,
        },
        Command::HasExt { extension } => print_bool(registry.has_extension(&extension)),
        Command::HasType { mime_type } => print_bool(registry.has_type(&mime_type)),
        Command::GuessType {
            path,
            name,
            default,
        } => {
            let mime_type = registry.guess_type_or(&path, name.as_deref(), &default)?;
            println!("{}", mime_type);
            true
        }
        Command::GuessExt {
            path,
            name,
            default,
        } => {
            let extension = registry.guess_extension_or(&path, name.as_deref(), &default)?;
            println!("{}", extension);
            true
        }
        Command::Magic { path } => print_found(registry.get_magic_type(&path)?),
        Command::List => {
            for (mime_type, extensions) in registry.iter() {
                println!("{}\t{}", mime_type, extensions.join(" "));
            }
            true
        }
    };

    Ok(found)
}

fn print_found(value: Option<&str>) -> bool {
    match value {
        Some(value) => {
            println!("{}", value);
            true
        }
        None => false,
    }
}

fn print_bool(value: bool) -> bool {
    println!("{}", value);
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["mimeguess", "guess-type", "a.bin", "--name", "x.jpg"])
            .unwrap();
        match args.command {
            Command::GuessType {
                path,
                name,
                default,
            } => {
                assert_eq!(path, PathBuf::from("a.bin"));
                assert_eq!(name.as_deref(), Some("x.jpg"));
                assert_eq!(default, "application/octet-stream");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_table_flag() {
        let args =
            Args::try_parse_from(["mimeguess", "type", "jpg", "--table", "t.json"]).unwrap();
        assert_eq!(args.table, Some(PathBuf::from("t.json")));
        assert_eq!(args.log_level, "warn");
    }

    #[test]
    fn test_run_lookups() {
        let args = Args::try_parse_from(["mimeguess", "type", "jpg"]).unwrap();
        assert!(run(args).unwrap());

        let args = Args::try_parse_from(["mimeguess", "ext", "blabla"]).unwrap();
        assert!(!run(args).unwrap());

        let args = Args::try_parse_from(["mimeguess", "has-type", "image/jpeg"]).unwrap();
        assert!(run(args).unwrap());
    }

    #[test]
    fn test_run_bad_table() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("table.json");
        std::fs::write(&path, "{").unwrap();

        let args =
            Args::try_parse_from(["mimeguess", "--table", path.to_str().unwrap(), "list"]).unwrap();
        assert!(matches!(run(args), Err(MimeError::Table(_))));
    }
}
