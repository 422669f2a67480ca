use crate::tree_builder::PathStyle;
use clap::Parser;
use std::path::PathBuf;

/// reshelf – preview and apply a proposed file reorganization
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root directory to reorganize, as seen by the server
    #[arg(value_name = "DIR")]
    pub root: Option<String>,

    /// Base URL of the reorganization service
    #[arg(long, env = "RESHELF_SERVER", default_value = "http://localhost:8000")]
    pub server: String,

    /// Comma-separated extensions to request, each with its leading dot.
    /// Defaults to .pdf,.txt,.png,.jpg,.jpeg
    #[arg(long = "ext", value_delimiter = ',', value_name = "EXTENSIONS")]
    pub extensions: Vec<String>,

    /// Scan subdirectories too
    #[arg(long)]
    pub recursive: bool,

    /// How node paths are joined below the root of each tree
    #[arg(long, value_enum, default_value_t = PathStyle::Posix)]
    pub path_style: PathStyle,

    /// Give up on a request after this many seconds (default: wait forever)
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Write logs to this file (RUST_LOG controls verbosity)
    #[arg(long, env = "RESHELF_LOG", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Run without the TUI: scan DIR and print both trees.
    /// Requires DIR.
    #[arg(long, requires = "root")]
    pub headless: bool,

    /// With --headless, apply the printed plan after scanning
    #[arg(long, requires = "headless")]
    pub apply: bool,

    /// With --headless, search DIR for QUERY instead of scanning
    #[arg(long, value_name = "QUERY", requires = "headless", conflicts_with = "apply")]
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extensions_split_on_commas() {
        // Arrange / Act
        let cli = Cli::try_parse_from(["reshelf", "/data", "--ext", ".txt,.md", "--recursive"])
            .expect("test expectation should hold");

        // Assert
        assert_eq!(cli.root.as_deref(), Some("/data"));
        assert_eq!(cli.extensions, vec![".txt", ".md"]);
        assert!(cli.recursive);
        assert_eq!(cli.path_style, PathStyle::Posix);
    }

    #[test]
    fn test_headless_requires_root() {
        // Arrange / Act
        let result = Cli::try_parse_from(["reshelf", "--headless"]);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_windows_path_style() {
        // Arrange / Act
        let cli = Cli::try_parse_from(["reshelf", "--path-style", "windows"])
            .expect("test expectation should hold");

        // Assert
        assert_eq!(cli.path_style, PathStyle::Windows);
    }
}
