use std::path::PathBuf;

use clap::Parser;

/// MCP server for editing cloud architecture diagrams over stdio
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding diagrams and config.toml. Overrides the config file.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info_logging() {
        let args = Args::parse_from(["stratus-mcp"]);
        assert_eq!(args.log_level, "info");
        assert!(args.config.is_none());
        assert!(args.data_dir.is_none());
    }

    #[test]
    fn paths_are_parsed() {
        let args = Args::parse_from([
            "stratus-mcp",
            "--config",
            "custom.toml",
            "--data-dir",
            "/tmp/stratus",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/stratus")));
        assert_eq!(args.log_level, "debug");
    }
}
