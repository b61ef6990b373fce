use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dagfs",
    about = "Browse unixfs files and directories stored in a merkledag",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with `host`, `port`, `base_path` and `timeout_secs`
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Daemon API address, overriding the config file
    #[arg(long, global = true, value_name = "HOST:PORT")]
    pub api: Option<String>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a file to stdout
    Cat(RefArgs),
    /// Read a byte range of a file
    Read(ReadArgs),
    /// List a directory
    Ls(RefArgs),
    /// Print a node's links
    Links(RefArgs),
    /// Print the DAG below a node
    Tree(TreeArgs),
    /// Show a node's unixfs type, size and block layout
    Stat(RefArgs),
}

#[derive(Args)]
pub struct RefArgs {
    /// Hash, /ipfs/ path or /ipns/ path
    pub reference: String,
}

#[derive(Args)]
pub struct ReadArgs {
    pub reference: String,
    #[arg(long, default_value = "0")]
    pub offset: u64,
    /// Bytes to read; the rest of the file when omitted
    #[arg(long)]
    pub length: Option<usize>,
}

#[derive(Args)]
pub struct TreeArgs {
    pub reference: String,
    /// Stop descending below this depth
    #[arg(long)]
    pub depth: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cat() {
        let cli = Cli::try_parse_from(["dagfs", "cat", "/ipfs/QmRoot/a.txt"]).unwrap();
        if let Command::Cat(args) = cli.command {
            assert_eq!(args.reference, "/ipfs/QmRoot/a.txt");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_read_range() {
        let cli = Cli::try_parse_from(["dagfs", "read", "QmFile", "--offset", "100", "--length", "16"]).unwrap();
        if let Command::Read(args) = cli.command {
            assert_eq!(args.offset, 100);
            assert_eq!(args.length, Some(16));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_read_defaults() {
        let cli = Cli::try_parse_from(["dagfs", "read", "QmFile"]).unwrap();
        if let Command::Read(args) = cli.command {
            assert_eq!(args.offset, 0);
            assert!(args.length.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_tree_depth() {
        let cli = Cli::try_parse_from(["dagfs", "tree", "QmRoot", "--depth", "2"]).unwrap();
        if let Command::Tree(args) = cli.command {
            assert_eq!(args.depth, Some(2));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "dagfs", "stat", "QmRoot", "--api", "10.0.0.2:5002", "--config", "dagfs.toml", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.api.as_deref(), Some("10.0.0.2:5002"));
        assert_eq!(cli.config, Some(PathBuf::from("dagfs.toml")));
        assert!(matches!(cli.command, Command::Stat(_)));
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["dagfs", "--format", "json", "links", "QmRoot"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn missing_reference_is_rejected() {
        assert!(Cli::try_parse_from(["dagfs", "ls"]).is_err());
    }
}
