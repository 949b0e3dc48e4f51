use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "graphwright")]
#[command(about = "Graphwright CLI: compare GraphQL schemas and explore the demo schema")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "GRAPHWRIGHT_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compare two SDL files and report changes by criticality
    Diff(DiffArgs),
    /// Print the demo Team/Player schema and optionally run a query against it
    Demo(DemoArgs),
}

#[derive(clap::Args)]
pub struct DiffArgs {
    /// SDL file of the old schema
    pub old: PathBuf,
    /// SDL file of the new schema
    pub new: PathBuf,
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
    /// Also fail when dangerous changes are found
    #[arg(long)]
    pub fail_on_dangerous: bool,
}

#[derive(clap::Args)]
pub struct DemoArgs {
    /// Query to run against the demo schema
    #[arg(short, long)]
    pub query: Option<String>,
    /// Variables for the query, as a JSON object
    #[arg(long)]
    pub variables: Option<String>,
    /// Schema configuration file (TOML)
    #[arg(short, long, env = "GRAPHWRIGHT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diff() {
        let cli = Cli::try_parse_from(["graphwright", "diff", "old.graphql", "new.graphql", "-f", "json"])
            .unwrap();
        let Commands::Diff(args) = cli.command else {
            panic!("expected diff");
        };
        assert_eq!(args.old, PathBuf::from("old.graphql"));
        assert_eq!(args.format, OutputFormat::Json);
        assert!(!args.fail_on_dangerous);
    }

    #[test]
    fn test_parse_demo() {
        let cli = Cli::try_parse_from(["graphwright", "demo", "--query", "{ teams { name } }"])
            .unwrap();
        let Commands::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.query.as_deref(), Some("{ teams { name } }"));
        assert!(args.variables.is_none());
    }

    #[test]
    fn test_diff_requires_two_files() {
        assert!(Cli::try_parse_from(["graphwright", "diff", "old.graphql"]).is_err());
    }
}
