use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use mirror_proxy::mapping::extract_prefix;
use mirror_proxy::rewrite::{denest_path, rewrite_body};
use mirror_proxy::DomainTable;

#[derive(Parser)]
#[command(name = "mirror-cli")]
#[command(about = "Offline inspection tool for the mirror proxy's domain mapping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the built-in domain table
    Table,
    /// Show how a proxy hostname resolves and the rewrite rules it yields
    Resolve {
        /// Effective hostname, e.g. gh.example.org
        host: String,
    },
    /// Show the outbound path for a request path
    Denest {
        path: String,
    },
    /// Rewrite text (a file, or stdin) as if served on the given host
    Rewrite {
        #[arg(long)]
        host: String,
        file: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let table = DomainTable::builtin()?;

    match cli.command {
        Commands::Table => {
            println!("{}", serde_json::to_string_pretty(table.entries())?);
        }
        Commands::Resolve { host } => {
            let output = match table.resolve(&host) {
                Ok(target) => json!({
                    "prefix": target.matched_prefix,
                    "origin": target.real_host,
                    "suffix": target.host_suffix,
                    "rules": target.rewrite_rules(&table),
                }),
                Err(e) => json!({
                    "prefix": extract_prefix(&host),
                    "error": e.to_string(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Denest { path } => {
            println!("{}", denest_path(&path));
        }
        Commands::Rewrite { host, file } => {
            let target = table.resolve(&host)?;
            let text = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            print!("{}", rewrite_body(&text, &target.rewrite_rules(&table)));
        }
    }

    Ok(())
}
