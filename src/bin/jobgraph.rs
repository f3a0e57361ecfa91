//! jobgraph CLI: convert legacy scrape-job configs into component graphs.
//!
//! Usage:
//!   jobgraph convert <file> [--prefix P] [--format json|yaml] [--output path] [--strict]
//!   jobgraph kinds

use clap::{Parser, Subcommand, ValueEnum};
use jobgraph::{convert_config, discovery, Conversion, ConvertOptions, JobConverter, LegacyConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "jobgraph",
    version,
    about = "Convert legacy scrape jobs into pipeline component graphs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a legacy config file
    Convert {
        /// Path to the legacy YAML config
        file: PathBuf,
        /// Prefix for every generated label
        #[arg(long)]
        prefix: Option<String>,
        /// Output encoding
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Write the graph here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Exit non-zero if any stanza could not be converted
        #[arg(long)]
        strict: bool,
    },
    /// List the discovery kinds that can be converted
    Kinds,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn render(conversion: &Conversion, format: Format) -> Result<String, String> {
    match format {
        Format::Json => serde_json::to_string_pretty(&conversion.document)
            .map_err(|e| format!("cannot encode JSON: {}", e)),
        Format::Yaml => serde_yaml::to_string(&conversion.document)
            .map_err(|e| format!("cannot encode YAML: {}", e)),
    }
}

fn cmd_convert(
    file: &Path,
    prefix: Option<String>,
    format: Format,
    output: Option<&Path>,
    strict: bool,
) -> i32 {
    let config = match LegacyConfig::load(file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut options = ConvertOptions::default();
    if let Some(prefix) = prefix {
        options = options.with_label_prefix(prefix);
    }
    let converter = JobConverter::new(discovery::default_registry(), options);

    let conversion = match convert_config(&config, &converter) {
        Ok(conversion) => conversion,
        Err(e) => {
            eprintln!("Error: internal conversion failure: {}", e);
            return 2;
        }
    };

    for diagnostic in &conversion.diagnostics {
        eprintln!("Warning: {}", diagnostic);
    }

    let text = match render(&conversion, format) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &text) {
                eprintln!("Error: cannot write '{}': {}", path.display(), e);
                return 1;
            }
        }
        None => println!("{}", text),
    }

    if strict && !conversion.is_clean() {
        eprintln!(
            "Error: {} stanza(s) could not be converted",
            conversion.diagnostics.len()
        );
        return 1;
    }
    0
}

fn cmd_kinds() -> i32 {
    let registry = discovery::default_registry();
    println!("{:<12}  {:>8}", "KIND", "FORWARDS");
    println!("{}", "-".repeat(22));
    for kind in registry.kinds() {
        let forwards = registry.get(kind).map(|m| m.forwards()).unwrap_or(false);
        println!("{:<12}  {:>8}", kind, if forwards { "yes" } else { "no" });
    }
    0
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Convert {
            file,
            prefix,
            format,
            output,
            strict,
        } => cmd_convert(&file, prefix, format, output.as_deref(), strict),
        Commands::Kinds => cmd_kinds(),
    };
    std::process::exit(code);
}
