//! Rowsplit CLI - expand identifier lists and ranges in worksheet exports
//!
//! # Main Commands
//!
//! ```bash
//! rowsplit serve                  # Start HTTP server (port 3000)
//! rowsplit process input.csv     # Expand the identifier column
//! rowsplit rules show            # Inspect the built-in delimiter rules
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! rowsplit parse input.csv       # Just decode the worksheet to JSON
//! rowsplit rules check my.json   # Schema-check a rule file
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use rowsplit::{
    parse_file, process_rows, rows_to_delimited, DelimiterSet, ProcessOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rowsplit")]
#[command(about = "Expand serial-number ranges and lists in worksheet exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a worksheet and output its rows as JSON
    Parse {
        /// Input worksheet file
        input: PathBuf,

        /// Field delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Expand the identifier column: ranges and lists to one row each
    Process {
        /// Input worksheet file
        input: PathBuf,

        /// Field delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Delimiter rule file replacing the built-in set
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format for the expanded rows
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,

        /// Also write the error list as JSON
        #[arg(long)]
        errors: Option<PathBuf>,
    },

    /// Inspect, export, or check delimiter rule sets
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: $ROWSPLIT_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// Print the built-in rule set
    Show,

    /// Write the built-in rule set to a JSON file, as an editing template
    Export {
        /// Destination file
        path: PathBuf,
    },

    /// Schema-check a rule file
    Check {
        /// Rule file to check
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Process {
            input,
            delimiter,
            rules,
            output,
            format,
            errors,
        } => cmd_process(
            &input,
            delimiter,
            rules.as_deref(),
            output.as_deref(),
            format,
            errors.as_deref(),
        ),

        Commands::Rules { action } => cmd_rules(action),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing worksheet: {}", input.display());

    let result = parse_file(input, delimiter)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_field_delimiter(result.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("Parsed {} rows", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_process(
    input: &Path,
    delimiter: Option<char>,
    rules_path: Option<&Path>,
    output: Option<&Path>,
    format: OutputFormat,
    errors_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Processing: {}", input.display());

    let options = match rules_path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let rules = DelimiterSet::import(&content)?;
            eprintln!("   Rules: {} (from {})", rules.rules.len(), path.display());
            ProcessOptions::with_rules(rules)
        }
        None => ProcessOptions::default(),
    };

    let parsed = parse_file(input, delimiter)?;
    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!(
        "   Delimiter: '{}'",
        format_field_delimiter(parsed.delimiter)
    );
    eprintln!("   Columns: {}", parsed.headers.join(", "));

    let result = process_rows(&parsed.rows, &options)?;

    eprintln!();
    eprintln!("Expanded: {} input rows -> {} output rows", result.total, result.final_row_count);
    for stat in &result.delimiter_stats {
        eprintln!("   {} rows split on {}", stat.value, stat.name);
    }

    if !result.errors.is_empty() {
        eprintln!("\n{} rows could not be expanded:", result.errors.len());
        for item in result.errors.iter().take(5) {
            eprintln!("   Row {}: {} ({})", item.row, item.reason, item.content);
        }
        if result.errors.len() > 5 {
            eprintln!("   ... +{}", result.errors.len() - 5);
        }
    }

    // Error list export
    if let Some(path) = errors_path {
        let json = serde_json::to_string_pretty(&result.errors)?;
        fs::write(path, &json)?;
        eprintln!("Error list written to: {}", path.display());
    }

    // Expanded worksheet
    let content = match format {
        OutputFormat::Csv => rows_to_delimited(&result.rows, parsed.delimiter)?,
        OutputFormat::Json => serde_json::to_string_pretty(&result.rows)?,
    };
    write_output(&content, output)?;

    eprintln!("\nDone!");
    Ok(())
}

fn cmd_rules(action: RulesAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        RulesAction::Show => {
            let set = DelimiterSet::default();
            eprintln!("Built-in delimiter rules, in priority order:\n");
            for rule in &set.rules {
                println!(
                    "  {:<20} pattern: {:?}{}",
                    rule.name,
                    rule.pattern,
                    if rule.fallback { "  (last resort)" } else { "" }
                );
            }
        }

        RulesAction::Export { path } => {
            let json = DelimiterSet::default().to_json()?;
            fs::write(&path, &json)?;
            eprintln!("Rules written to: {}", path.display());
        }

        RulesAction::Check { path } => {
            let content = fs::read_to_string(&path)?;
            let set = DelimiterSet::import(&content)?;
            // compile too, so bad regex patterns surface here and not mid-run
            set.compile()?;
            eprintln!("OK: {} rules", set.rules.len());
            for rule in &set.rules {
                eprintln!("   {}", rule.name);
            }
        }
    }

    Ok(())
}

async fn cmd_serve(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let port = port
        .or_else(|| {
            std::env::var("ROWSPLIT_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
        })
        .unwrap_or(3000);

    rowsplit::server::start_server(port).await
}

fn format_field_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
