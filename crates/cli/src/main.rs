mod render;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tms99_core::{ConfigError, Cpu, Dialect, Extension, GrammarTable, LineIndex};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// TMS9900 assembly syntax toolkit.
#[derive(Parser)]
#[command(name = "tms99", version, about = "TMS9900 assembly syntax toolkit")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Dialect configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CPU variant (tms9900, tms9995, tms99105, tms99110); overrides --config
    #[arg(long, global = true)]
    cpu: Option<String>,

    /// Enable an instruction-set extension (f18a, gpl-move); repeatable
    #[arg(long = "ext", global = true)]
    extensions: Vec<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a source file and print its syntax tree
    Parse {
        /// Path to the assembly source file
        file: PathBuf,
    },

    /// Print the token stream with the lexical state of each token
    Tokens {
        /// Path to the assembly source file
        file: PathBuf,
    },

    /// Report syntax diagnostics; exits 1 if there are any
    Check {
        /// Path to the assembly source file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dialect = match resolve_dialect(
        cli.config.as_deref(),
        cli.cpu.as_deref(),
        &cli.extensions,
    ) {
        Ok(d) => d,
        Err(e) => {
            report_error(&e.to_string(), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    let table = GrammarTable::new(&dialect);

    match cli.command {
        Commands::Parse { file } => cmd_parse(&file, &table, cli.output, cli.quiet),
        Commands::Tokens { file } => cmd_tokens(&file, &table, cli.output, cli.quiet),
        Commands::Check { file } => cmd_check(&file, &table, cli.output, cli.quiet),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

/// Config file first, then `--cpu` and `--ext` on top.
fn resolve_dialect(
    config: Option<&Path>,
    cpu: Option<&str>,
    extensions: &[String],
) -> Result<Dialect, ConfigError> {
    let mut dialect = match config {
        Some(path) => Dialect::load(path)?,
        None => Dialect::default(),
    };
    if let Some(cpu) = cpu {
        dialect.cpu = cpu.parse::<Cpu>()?;
    }
    for ext in extensions {
        dialect = dialect.with_extension(ext.parse::<Extension>()?);
    }
    log::debug!("dialect: {:?}", dialect);
    Ok(dialect)
}

fn read_source(file: &Path, output: OutputFormat, quiet: bool) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            report_error(
                &format!("cannot read {}: {}", file.display(), e),
                output,
                quiet,
            );
            process::exit(1);
        }
    }
}

// ──────────────────────────────────────────────
// Commands
// ──────────────────────────────────────────────

fn cmd_parse(file: &Path, table: &GrammarTable, output: OutputFormat, quiet: bool) {
    let src = read_source(file, output, quiet);
    let parse = tms99_core::parse(&src, table);
    match output {
        OutputFormat::Json => {
            let lines = LineIndex::new(&src);
            let errors: Vec<serde_json::Value> =
                parse.errors.iter().map(|e| e.to_json_value(&lines)).collect();
            let doc = serde_json::json!({
                "tree":   parse.tree.to_json_value(),
                "errors": errors,
            });
            let pretty = serde_json::to_string_pretty(&doc)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            print!("{}", parse.tree.debug_dump());
            if !quiet && !parse.errors.is_empty() {
                eprintln!("{} syntax error(s)", parse.errors.len());
            }
        }
    }
}

fn cmd_tokens(file: &Path, table: &GrammarTable, output: OutputFormat, quiet: bool) {
    let src = read_source(file, output, quiet);
    let tokens = tms99_core::lex(&src, table);
    match output {
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = tokens
                .iter()
                .map(|t| render::token_json(t, &src))
                .collect();
            let pretty = serde_json::to_string_pretty(&items)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            for t in &tokens {
                println!("{}", render::token_line(t, &src));
            }
        }
    }
}

fn cmd_check(file: &Path, table: &GrammarTable, output: OutputFormat, quiet: bool) {
    let src = read_source(file, output, quiet);
    let parse = tms99_core::parse(&src, table);
    let name = file.display().to_string();
    let lines = LineIndex::new(&src);
    match output {
        OutputFormat::Json => {
            let errors: Vec<serde_json::Value> =
                parse.errors.iter().map(|e| e.to_json_value(&lines)).collect();
            let doc = serde_json::json!({
                "file":   name,
                "errors": errors,
            });
            let pretty = serde_json::to_string_pretty(&doc)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            for err in &parse.errors {
                println!("{}", render::diagnostic_line(&name, err, &lines));
            }
            if !quiet && parse.errors.is_empty() {
                println!("{}: ok", name);
            }
        }
    }
    if parse.has_errors() {
        process::exit(1);
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
