use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use orderscript_core::OrderRegistry;
use orderscript_document::{
    DEFAULT_CONFIG_FILE, Document, DocumentReport, OutputFormat, ScriptConfig, format_orders,
    format_reports, format_tree, load_script, save_script,
};
use orderscript_lint::LintOptions;
use orderscript_syntax::SyntaxTree;
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "orderscript")]
#[command(about = "Check, inspect and convert orderscript documents")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate script files against the order catalog.
    Check(CheckArgs),
    /// List the orders known to the registry.
    Orders(OrdersArgs),
    /// Print the reconciled line tree of a script.
    Tree(TreeArgs),
    /// Convert a script between outline, JSON and YAML.
    Convert(ConvertArgs),
    /// Print the parse tree of a single line.
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Configuration file (defaults to .orderscript.yml when present).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Script files (.outline, .txt, .json, .yaml, .yml).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    #[command(flatten)]
    config: ConfigArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
    /// Exit with failure when any warning is reported.
    #[arg(long)]
    deny_warnings: bool,
}

#[derive(Debug, Args)]
struct OrdersArgs {
    /// Only list orders whose name matches this regular expression.
    #[arg(long)]
    filter: Option<String>,
    #[command(flatten)]
    config: ConfigArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct TreeArgs {
    /// Script file.
    input: PathBuf,
    #[command(flatten)]
    config: ConfigArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Script file to read.
    input: PathBuf,
    /// Destination; the format follows its extension.
    #[arg(long)]
    output: PathBuf,
    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Line text, e.g. "@移动 -t 10".
    text: String,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Orders(args) => run_orders(args),
        Command::Tree(args) => run_tree(args),
        Command::Convert(args) => run_convert(args),
        Command::Parse(args) => run_parse(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &ConfigArgs) -> Result<(ScriptConfig, PathBuf), String> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                debug!("No configuration file, using defaults");
                return Ok((ScriptConfig::default(), PathBuf::from(".")));
            }
            default
        }
    };

    let config = ScriptConfig::load(&path)
        .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?;
    info!(config = %path.display(), catalogs = config.catalogs.len(), "Loaded configuration");

    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((config, base_dir))
}

fn load_registry(args: &ConfigArgs) -> Result<(Arc<OrderRegistry>, LintOptions), String> {
    let (config, base_dir) = load_config(args)?;
    let registry = config
        .build_registry(&base_dir)
        .map_err(|err| err.to_string())?;
    Ok((Arc::new(registry), config.diagnostics))
}

fn load_document(
    path: &Path,
    registry: Arc<OrderRegistry>,
    options: LintOptions,
) -> Result<Document, String> {
    let seeds =
        load_script(path).map_err(|err| format!("Failed to read '{}': {err}", path.display()))?;
    let document = Document::from_seeds(registry, &seeds)
        .map_err(|err| format!("Failed to build '{}': {err}", path.display()))?;
    Ok(document.with_lint_options(options))
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let (registry, options) = load_registry(&args.config)?;

    let reports = args
        .inputs
        .par_iter()
        .map(|path| -> Result<DocumentReport, String> {
            let document = load_document(path, Arc::clone(&registry), options.clone())?;
            let source = path.display().to_string();
            debug!(source = %source, lines = document.line_count(), "Checked document");
            Ok(document.report(Some(&source)))
        })
        .collect::<Result<Vec<_>, String>>()?;

    print!("{}", format_reports(&reports, args.format)?);

    let errors: usize = reports.iter().map(|r| r.errors + r.syntax_errors).sum();
    let warnings: usize = reports.iter().map(|r| r.warnings).sum();
    if reports.iter().any(DocumentReport::has_errors) {
        return Err(format!("{errors} error(s) in {} file(s)", reports.len()));
    }
    if args.deny_warnings && warnings > 0 {
        return Err(format!("{warnings} warning(s) denied"));
    }
    Ok(())
}

fn run_orders(args: OrdersArgs) -> Result<(), String> {
    let (registry, _) = load_registry(&args.config)?;
    let filter = args
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|err| format!("Invalid filter: {err}"))?;

    let orders: Vec<_> = registry
        .definitions()
        .into_iter()
        .filter(|def| filter.as_ref().is_none_or(|re| re.is_match(&def.name)))
        .collect();

    print!("{}", format_orders(&orders, args.format)?);
    Ok(())
}

fn run_tree(args: TreeArgs) -> Result<(), String> {
    let (registry, options) = load_registry(&args.config)?;
    let document = load_document(&args.input, registry, options)?;
    print!("{}", format_tree(&document, args.format)?);
    Ok(())
}

fn run_convert(args: ConvertArgs) -> Result<(), String> {
    let (registry, options) = load_registry(&args.config)?;
    let document = load_document(&args.input, registry, options)?;
    let seeds = document.to_seeds();

    if let Some(parent) = args.output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create output directory '{}': {err}",
                parent.display()
            )
        })?;
    }

    save_script(&args.output, &seeds)
        .map_err(|err| format!("Failed to write '{}': {err}", args.output.display()))?;

    println!(
        "Converted {} line(s) from '{}' into '{}'.",
        document.line_count(),
        args.input.display(),
        args.output.display()
    );
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let tree = SyntaxTree::parse(&args.text);
    print!("{}", tree.dump());
    for error in tree.errors() {
        println!("error at {}: {}", error.span, error.message);
    }
    Ok(())
}
