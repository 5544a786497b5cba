//! Sassline CLI - inline, batch and compile stylesheets

use std::path::{Path, PathBuf};
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use colored::Colorize;
use futures::future::join_all;
use ignore::WalkBuilder;

use sassline::error::{FixSuggestion, SasslineError};
use sassline::import::{base_of, normalize_specifier, scan_directives};
use sassline::{
    CommandCompiler, Environment, EventKind, FsLoader, Load, ModuleLoader, Pipeline,
    PipelineConfig, TraceWriter,
};

#[derive(Parser)]
#[command(name = "sassline")]
#[command(about = "Sassline - stylesheet import inlining and batched compilation")]
#[command(version)]
struct Cli {
    /// Config file (default: ./sassline.toml, then the user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Compiler command line, e.g. "sass --stdin"
    #[arg(long, global = true)]
    compiler: Option<String>,

    /// Write the event log to this file as NDJSON
    #[arg(long, global = true)]
    trace: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile entry stylesheets and persist the dev artifact
    Compile {
        /// Entry files or directories to walk
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Compile for packaging (no artifact)
    Build {
        /// Entry files or directories to walk
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the import directives of a file with their canonical keys
    Imports {
        /// Stylesheet to scan
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Logs go to stderr; stdout carries compiled CSS
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match load_config(&cli) {
        Ok(config) => match &cli.command {
            Commands::Compile { paths } => {
                run_compile(config, paths, cli.trace.as_deref()).await
            }
            Commands::Build { paths, output } => {
                run_build(config, paths, output.as_deref(), cli.trace.as_deref()).await
            }
            Commands::Imports { file } => list_imports(&config, file).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// Config file + environment + CLI overrides
fn load_config(cli: &Cli) -> Result<PipelineConfig, SasslineError> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::load_from(path)?,
        None => PipelineConfig::load()?,
    };
    let mut config = config.with_env()?;

    if let Some(command) = &cli.compiler {
        let mut parts = command.split_whitespace().map(String::from);
        if let Some(program) = parts.next() {
            config.compiler.command = program;
            config.compiler.args = parts.collect();
        }
    }

    // Every entry on the command line must be compiled
    config.batch.defer_first_load = false;
    Ok(config)
}

async fn run_compile(
    mut config: PipelineConfig,
    paths: &[PathBuf],
    trace: Option<&Path>,
) -> Result<(), SasslineError> {
    config.environment = Environment::authoritative();
    let artifact = config.artifact.path();
    let css = compile_entries(config, paths, trace).await?;

    emit_css(&css, None).await?;
    eprintln!(
        "{} {} bytes → {}",
        "✓".green(),
        css.len(),
        artifact.display().to_string().cyan()
    );
    Ok(())
}

async fn run_build(
    mut config: PipelineConfig,
    paths: &[PathBuf],
    output: Option<&Path>,
    trace: Option<&Path>,
) -> Result<(), SasslineError> {
    config.environment = Environment::packaging();
    let css = compile_entries(config, paths, trace).await?;

    emit_css(&css, output).await?;
    if let Some(path) = output {
        eprintln!("{} {} bytes → {}", "✓".green(), css.len(), path.display());
    }
    Ok(())
}

/// Submit every entry as a load and collect the batch output
async fn compile_entries(
    config: PipelineConfig,
    paths: &[PathBuf],
    trace: Option<&Path>,
) -> Result<String, SasslineError> {
    let extension = config.imports.extension.clone();
    let loader = FsLoader::from_current_dir()?;
    let entries = discover_entries(paths, &extension)?;

    let mut loads = Vec::with_capacity(entries.len());
    for entry in &entries {
        let source = tokio::fs::read_to_string(entry)
            .await
            .map_err(|e| SasslineError::Io {
                path: entry.to_string(),
                reason: e.to_string(),
            })?;
        loads.push(Load::new(loader.address_of(entry), source));
    }

    eprintln!(
        "{} {} entries | compiler: {} {}",
        "→".cyan(),
        entries.len(),
        config.compiler.command.cyan().bold(),
        config.compiler.args.join(" ")
    );

    let pipeline = Pipeline::new(
        config.clone(),
        Arc::new(loader),
        Arc::new(CommandCompiler::from_settings(&config.compiler)),
    );

    // Polled from one task: every entry joins the batch before the first leaves
    let results = join_all(loads.into_iter().map(|load| pipeline.translate(load))).await;

    if let Some(path) = trace {
        TraceWriter::create(path)?.write_all(pipeline.event_log())?;
    }

    let mut css = String::new();
    let mut failures = Vec::new();
    for (entry, result) in entries.iter().zip(results) {
        match result {
            Ok(text) => css.push_str(&text),
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), entry, e);
                failures.push(e);
            }
        }
    }

    if let Some(first) = failures.into_iter().next() {
        return Err(first);
    }

    let compile_failure = pipeline
        .event_log()
        .events()
        .into_iter()
        .find_map(|e| match e.kind {
            EventKind::CompileFailed {
                status, message, ..
            } => Some(SasslineError::CompileFailed { status, message }),
            _ => None,
        });
    match compile_failure {
        Some(err) => Err(err),
        None => Ok(css),
    }
}

/// Files are taken as given; directories are walked for non-partial `*.<ext>` files
fn discover_entries(paths: &[PathBuf], extension: &str) -> Result<Vec<Utf8PathBuf>, SasslineError> {
    let mut entries = Vec::new();

    for path in paths {
        if path.is_file() {
            entries.push(utf8(path.clone())?);
            continue;
        }
        if !path.exists() {
            return Err(SasslineError::Io {
                path: path.display().to_string(),
                reason: "no such file or directory".to_string(),
            });
        }

        let mut found: Vec<Utf8PathBuf> = Vec::new();
        for item in WalkBuilder::new(path).build() {
            let item = item.map_err(|e| SasslineError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let is_file = item.file_type().is_some_and(|t| t.is_file());
            let candidate = item.path();
            let is_entry = candidate.extension().is_some_and(|e| e == extension)
                && !candidate
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('_'));
            if is_file && is_entry {
                found.push(utf8(candidate.to_path_buf())?);
            }
        }
        found.sort();
        entries.extend(found);
    }

    if entries.is_empty() {
        return Err(SasslineError::NoEntries {
            paths: paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }
    Ok(entries)
}

fn utf8(path: PathBuf) -> Result<Utf8PathBuf, SasslineError> {
    Utf8PathBuf::from_path_buf(path).map_err(|p| SasslineError::Io {
        path: p.display().to_string(),
        reason: "path is not valid UTF-8".to_string(),
    })
}

async fn emit_css(css: &str, output: Option<&Path>) -> Result<(), SasslineError> {
    match output {
        Some(path) => tokio::fs::write(path, css)
            .await
            .map_err(|e| SasslineError::Io {
                path: path.display().to_string(),
                reason: e.to_string(),
            }),
        None => {
            println!("{}", css);
            Ok(())
        }
    }
}

async fn list_imports(config: &PipelineConfig, file: &Path) -> Result<(), SasslineError> {
    let loader = FsLoader::from_current_dir()?;
    let path = utf8(file.to_path_buf())?;
    let source = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| SasslineError::Io {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

    let address = loader.address_of(&path);
    let base = base_of(&address, loader.working_dir());
    let directives = scan_directives(&source);

    println!("{} {} ({} imports, base {})", "→".cyan(), path, directives.len(), base);
    for directive in &directives {
        let normalized = normalize_specifier(&directive.specifier, &base, &config.imports.extension);
        println!("  {:<30} {}", directive.specifier, normalized.key);
    }
    Ok(())
}
