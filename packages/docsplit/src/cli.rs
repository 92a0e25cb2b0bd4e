//! Command-line interface for docsplit.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;

use crate::assemble::Assembler;
use crate::codec::KeyCodec;
use crate::config::PolicyConfig;
use crate::error::{DocsplitError, Result};
use crate::format::{self, DocumentFormat};
use crate::fs::{FileSystem, LocalFs, Recorder};
use crate::split::Splitter;

/// docsplit - Split YAML/JSON documents into directory trees and back.
#[derive(Parser)]
#[command(name = "docsplit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a document into a directory tree.
    Unbundle {
        /// YAML or JSON document to split
        file: PathBuf,

        /// Target directory (default: next to FILE, named after its stem)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Policy file (YAML)
        #[arg(long)]
        policy: Option<PathBuf>,

        /// Write values nested deeper than this into a single file
        #[arg(long)]
        max_depth: Option<usize>,

        /// Never create subdirectories below directories with this name
        #[arg(long)]
        flat_under: Vec<String>,

        /// Keep multi-line strings inside document files
        #[arg(long)]
        no_text: bool,

        /// Key-to-filename codec
        #[arg(long, value_enum)]
        codec: Option<KeyCodec>,

        /// Write new document files as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reassemble a directory tree into one document.
    Bundle {
        /// Directory written by `unbundle`
        dir: PathBuf,

        /// Output file (default: DIR.yaml, or DIR.json with --json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write JSON instead of YAML
        #[arg(long)]
        json: bool,

        /// Skip unreadable files instead of failing
        #[arg(long)]
        lenient: bool,

        /// Key-to-filename codec
        #[arg(long, value_enum, default_value_t = KeyCodec::Separator)]
        codec: KeyCodec,
    },
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Unbundle {
            file,
            output,
            policy,
            max_depth,
            flat_under,
            no_text,
            codec,
            json,
        } => {
            let mut config = match &policy {
                Some(path) => PolicyConfig::load(path)?,
                None => PolicyConfig::default(),
            };
            if max_depth.is_some() {
                config.max_depth = max_depth;
            }
            config.flat_under.extend(flat_under);
            if no_text {
                config.multiline_as_text = false;
            }
            if let Some(codec) = codec {
                config.codec = codec;
            }
            if json {
                config.format = DocumentFormat::Json;
            }
            config.validate()?;
            unbundle_command(&file, output.as_deref(), &config)
        }
        Commands::Bundle {
            dir,
            output,
            json,
            lenient,
            codec,
        } => bundle_command(&dir, output.as_deref(), json, lenient, codec),
    }
}

/// Execute the unbundle command.
fn unbundle_command(file: &Path, output: Option<&Path>, config: &PolicyConfig) -> Result<()> {
    let target = match output {
        Some(dir) => dir.to_path_buf(),
        None => default_split_dir(file)?,
    };

    let text = fs::read_to_string(file).map_err(|e| DocsplitError::io(file, e))?;
    let document = format::parse(&text).map_err(|message| DocsplitError::parse(file, message))?;

    println!(
        "{} {} into {}",
        style("Unbundling").bold(),
        style(file.display()).cyan(),
        style(target.display()).green()
    );

    let policy = config.to_policy();
    let recorder = Recorder::new(LocalFs);
    let report = Splitter::new(&recorder, &policy)
        .with_codec(config.codec)
        .with_format(config.format)
        .unbundle(&document, &target)?;

    let stats = recorder.stats();
    println!();
    if stats.total() == 0 {
        println!("{}", style("Already up to date").green().bold());
        return Ok(());
    }
    println!("  Written: {}", report.written);
    println!("  Unchanged: {}", report.unchanged);
    if report.removed > 0 {
        println!("  Removed: {}", style(report.removed).yellow());
    }
    if report.pruned > 0 {
        println!("  Pruned directories: {}", style(report.pruned).yellow());
    }
    println!(
        "{} {} file(s) written, {} removed, {} director(ies) created",
        style("Done:").green().bold(),
        stats.files_written,
        stats.files_removed,
        stats.dirs_created
    );

    Ok(())
}

/// Execute the bundle command.
fn bundle_command(
    dir: &Path,
    output: Option<&Path>,
    json: bool,
    lenient: bool,
    codec: KeyCodec,
) -> Result<()> {
    let format = if json {
        DocumentFormat::Json
    } else {
        output
            .and_then(DocumentFormat::from_path)
            .unwrap_or(DocumentFormat::Yaml)
    };
    let output_path = match output {
        Some(path) => path.to_path_buf(),
        None => default_bundle_file(dir, format)?,
    };

    println!(
        "{} {}",
        style("Bundling").bold(),
        style(dir.display()).cyan()
    );

    let bundle = Assembler::new(&LocalFs)
        .with_codec(codec)
        .strict(!lenient)
        .assemble(dir)?;

    if !bundle.warnings.is_empty() {
        println!("  Warnings: {}", style(bundle.warnings.len()).yellow().bold());
        for warning in &bundle.warnings {
            println!("    {}", style(warning).yellow());
        }
    }

    let text = format
        .stringify(&bundle.document)
        .map_err(|message| DocsplitError::Serialize { message })?;
    LocalFs.write(&output_path, &text)?;

    println!();
    println!(
        "{} {}",
        style("Saved to:").green().bold(),
        output_path.display()
    );

    Ok(())
}

/// `api.yaml` splits into the sibling directory `api/`.
fn default_split_dir(file: &Path) -> Result<PathBuf> {
    let target = file.with_extension("");
    if target == file {
        return Err(DocsplitError::Config(format!(
            "cannot derive an output directory from {}, pass --output",
            file.display()
        )));
    }
    Ok(target)
}

/// `api/` bundles into the sibling file `api.yaml`.
fn default_bundle_file(dir: &Path, format: DocumentFormat) -> Result<PathBuf> {
    let name = dir.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        DocsplitError::Config(format!(
            "cannot derive an output file from {}, pass --output",
            dir.display()
        ))
    })?;
    Ok(dir.with_file_name(format!("{name}.{}", format.extension())))
}
