// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lesewerk — fault-tolerant document text extraction.
//
// Entry point. Initialises logging, wires the local OCR engine and PDFium
// renderer into the extraction pipeline, and runs one command. When every
// OCR strategy is refused, falls back to the PDF's embedded text layer
// before giving up.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use lesewerk_core::error::{LesewerkError, Result};
use lesewerk_core::human_errors::humanize_failure;
use lesewerk_core::{
    DocumentFormat, ExtractionConfig, ExtractionFailure, ExtractionRequest, FeatureFlags,
    StorageLocator,
};
use lesewerk_document::{
    ExtractionPipeline, FsObjectStore, ObjectStore, OcrConfig, OcrsBackend, PdfiumRenderer,
    detect_format, extract_embedded_text, inspect_pdf,
};
use serde_json::json;
use tracing::{info, warn};

/// Label for text recovered from the PDF's own text layer.
const EMBEDDED_TEXT_LABEL: &str = "embedded-text fallback";

#[derive(Parser)]
#[command(name = "lesewerk", version)]
#[command(about = "Extract structured text from PDFs and scanned images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// OCR a document, falling back to page images and then embedded text
    Extract(ExtractArgs),
    /// Report format, page count, and encryption without running OCR
    Inspect {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct ExtractArgs {
    /// Document to read; omit when reading from --store-root
    #[arg(required_unless_present = "store_root")]
    path: Option<PathBuf>,

    /// Reconstruct tables
    #[arg(long)]
    tables: bool,

    /// Request form analysis
    #[arg(long)]
    forms: bool,

    /// Rasterisation DPI, overriding the size-based choice
    #[arg(long)]
    dpi: Option<u32>,

    /// JSON extraction config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the ocrs detection and recognition models
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Object store root directory
    #[arg(long, requires_all = ["container", "key"])]
    store_root: Option<PathBuf>,

    #[arg(long, requires = "store_root")]
    container: Option<String>,

    #[arg(long, requires = "store_root")]
    key: Option<String>,

    /// Print a JSON object instead of plain text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Extract(args) => extract(args),
        Command::Inspect { path, json } => inspect(path, json),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("lesewerk: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &ExtractArgs) -> Result<ExtractionConfig> {
    let mut config = match &args.config {
        Some(path) => ExtractionConfig::from_json_file(path)?,
        None => ExtractionConfig::default(),
    };
    if args.dpi.is_some() {
        config.dpi_override = args.dpi;
        config.validate()?;
    }
    Ok(config)
}

fn extract(args: ExtractArgs) -> Result<ExitCode> {
    let config = load_config(&args)?;
    let ocr_config = match &args.model_dir {
        Some(dir) => OcrConfig::from_dir(dir),
        None => OcrConfig::default(),
    };

    let pipeline = ExtractionPipeline::new(
        Box::new(OcrsBackend::new(ocr_config)?),
        Box::new(PdfiumRenderer::new()?),
        config,
    )?;

    let locator = match (&args.container, &args.key) {
        (Some(container), Some(key)) => Some(StorageLocator::new(container.as_str(), key.as_str())),
        _ => None,
    };

    let bytes = match (&args.path, &args.store_root, &locator) {
        (Some(path), _, _) => std::fs::read(path)?,
        (None, Some(root), Some(locator)) => FsObjectStore::new(root).download(locator)?,
        _ => {
            return Err(LesewerkError::Config(
                "give a document path or --store-root with --container and --key".into(),
            ));
        }
    };

    let flags = FeatureFlags {
        detect_tables: args.tables,
        detect_forms: args.forms,
    };
    let mut request = ExtractionRequest::new(bytes).with_flags(flags);
    if let Some(locator) = locator {
        request = request.with_locator(locator);
    }

    match pipeline.extract(&request) {
        Ok(extracted) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&extracted)?);
            } else {
                eprintln!(
                    "[{}] pages: {}, confidence: {}",
                    extracted.method,
                    extracted.pages,
                    extracted
                        .confidence
                        .map(|c| format!("{c:.1}"))
                        .unwrap_or_else(|| "n/a".into())
                );
                println!("{}", extracted.text);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(failure) if failure.wants_caller_fallback() => {
            info!("Every OCR strategy was refused; reading the embedded text layer");
            match extract_embedded_text(&request.bytes) {
                Ok(text) if !text.trim().is_empty() => {
                    if args.json {
                        let value = json!({
                            "text": text,
                            "confidence": null,
                            "method": EMBEDDED_TEXT_LABEL,
                            "format": detect_format(&request.bytes),
                        });
                        println!("{}", serde_json::to_string_pretty(&value)?);
                    } else {
                        eprintln!("[{EMBEDDED_TEXT_LABEL}]");
                        println!("{text}");
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Ok(_) => report_failure(&failure),
                Err(err) => {
                    warn!(%err, "Embedded text unavailable");
                    report_failure(&failure)
                }
            }
        }
        Err(failure) => report_failure(&failure),
    }
}

fn report_failure(failure: &ExtractionFailure) -> Result<ExitCode> {
    let human = humanize_failure(failure);
    eprintln!("{}", human.message);
    eprintln!("{}", human.suggestion);
    Ok(ExitCode::FAILURE)
}

fn inspect(path: PathBuf, json: bool) -> Result<ExitCode> {
    let bytes = std::fs::read(&path)?;
    let format = detect_format(&bytes);
    let inspection = (format == DocumentFormat::Pdf).then(|| inspect_pdf(&bytes));

    if json {
        let value = json!({
            "path": path.display().to_string(),
            "bytes": bytes.len(),
            "format": format,
            "mime_type": format.mime_type(),
            "pdf": inspection,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}: {} ({} bytes)", path.display(), format, bytes.len());
        if let Some(inspection) = inspection {
            match inspection.page_count {
                Some(pages) => println!("pages: {pages}"),
                None => println!("pages: unknown (structure not parseable)"),
            }
            println!("encrypted: {}", inspection.encrypted);
        }
    }
    Ok(ExitCode::SUCCESS)
}
