//! Batch masking of PDF files on disk.

use anyhow::{bail, Context, Result};
use josamask_core::{MaskConfig, Tokenizer};
use josamask_verify::{verify_output, VerifyOptions};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SUFFIX: &str = "_masked";

#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub files: Vec<PathBuf>,
    pub output_directory: PathBuf,
    pub suffix: String,
    /// Re-read every output and check it against its source.
    pub verify: bool,
    /// Write a JSON report next to every output.
    pub report: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub success: bool,
    pub processed_files: Vec<String>,
    pub errors: Vec<String>,
}

/// `<dir>/<stem><suffix>.pdf`
pub fn output_path(input: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    output_dir.join(format!("{}{}.pdf", stem, suffix))
}

/// Masks every file of the request. A failing file is reported and the batch
/// goes on.
pub fn process_pdfs<T: Tokenizer + ?Sized>(
    request: &ProcessRequest,
    config: &MaskConfig,
    tokenizer: &T,
) -> Result<ProcessResult> {
    let mut processed_files = Vec::new();
    let mut errors = Vec::new();

    fs::create_dir_all(&request.output_directory).with_context(|| {
        format!(
            "cannot create output directory {}",
            request.output_directory.display()
        )
    })?;

    for input in &request.files {
        match process_pdf_file(input, request, config, tokenizer) {
            Ok(output) => processed_files.push(output.to_string_lossy().to_string()),
            Err(e) => {
                let filename = input
                    .file_name()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| input.display().to_string());
                log::error!("[Process] {}: {:#}", filename, e);
                errors.push(format!("{}: {:#}", filename, e));
            }
        }
    }

    Ok(ProcessResult {
        success: errors.is_empty(),
        processed_files,
        errors,
    })
}

fn process_pdf_file<T: Tokenizer + ?Sized>(
    input: &Path,
    request: &ProcessRequest,
    config: &MaskConfig,
    tokenizer: &T,
) -> Result<PathBuf> {
    let output = output_path(input, &request.output_directory, &request.suffix);
    if output == input {
        bail!("output would overwrite the input, use a non-empty suffix");
    }

    let source = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;
    let (masked, report) = josamask_pdf::mask_pdf_with_report(&source, config, tokenizer)?;

    if request.verify {
        let result = verify_output(&source, &masked, &report, config.mode, &VerifyOptions::default())?;
        if !result.ok {
            bail!("verification failed: {}", result.warnings.join("; "));
        }
    }

    fs::write(&output, masked).with_context(|| format!("cannot write {}", output.display()))?;
    if request.report {
        let report_path = output.with_extension("json");
        fs::write(&report_path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("cannot write {}", report_path.display()))?;
    }

    log::info!(
        "[Process] {} -> {} ({} areas)",
        input.display(),
        output.display(),
        report.rects_applied()
    );
    Ok(output)
}
