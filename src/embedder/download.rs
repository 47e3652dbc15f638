/// Model file download from the Hugging Face hub.
///
/// Fetches the ONNX export and tokenizer of a sentence-transformers model
/// into a local directory, skipping files already present.
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

const HF_BASE: &str = "https://huggingface.co/sentence-transformers";

/// Local file name → path inside the model repository.
const MODEL_FILES: &[(&str, &str)] = &[
    ("model.onnx", "onnx/model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
];

/// Check whether all required model files exist in `model_dir`.
#[must_use]
pub fn all_files_present(model_dir: &Path) -> bool {
    MODEL_FILES
        .iter()
        .all(|(name, _)| model_dir.join(name).exists())
}

fn file_url(model_name: &str, repo_path: &str) -> String {
    format!("{HF_BASE}/{model_name}/resolve/main/{repo_path}")
}

/// Download any missing model files for `model_name` into `model_dir`.
pub fn download_model_files(model_name: &str, model_dir: &Path) -> Result<()> {
    fs::create_dir_all(model_dir)
        .with_context(|| format!("failed to create model directory: {}", model_dir.display()))?;

    for &(filename, repo_path) in MODEL_FILES {
        let dest = model_dir.join(filename);
        if dest.exists() {
            info!(file = filename, "Model file already present");
            continue;
        }

        let url = file_url(model_name, repo_path);
        info!(file = filename, %url, "Downloading model file");
        download_file(&dest, &url).with_context(|| format!("failed to download {filename}"))?;
    }

    info!(model = model_name, dir = %model_dir.display(), "Model files ready");
    Ok(())
}

/// Stream one file to disk behind a progress bar.
///
/// Writes to a `.part` file first so an interrupted download is retried on
/// the next run instead of being mistaken for a complete file.
fn download_file(dest: &Path, url: &str) -> Result<()> {
    let mut resp =
        reqwest::blocking::get(url).with_context(|| format!("HTTP request failed: {url}"))?;

    if !resp.status().is_success() {
        anyhow::bail!("bad status: {} for {url}", resp.status());
    }

    let pb = match resp.content_length() {
        Some(total) if total > 0 => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {percent}% ({bytes}/{total_bytes}) {msg}")
                    .context("invalid progress template")?
                    .progress_chars("█▓░"),
            );
            pb
        }
        _ => ProgressBar::new_spinner(),
    };

    let partial = dest.with_extension("part");
    let file = fs::File::create(&partial)
        .with_context(|| format!("failed to create file: {}", partial.display()))?;

    io::copy(&mut resp, &mut pb.wrap_write(file)).context("failed to write model file")?;
    pb.finish_and_clear();

    fs::rename(&partial, dest)
        .with_context(|| format!("failed to move {} into place", partial.display()))?;
    Ok(())
}
