//! `compress` command: the upload compressor applied to a file on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::VitrineConfig;
use crate::image::upload::{FAILURE_TEXT, Notice, PROGRESS_TEXT, UploadFile};
use crate::log;
use crate::logger::StatusLine;
use crate::utils::mime;

/// Compress `input` into `output` (default `<stem>.min.jpg`).
pub fn compress_file(input: &Path, output: Option<&Path>, config: &VitrineConfig) -> Result<PathBuf> {
    let mime = mime::from_path(input);
    if !mime::is_image(mime) {
        bail!("`{}` is not an image ({})", input.display(), mime);
    }
    if !mime::is_decodable_image(mime) {
        bail!("`{}` cannot be compressed: no codec for {}", input.display(), mime);
    }

    let bytes = fs::read(input).with_context(|| format!("failed to read `{}`", input.display()))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = UploadFile::new(name, mime, bytes);
    let output = output.map_or_else(|| default_output(input), Path::to_path_buf);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start compression runtime")?;
    let compressor = config.compress.compressor();

    let mut status = StatusLine::new();
    status.pending(PROGRESS_TEXT);

    let image = match runtime.block_on(compressor.compress(&file)) {
        Ok(image) => image,
        Err(e) => {
            status.error(FAILURE_TEXT, &e.to_string());
            return Err(e).with_context(|| format!("failed to compress `{}`", input.display()));
        }
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, &image.bytes)
        .with_context(|| format!("failed to write `{}`", output.display()))?;

    status.success(&Notice::success(file.size(), image.size()).text);
    log!("compress"; "{} ({}x{})", output.display(), image.width, image.height);
    Ok(output)
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_owned());
    input.with_file_name(format!("{stem}.min.jpg"))
}
