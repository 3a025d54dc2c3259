//! `lazy` command: run the page startup sequence over an HTML file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::VitrineConfig;
use crate::dom::Document;
use crate::store::FileStore;
use crate::storefront::{Capabilities, Page};
use crate::{debug, log};

/// Process `html` and return the rewritten markup.
///
/// Without intersection observation every deferred element is loaded in
/// the output. The WebP marker is only written when `webp_probe` is set.
pub fn render_page(
    html: &Path,
    capabilities: Capabilities,
    config: &VitrineConfig,
) -> Result<String> {
    let source = fs::read_to_string(html)
        .with_context(|| format!("failed to read `{}`", html.display()))?;
    let doc = Document::parse(&source)
        .with_context(|| format!("failed to parse `{}`", html.display()))?;
    let store = FileStore::open(&config.compare.storage)?;

    let page = Page::boot(doc, config, Box::new(store), capabilities)?;
    debug!(
        "lazy";
        "{} deferred, webp {:?}",
        page.loader().pending(),
        page.webp_supported()
    );

    Ok(page.into_document().to_html())
}

/// Write the processed page to `output`, or stdout.
pub fn run(
    html: &Path,
    output: Option<&Path>,
    capabilities: Capabilities,
    config: &VitrineConfig,
) -> Result<()> {
    let rendered = render_page(html, capabilities, config)?;
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write `{}`", path.display()))?;
            log!("lazy"; "wrote {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
