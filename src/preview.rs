//! `inkpad render`: render a markdown file with the configured options.
//!
//! Writes to `--output` when given, otherwise to stdout for piping.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use inkpad_core::render::RenderCache;

use crate::config::Config;
use crate::markdown::PulldownRenderer;

pub fn render_file(config: &Config, file: &Path) -> Result<String> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut cache = RenderCache::new(Arc::new(PulldownRenderer::new()));
    Ok(cache.render(&config.render, &text))
}

pub fn run_render(config: &Config, file: &Path, output: Option<&Path>) -> Result<()> {
    let html = render_file(config, file)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &html)?;
            eprintln!("Rendered {} to {}", file.display(), path.display());
        }
        None => {
            println!("{}", html);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn renders_file_with_config() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("post.md");
        std::fs::write(&file, "# Hi\n\nSee [docs](https://example.com).").unwrap();
        let html = render_file(&Config::minimal(), &file).unwrap();
        assert!(html.contains("Hi</h1>"));
        assert!(html.contains("https://example.com"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(render_file(&Config::minimal(), &tmp.path().join("nope.md")).is_err());
    }
}
