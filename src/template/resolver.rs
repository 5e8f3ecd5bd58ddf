//! Template loading with a process-wide compiled-template cache

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::fs;

use crate::config::TemplateConfig;

use super::renderer::Renderer;
use super::types::{validate_name, TemplateError, TemplateResult};

const TEMPLATE_EXTENSION: &str = "html";

/// Resolves template names to compiled renderers.
///
/// Templates live at `<root>/<name>.html` and are wrapped by the layout at
/// `<layouts>/<layout>.html`. Files in the partials directory are available
/// to both as `partials/<file>.html`. A renderer is compiled the first time
/// its name is resolved and cached for the life of the resolver.
pub struct TemplateResolver {
    root: PathBuf,
    layouts: PathBuf,
    partials: PathBuf,
    layout: String,
    cache: DashMap<String, Arc<Renderer>>,
}

impl TemplateResolver {
    pub fn new(config: &TemplateConfig) -> Self {
        Self {
            root: config.root.clone(),
            layouts: config.layouts.clone(),
            partials: config.partials.clone(),
            layout: config.layout.clone(),
            cache: DashMap::new(),
        }
    }

    /// Resolve a template by name, compiling it on first use.
    ///
    /// Concurrent first resolutions of the same name may each compile; the
    /// first renderer stored wins and is returned to every caller.
    pub async fn resolve(&self, name: &str) -> TemplateResult<Arc<Renderer>> {
        validate_name(name)?;

        if let Some(renderer) = self.cached(name) {
            return Ok(renderer);
        }

        let compiled = Arc::new(self.compile(name).await?);
        let renderer = self
            .cache
            .entry(name.to_string())
            .or_insert(compiled)
            .value()
            .clone();

        tracing::debug!(template = %name, "Template compiled and cached");
        Ok(renderer)
    }

    /// Compile the given templates ahead of first use.
    ///
    /// Failures are logged and skipped; they surface again when a request
    /// asks for the template.
    pub async fn preload(&self, names: &[String]) {
        for name in names {
            match self.resolve(name).await {
                Ok(_) => tracing::info!(template = %name, "Template preloaded"),
                Err(e) => tracing::warn!(template = %name, error = %e, "Failed to preload template"),
            }
        }
    }

    /// Check if a template is already compiled
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Get the number of compiled templates
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    fn cached(&self, name: &str) -> Option<Arc<Renderer>> {
        self.cache.get(name).map(|entry| entry.value().clone())
    }

    async fn compile(&self, name: &str) -> TemplateResult<Renderer> {
        let body = read_source(&source_path(&self.root, name), name).await?;

        let layout_name = format!("layouts/{}", self.layout);
        let layout = read_source(&source_path(&self.layouts, &self.layout), &layout_name).await?;

        let partials = self.load_partials().await?;

        Renderer::compile(name, body, layout, partials)
    }

    async fn load_partials(&self) -> TemplateResult<Vec<(String, String)>> {
        let io_error = |source: io::Error| TemplateError::Io {
            name: "partials".to_string(),
            source,
        };

        let mut entries = match fs::read_dir(&self.partials).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };

        let mut partials = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(TEMPLATE_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let source = fs::read_to_string(&path).await.map_err(io_error)?;
            partials.push((format!("partials/{}", file_name), source));
        }

        Ok(partials)
    }
}

fn source_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, TEMPLATE_EXTENSION))
}

async fn read_source(path: &Path, name: &str) -> TemplateResult<String> {
    fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            TemplateError::NotFound(name.to_string())
        } else {
            TemplateError::Io {
                name: name.to_string(),
                source: e,
            }
        }
    })
}
