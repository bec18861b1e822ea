use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// File-backed liquid templates with an mtime-validated cache, so edits show
/// up without a restart. Rendering failures surface as strings for the
/// handlers to turn into 500s.
pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, path: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(path);

        let metadata = tokio::fs::metadata(&template_path)
            .await
            .map_err(|e| format!("Failed to get metadata for {}: {}", path, e))?;

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(path) {
            if cached.modified >= modified {
                debug!("Using cached template for {}", path);
                return Ok(cached.content.clone());
            }
        }

        info!("Loading template: {}", path);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", path, e))?;

        cache.insert(
            path.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    /// Renders a page template by name ("index" loads index.html.liquid),
    /// injecting the shared header/footer partials into the globals.
    pub async fn render(&self, name: &str, globals: liquid::Object) -> Result<String, String> {
        let header_content = self
            .load_template("_header.html.liquid")
            .await
            .unwrap_or_else(|e| {
                error!("Failed to load header: {}", e);
                String::new()
            });

        let footer_content = self
            .load_template("_footer.html.liquid")
            .await
            .unwrap_or_else(|e| {
                error!("Failed to load footer: {}", e);
                String::new()
            });

        let template_content = self.load_template(&format!("{}.html.liquid", name)).await?;

        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|e| format!("Failed to create parser: {}", e))?;

        let template = parser
            .parse(&template_content)
            .map_err(|e| format!("Failed to parse template: {}", e))?;

        let mut full_globals = globals;
        full_globals.insert(
            "header".into(),
            liquid::model::Value::Scalar(header_content.into()),
        );
        full_globals.insert(
            "footer".into(),
            liquid::model::Value::Scalar(footer_content.into()),
        );

        template
            .render(&full_globals)
            .map_err(|e| format!("Failed to render template: {}", e))
    }
}
