//! Manifest writing.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{TemplateError, TemplateResult};
use crate::renderer::TemplateRenderer;
use crate::variables::TemplateVariables;

/// Renders templates and persists the result.
///
/// Generated manifests are disposable: an existing file at the destination is
/// always overwritten.
#[derive(Debug, Clone, Default)]
pub struct ManifestWriter {
    renderer: TemplateRenderer,
}

impl ManifestWriter {
    pub fn new(renderer: TemplateRenderer) -> Self {
        Self { renderer }
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Render `template` and write it to `destination`.
    ///
    /// Returns the rendered text. Both directory creation and the write itself
    /// fail with [`TemplateError::WriteFailure`].
    pub fn write(
        &self,
        template: &str,
        variables: &TemplateVariables,
        destination: &Path,
    ) -> TemplateResult<String> {
        let rendered = self.renderer.render(template, variables);

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|source| TemplateError::WriteFailure {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(destination, &rendered).map_err(|source| TemplateError::WriteFailure {
            path: destination.to_path_buf(),
            source,
        })?;

        info!("Wrote manifest {:?}", destination);
        debug!("Manifest size: {} bytes", rendered.len());
        Ok(rendered)
    }
}
