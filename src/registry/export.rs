//! Export: write registry contexts back out as portable files.
//!
//! Exported documents have the server-assigned `id` and `created_at` removed so
//! they can be re-submitted with `create` unchanged.

use super::{ContextReference, RegistryClient};
use crate::context::{Context, DocumentFormat};
use crate::error::ClientError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Characters of the id used to disambiguate bulk export file names.
const ID_PREFIX_LEN: usize = 8;

/// One context that could not be exported during a bulk export
#[derive(Debug)]
pub struct ExportFailure {
    pub id: String,
    pub error: ClientError,
}

/// Outcome of a bulk export
#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<ExportFailure>,
}

impl ExportReport {
    /// True when the registry listed no contexts at all.
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.failures.is_empty()
    }
}

/// `{context_name}-{first 8 chars of id}.{ext}`
///
/// Both parts come from the registry, so a name or id that could leave the
/// export directory is rejected as `InvalidContext`.
pub fn export_file_name(
    context_name: &str,
    id: &str,
    format: DocumentFormat,
) -> Result<String, ClientError> {
    let prefix: String = id.chars().take(ID_PREFIX_LEN).collect();
    for part in [context_name, prefix.as_str()] {
        if !is_plain_file_component(part) {
            return Err(ClientError::InvalidContext(format!(
                "context {} has an unsafe name for export: {:?}",
                id, part
            )));
        }
    }
    Ok(format!("{}-{}.{}", context_name, prefix, format.extension()))
}

// Non-empty, no separators, not a dot entry.
fn is_plain_file_component(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && part != ".."
        && !part.contains(['/', '\\', '\0'])
        && !Path::new(part).is_absolute()
}

fn write_document(path: &Path, context: &Context, format: DocumentFormat) -> Result<(), ClientError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, context.serialize(format)?)?;
    Ok(())
}

impl RegistryClient {
    /// Fetch a context with server-assigned fields removed.
    pub async fn export(&self, id: &str) -> Result<Context, ClientError> {
        let mut context = self.get(id).await?;
        context.strip_server_fields();
        Ok(context)
    }

    /// Export one context to `path`, creating parent directories.
    pub async fn export_to_file(
        &self,
        id: &str,
        path: &Path,
        format: DocumentFormat,
    ) -> Result<PathBuf, ClientError> {
        let context = self.export(id).await?;
        write_document(path, &context, format)?;
        info!(context_id = %id, path = %path.display(), "Context exported");
        Ok(path.to_path_buf())
    }

    /// Export every listed context into `dir`.
    ///
    /// A failure to list is fatal. Individual contexts that fail are recorded
    /// and skipped, except connection failures, which abort the run.
    pub async fn export_all(
        &self,
        dir: &Path,
        format: DocumentFormat,
    ) -> Result<ExportReport, ClientError> {
        std::fs::create_dir_all(dir)?;
        let list = self.list().await?;

        let mut report = ExportReport::default();
        for reference in &list.contexts {
            match self.export_reference(reference, dir, format).await {
                Ok(path) => report.written.push(path),
                Err(err @ ClientError::ConnectionFailure { .. }) => return Err(err),
                Err(err) => {
                    warn!(context_id = %reference.id, error = %err, "Skipping context during export");
                    report.failures.push(ExportFailure {
                        id: reference.id.clone(),
                        error: err,
                    });
                }
            }
        }

        info!(
            written = report.written.len(),
            failed = report.failures.len(),
            dir = %dir.display(),
            "Bulk export finished"
        );
        Ok(report)
    }

    async fn export_reference(
        &self,
        reference: &ContextReference,
        dir: &Path,
        format: DocumentFormat,
    ) -> Result<PathBuf, ClientError> {
        let context = self.export(&reference.id).await?;
        let name = context
            .context_name()
            .filter(|name| !name.is_empty())
            .or_else(|| Some(reference.context_name.as_str()).filter(|name| !name.is_empty()))
            .ok_or_else(|| {
                ClientError::InvalidContext(format!("context {} has no context_name", reference.id))
            })?
            .to_string();

        let path = dir.join(export_file_name(&name, &reference.id, format)?);
        write_document(&path, &context, format)?;
        Ok(path)
    }
}
