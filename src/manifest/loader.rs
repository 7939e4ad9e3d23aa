//! Loading and saving manifests

use std::fs;
use std::path::Path;

use super::schema::Manifest;
use super::validation::{validate_manifest, ManifestError, ValidationResult};

/// Parse and validate a manifest from YAML text. Paths are left as written.
pub fn parse_manifest(yaml: &str) -> ValidationResult<Manifest> {
    let manifest: Manifest = serde_yaml::from_str(yaml).map_err(|e| ManifestError::Parse {
        path: "<inline>".to_string(),
        message: e.to_string(),
    })?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// Load, validate, and resolve a manifest file.
///
/// Relative dataset paths and `output_dir` are resolved against the
/// manifest's directory, so a job behaves the same from any working directory.
pub fn load_manifest(path: &Path) -> ValidationResult<Manifest> {
    let display = path.display().to_string();
    let yaml = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: display.clone(),
        source,
    })?;

    let mut manifest = parse_manifest(&yaml).map_err(|e| match e {
        ManifestError::Parse { message, .. } => ManifestError::Parse {
            path: display.clone(),
            message,
        },
        other => other,
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    manifest.resolve_paths(base);
    Ok(manifest)
}

/// Write a manifest as YAML
pub fn save_manifest(manifest: &Manifest, path: &Path) -> ValidationResult<()> {
    let yaml = serde_yaml::to_string(manifest).map_err(|e| ManifestError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ManifestError::Io {
            path: parent.display().to_string(),
            source,
        })?;
    }
    fs::write(path, yaml).map_err(|source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl Manifest {
    /// Resolve relative paths against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        self.dataset = self.dataset.resolve(base);
        if self.output_dir.is_relative() {
            self.output_dir = base.join(&self.output_dir);
        }
    }
}
