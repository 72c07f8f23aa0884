//! Error and diagnostic types shared by the asset source, the store and the shell.

use std::fmt;
use std::path::PathBuf;

/// Failures raised while reading from an [`AssetSource`](crate::asset_source::AssetSource).
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Entry not in source: {0}")]
    MissingEntry(String),
}

/// Failures of store-level operations. None of these leave the store half-updated.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("No archive is open")]
    NoSource,

    #[error("No pack directory has been chosen")]
    NoPath,

    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why an edited asset was kept by duplicate removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    MissingInSource,
    SizeMismatch {
        edited: (u32, u32),
        original: (u32, u32),
    },
    Unreadable(String),
}

/// A per-asset note produced by duplicate removal. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::MissingInSource => write!(f, "{}: not in archive", self.path),
            DiagnosticKind::SizeMismatch { edited, original } => write!(
                f,
                "{}: size mismatch (edited {}x{}, original {}x{})",
                self.path, edited.0, edited.1, original.0, original.1
            ),
            DiagnosticKind::Unreadable(reason) => {
                write!(f, "{}: original unreadable ({reason})", self.path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound("assets/minecraft/textures/block/dirt.png".to_string());
        assert_eq!(
            err.to_string(),
            "Asset not found: assets/minecraft/textures/block/dirt.png"
        );
        assert_eq!(StoreError::NoSource.to_string(), "No archive is open");
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic {
            path: "pack.png".to_string(),
            kind: DiagnosticKind::SizeMismatch {
                edited: (4, 4),
                original: (8, 8),
            },
        };
        assert_eq!(
            diag.to_string(),
            "pack.png: size mismatch (edited 4x4, original 8x8)"
        );
    }
}
