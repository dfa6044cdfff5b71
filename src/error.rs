// 🚨 Error Taxonomy - One variant per pipeline stage
// Stage internals use anyhow + context; the stage boundary collapses the
// chain into one of these four kinds so the driver can stop on the first one.

use thiserror::Error;

/// Failure of one pipeline stage.
///
/// Each variant carries the full cause chain rendered as text
/// (`"{:#}"` of the underlying `anyhow::Error`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EtlError {
    /// Page unreachable, target table missing, or a row could not be parsed
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Rate source unreachable/malformed, or a required currency missing
    #[error("transformation failed: {0}")]
    Transformation(String),

    /// CSV or relational sink could not be opened or written
    #[error("load failed: {0}")]
    Load(String),

    /// Store or table absent at query time
    #[error("query failed: {0}")]
    Query(String),
}

/// Pipeline stage, used to pick the error kind at a stage boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Transform,
    Load,
    Query,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Extract => "extraction",
            Stage::Transform => "transformation",
            Stage::Load => "load",
            Stage::Query => "query",
        }
    }

    /// Wrap an internal error into this stage's error kind
    pub fn error(&self, err: &anyhow::Error) -> EtlError {
        let cause = format!("{:#}", err);
        match self {
            Stage::Extract => EtlError::Extraction(cause),
            Stage::Transform => EtlError::Transformation(cause),
            Stage::Load => EtlError::Load(cause),
            Stage::Query => EtlError::Query(cause),
        }
    }
}

impl EtlError {
    pub fn stage(&self) -> Stage {
        match self {
            EtlError::Extraction(_) => Stage::Extract,
            EtlError::Transformation(_) => Stage::Transform,
            EtlError::Load(_) => Stage::Load,
            EtlError::Query(_) => Stage::Query,
        }
    }
}
