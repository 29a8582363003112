use crate::world::kinds::KindId;
use crate::world::position::Position;
use thiserror::Error;

/// Failures raised by the world core.
///
/// Everything recoverable inside the tile layer is signalled through
/// `Option` returns; a `WorldError` always aborts the operation in progress.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A kind id referenced by world data has no prototype. Corrupt data.
    #[error("unknown kind id {0}")]
    UnknownKind(KindId),

    #[error("no tile at ({}, {}, {})", .0.x, .0.y, .0.z)]
    UnknownTile(Position),

    #[error("duplicate kind id {0}")]
    DuplicateKind(KindId),

    #[error("invalid count {count} for kind {kind}")]
    InvalidCount { kind: KindId, count: u16 },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl WorldError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        WorldError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type WorldResult<T> = Result<T, WorldError>;
