use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("malformed record under key {0}")]
    Malformed(String),

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("write batch is already in use")]
    BatchBusy,
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<bincode::Error> for LmdbError {
    fn from(e: bincode::Error) -> Self {
        LmdbError::Serialization(e.to_string())
    }
}

impl From<LmdbError> for agora_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Serialization(msg) => agora_store::StoreError::Serialization(msg),
            LmdbError::Malformed(msg) => agora_store::StoreError::Corruption(msg),
            LmdbError::Overflow(msg) => agora_store::StoreError::Overflow(msg),
            other => agora_store::StoreError::Backend(other.to_string()),
        }
    }
}
