use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("MONGODB_URI not found in environment variables")]
    MissingUri,

    #[error("Failed to connect to MongoDB: {0}")]
    Connection(#[source] StoreError),

    #[error("Error cleaning {name}: {source}")]
    Collection {
        name: String,
        #[source]
        source: StoreError,
    },
}
