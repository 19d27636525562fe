use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Db(#[from] dealflow_db::DbError),

    #[error(transparent)]
    Feed(#[from] dealflow_feeds::FeedError),

    #[error(transparent)]
    Catalog(#[from] dealflow_catalog::CatalogError),
}
