mod decision;
mod decision_log;
mod ingest;
mod registry;
mod resolver;
mod splitter;
mod store;

pub use decision::{ArtistChoice, DecisionChannel, PromptChannel};
pub use decision_log::DecisionLog;
pub use ingest::{
    check_tree, extract_fields, mp3_files, Ingestor, ItemFields, ItemOutcome, RunSummary,
    SkipReason,
};
pub use registry::{ArtistRegistry, ResolvedArtist};
pub use resolver::{suggest, FuzzyResolver, ResolverPolicy};
pub use splitter::{auto_split, normalize, split};
pub use store::{
    CatalogStats, CatalogStore, ItemRecord, NewTrack, PersistOutcome, TrackLocation,
};

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Redb(redb::Error),
    Bincode(Box<bincode::ErrorKind>),
    KeyParse(String),
    Decision(std::io::Error),
    BlankArtistName,
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "io error: {}", err),
            CatalogError::Redb(err) => write!(f, "db error: {}", err),
            CatalogError::Bincode(err) => write!(f, "bincode error: {}", err),
            CatalogError::KeyParse(value) => write!(f, "key parse error: {}", value),
            CatalogError::Decision(err) => write!(f, "no decision available: {}", err),
            CatalogError::BlankArtistName => write!(f, "artist name is blank"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<redb::Error> for CatalogError {
    fn from(err: redb::Error) -> Self {
        CatalogError::Redb(err)
    }
}

impl From<redb::DatabaseError> for CatalogError {
    fn from(err: redb::DatabaseError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<redb::TableError> for CatalogError {
    fn from(err: redb::TableError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<redb::TransactionError> for CatalogError {
    fn from(err: redb::TransactionError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<redb::StorageError> for CatalogError {
    fn from(err: redb::StorageError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<redb::CommitError> for CatalogError {
    fn from(err: redb::CommitError) -> Self {
        CatalogError::Redb(err.into())
    }
}

impl From<Box<bincode::ErrorKind>> for CatalogError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        CatalogError::Bincode(err)
    }
}
