pub mod cleanup;
pub mod error;
pub mod mongo;
pub mod store;

pub use cleanup::{
    clean_with_confirmation, collect_stats, run_cleanup, CleanupReport, CollectionOutcome,
    COLLECTIONS,
};
pub use error::{CleanupError, StoreError};
pub use mongo::MongoStore;
pub use store::{DocumentStore, MemoryStore};
