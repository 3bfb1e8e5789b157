pub mod comments_repo;
pub mod memory;
pub mod migrations;
pub mod object_ids;
pub mod pool;
pub mod reactions_repo;
pub mod store;

pub use comments_repo::PgStore;
pub use memory::MemoryStore;
pub use migrations::run_migrations;
pub use object_ids::IdGenerator;
pub use pool::{connect_lazy, DbPool, DbPoolError};
pub use store::{CommentStore, ReactionLedger, StoreError};
