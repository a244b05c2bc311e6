pub mod marketplace;
pub mod migration;
pub mod scoped_repository;

pub use marketplace::Marketplace;
pub use migration::{run_migration, split_statements, MigrationReport};
pub use scoped_repository::ScopedRepository;
