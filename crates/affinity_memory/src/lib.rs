pub mod sqlite;

pub use sqlite::SqliteBranchStore;
