pub mod catalog;
pub mod references;

pub use catalog::PostgresCatalogRepository;
pub use references::PostgresReferenceStore;
