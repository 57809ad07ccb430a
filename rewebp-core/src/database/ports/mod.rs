pub mod catalog;
pub mod references;

pub use catalog::CatalogPort;
pub use references::ReferenceStore;
