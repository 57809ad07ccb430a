//! # Rewebp Core
//!
//! Engine for migrating an existing image library to WebP: batched,
//! resumable, at-least-once conversion of catalogued originals plus a
//! transactional rewrite of every stored reference to the renamed files.
//!
//! ## Overview
//!
//! - **Batch orchestration**: [`batch::BatchOrchestrator`] pages through
//!   the convertible set under a wall-clock budget and hands the caller a
//!   resumption cursor.
//! - **Item conversion**: [`convert::ItemConverter`] transcodes one
//!   catalogued original, its size renditions included, and keeps catalog
//!   and storage consistent.
//! - **Reference rewriting**: [`rewrite::ReferenceRewriter`] replaces old
//!   locators across the content tables inside one transaction.
//! - **Upload interception**: [`upload::UploadInterceptor`] converts new
//!   uploads in place so fresh content never needs the batch path.
//!
//! ## Architecture
//!
//! Engine logic depends only on the traits in [`database::ports`],
//! [`storage`], [`codec`], and [`cache`]; the Postgres implementations
//! live under [`database::repositories`] and the filesystem/codec
//! defaults next to their traits. Wire concrete backends at construction
//! time and the rest of the engine never sees them.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use rewebp_core::{
//!     batch::BatchOrchestrator,
//!     cache::NoopCache,
//!     codec::RasterCodec,
//!     config::ConverterConfig,
//!     convert::ItemConverter,
//!     database::repositories::{PostgresCatalogRepository, PostgresReferenceStore},
//!     rewrite::ReferenceRewriter,
//!     storage::LocalStorage,
//! };
//! use rewebp_model::BatchRequest;
//!
//! async fn migrate(pool: sqlx::PgPool) -> rewebp_core::Result<()> {
//!     let config = ConverterConfig::default();
//!     let catalog = Arc::new(PostgresCatalogRepository::new(pool.clone()));
//!     let storage = Arc::new(LocalStorage::new(&config.upload_root));
//!     let cache = Arc::new(NoopCache);
//!     let rewriter = ReferenceRewriter::new(
//!         Arc::new(PostgresReferenceStore::new(pool)),
//!         cache.clone(),
//!         config.base_url.clone(),
//!     );
//!     let converter = ItemConverter::new(
//!         catalog.clone(),
//!         storage.clone(),
//!         Arc::new(RasterCodec::new()),
//!         rewriter.clone(),
//!         cache,
//!         config.quality,
//!     );
//!     let mut request = BatchRequest::new(config.batch_size, 0);
//!     let orchestrator =
//!         BatchOrchestrator::new(catalog, storage, converter, rewriter, config);
//!
//!     loop {
//!         let report = orchestrator.run_batch(request.clone()).await?;
//!         if report.completed {
//!             break;
//!         }
//!         request.offset = report.next_offset;
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod cache;
pub mod codec;
pub mod config;
pub mod convert;
pub mod database;
pub mod error;
pub mod rewrite;
pub mod storage;
pub mod upload;

pub use batch::BatchOrchestrator;
pub use cache::{EntityCache, NoopCache};
pub use codec::{ImageCodec, RasterCodec};
pub use config::ConverterConfig;
pub use convert::ItemConverter;
pub use error::{ConvertError, Result};
pub use rewrite::ReferenceRewriter;
pub use storage::{LocalStorage, Storage};
pub use upload::{StagedUpload, UploadInterceptor};
