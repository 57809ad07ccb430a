//! In-memory test doubles for the engine's ports, plus a wired harness.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rewebp_core::batch::BatchOrchestrator;
use rewebp_core::cache::EntityCache;
use rewebp_core::codec::ImageCodec;
use rewebp_core::config::ConverterConfig;
use rewebp_core::convert::ItemConverter;
use rewebp_core::database::ports::{CatalogPort, ReferenceStore};
use rewebp_core::error::{ConvertError, Result};
use rewebp_core::rewrite::ReferenceRewriter;
use rewebp_core::storage::Storage;
use rewebp_model::{
    CatalogItem, DateFilter, ItemStatus, LocatorPair, SizeVariant, SourceFormat,
};
use url::Url;
use uuid::Uuid;

/// Bytes every successful fake transcode produces.
pub const FAKE_WEBP: &[u8] = b"RIFF0000WEBPfake";

// ---------------------------------------------------------------------
// Catalog

/// Catalog backed by a plain vector in insertion order, with the same
/// convertible predicate as the Postgres repository.
#[derive(Default)]
pub struct MemoryCatalog {
    items: Mutex<Vec<CatalogItem>>,
}

impl MemoryCatalog {
    pub fn insert(&self, item: CatalogItem) {
        self.items.lock().unwrap().push(item);
    }

    pub fn item(&self, id: Uuid) -> Option<CatalogItem> {
        self.items.lock().unwrap().iter().find(|i| i.id == id).cloned()
    }

    fn convertible(item: &CatalogItem, filter: Option<DateFilter>) -> bool {
        item.status == ItemStatus::Attached
            && SourceFormat::from_mime(&item.mime).is_some()
            && filter.is_none_or(|f| f.contains(item.created_at))
    }

    fn take_page(ids: Vec<Uuid>, limit: i64, offset: i64) -> Vec<Uuid> {
        let offset = offset.max(0) as usize;
        let limit = if limit < 0 { usize::MAX } else { limit as usize };
        ids.into_iter().skip(offset).take(limit).collect()
    }
}

#[async_trait]
impl CatalogPort for MemoryCatalog {
    async fn list_convertible(
        &self,
        limit: i64,
        offset: i64,
        filter: Option<DateFilter>,
    ) -> Result<Vec<Uuid>> {
        let ids = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| Self::convertible(i, filter))
            .map(|i| i.id)
            .collect();
        Ok(Self::take_page(ids, limit, offset))
    }

    async fn count_convertible(&self, filter: Option<DateFilter>) -> Result<i64> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| Self::convertible(i, filter))
            .count() as i64)
    }

    async fn list_converted(&self, limit: i64, offset: i64) -> Result<Vec<Uuid>> {
        let ids = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.status == ItemStatus::Attached && i.mime == "image/webp")
            .map(|i| i.id)
            .collect();
        Ok(Self::take_page(ids, limit, offset))
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<CatalogItem>> {
        Ok(self.item(id))
    }

    async fn set_locator(&self, id: Uuid, path: &str, mime: &str) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| ConvertError::NotFound(format!("item {id}")))?;
        item.path = path.to_string();
        item.mime = mime.to_string();
        Ok(())
    }

    async fn set_size_variant_file(
        &self,
        id: Uuid,
        size_name: &str,
        file: &str,
    ) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        let item = items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| ConvertError::NotFound(format!("item {id}")))?;
        if let Some(size) = item.sizes.iter_mut().find(|s| s.name == size_name) {
            size.file = file.to_string();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Storage

/// Storage over a path → bytes map. `resolve` yields a fake absolute
/// path; only the fake codec ever sees it.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    fn key(rel: &str) -> String {
        rel.trim_start_matches('/').to_string()
    }

    pub fn put(&self, rel: &str, bytes: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(Self::key(rel), bytes.to_vec());
    }

    pub fn get(&self, rel: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(&Self::key(rel)).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> =
            self.files.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn resolve(&self, rel: &str) -> PathBuf {
        PathBuf::from("/mem").join(Self::key(rel))
    }

    async fn exists(&self, rel: &str) -> bool {
        self.files.lock().unwrap().contains_key(&Self::key(rel))
    }

    async fn read(&self, rel: &str) -> Result<Vec<u8>> {
        self.get(rel)
            .ok_or_else(|| ConvertError::NotFound(format!("no file {rel}")))
    }

    async fn write(&self, rel: &str, bytes: &[u8]) -> Result<()> {
        self.put(rel, bytes);
        Ok(())
    }

    async fn delete(&self, rel: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(&Self::key(rel))
            .map(|_| ())
            .ok_or_else(|| ConvertError::NotFound(format!("no file {rel}")))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        let bytes = files
            .remove(&Self::key(from))
            .ok_or_else(|| ConvertError::NotFound(format!("no file {from}")))?;
        files.insert(Self::key(to), bytes);
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Codec

/// Codec that fabricates WebP bytes without touching the filesystem.
/// Failures and per-call latency are scripted by the test.
#[derive(Default)]
pub struct FakeCodec {
    calls: AtomicUsize,
    delay: Option<Duration>,
    fail_names: Mutex<HashSet<String>>,
}

impl FakeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transcode sleeps this long, for budget-truncation tests.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    /// Force failure for any source whose file name matches.
    pub fn fail_on(&self, file_name: &str) {
        self.fail_names.lock().unwrap().insert(file_name.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageCodec for FakeCodec {
    async fn transcode(
        &self,
        path: &Path,
        _format: SourceFormat,
        _quality: f32,
    ) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        if self.fail_names.lock().unwrap().contains(&name) {
            return Err(ConvertError::ConversionFailed(format!(
                "scripted failure for {name}"
            )));
        }
        Ok(FAKE_WEBP.to_vec())
    }
}

// ---------------------------------------------------------------------
// Reference store

#[derive(Default, Clone)]
struct ReferenceTables {
    documents: Vec<String>,
    meta: Vec<String>,
    settings: Vec<String>,
}

/// Reference store over three in-memory string tables, with the same
/// all-or-nothing contract as the Postgres implementation: a scripted
/// failure rolls every table back to its pre-call state.
#[derive(Default)]
pub struct MemoryReferenceStore {
    tables: Mutex<ReferenceTables>,
    statements: AtomicUsize,
    fail_after: Mutex<Option<usize>>,
}

impl MemoryReferenceStore {
    pub fn push_document(&self, body: &str) {
        self.tables.lock().unwrap().documents.push(body.to_string());
    }

    pub fn push_meta(&self, value: &str) {
        self.tables.lock().unwrap().meta.push(value.to_string());
    }

    pub fn push_setting(&self, value: &str) {
        self.tables.lock().unwrap().settings.push(value.to_string());
    }

    pub fn documents(&self) -> Vec<String> {
        self.tables.lock().unwrap().documents.clone()
    }

    pub fn meta(&self) -> Vec<String> {
        self.tables.lock().unwrap().meta.clone()
    }

    pub fn settings(&self) -> Vec<String> {
        self.tables.lock().unwrap().settings.clone()
    }

    /// Fail the Nth statement (1-based, counted across all calls).
    pub fn fail_after_statements(&self, n: usize) {
        *self.fail_after.lock().unwrap() = Some(n);
    }
}

#[async_trait]
impl ReferenceStore for MemoryReferenceStore {
    async fn replace_references(&self, pairs: &[LocatorPair]) -> Result<u64> {
        let mut tables = self.tables.lock().unwrap();
        // Mutate a working copy; only a fully successful call commits.
        let mut work = tables.clone();
        let mut touched = 0u64;

        for pair in pairs {
            for index in 0..3 {
                let statement =
                    self.statements.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some(limit) = *self.fail_after.lock().unwrap()
                    && statement > limit
                {
                    return Err(ConvertError::ReferenceRewriteFailed(
                        format!("scripted failure at statement {statement}"),
                    ));
                }

                let table = match index {
                    0 => &mut work.documents,
                    1 => &mut work.meta,
                    _ => &mut work.settings,
                };
                let mut rows = 0;
                for row in table.iter_mut() {
                    if row.contains(&pair.old) {
                        *row = row.replace(&pair.old, &pair.new);
                        rows += 1;
                    }
                }
                if rows > 0 {
                    touched += 1;
                }
            }
        }

        *tables = work;
        Ok(touched)
    }
}

// ---------------------------------------------------------------------
// Cache

/// Cache that only counts the signals it receives.
#[derive(Default)]
pub struct CountingCache {
    invalidations: AtomicUsize,
    flushes: AtomicUsize,
}

impl CountingCache {
    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityCache for CountingCache {
    async fn invalidate(&self, _id: Uuid) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }

    async fn flush_all(&self) {
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------
// Harness

pub struct Harness {
    pub catalog: Arc<MemoryCatalog>,
    pub storage: Arc<MemoryStorage>,
    pub codec: Arc<FakeCodec>,
    pub references: Arc<MemoryReferenceStore>,
    pub cache: Arc<CountingCache>,
    pub orchestrator: BatchOrchestrator,
}

/// Route engine logs through the test writer; safe to call from every
/// test, only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> ConverterConfig {
    ConverterConfig {
        base_url: Url::parse("https://example.com/uploads").unwrap(),
        quality: 80.0,
        ..ConverterConfig::default()
    }
}

pub fn harness(config: ConverterConfig) -> Harness {
    harness_with_codec(FakeCodec::new(), config)
}

pub fn harness_with_codec(codec: FakeCodec, config: ConverterConfig) -> Harness {
    init_tracing();
    let catalog = Arc::new(MemoryCatalog::default());
    let storage = Arc::new(MemoryStorage::default());
    let codec = Arc::new(codec);
    let references = Arc::new(MemoryReferenceStore::default());
    let cache = Arc::new(CountingCache::default());

    let rewriter = ReferenceRewriter::new(
        references.clone(),
        cache.clone(),
        config.base_url.clone(),
    );
    let converter = ItemConverter::new(
        catalog.clone(),
        storage.clone(),
        codec.clone(),
        rewriter.clone(),
        cache.clone(),
        config.quality,
    );
    let orchestrator = BatchOrchestrator::new(
        catalog.clone(),
        storage.clone(),
        converter,
        rewriter,
        config,
    );

    Harness { catalog, storage, codec, references, cache, orchestrator }
}

impl Harness {
    /// Register an image in the catalog and put its bytes in storage.
    pub fn seed_image(
        &self,
        path: &str,
        mime: &str,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.catalog.insert(CatalogItem {
            id,
            path: path.to_string(),
            mime: mime.to_string(),
            status: ItemStatus::Attached,
            created_at,
            sizes: Vec::new(),
        });
        self.storage.put(path, b"source bytes");
        id
    }

    /// Like `seed_image`, with size renditions stored alongside.
    pub fn seed_image_with_sizes(
        &self,
        path: &str,
        mime: &str,
        created_at: DateTime<Utc>,
        sizes: &[(&str, &str)],
    ) -> Uuid {
        let id = Uuid::new_v4();
        let dir = path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        let variants: Vec<SizeVariant> = sizes
            .iter()
            .map(|(name, file)| SizeVariant {
                name: name.to_string(),
                file: file.to_string(),
            })
            .collect();
        for variant in &variants {
            let rel = if dir.is_empty() {
                variant.file.clone()
            } else {
                format!("{dir}/{}", variant.file)
            };
            self.storage.put(&rel, b"size bytes");
        }
        self.catalog.insert(CatalogItem {
            id,
            path: path.to_string(),
            mime: mime.to_string(),
            status: ItemStatus::Attached,
            created_at,
            sizes: variants,
        });
        self.storage.put(path, b"source bytes");
        id
    }
}
