// TestDependencies - mock implementations for testing
//
// Provides scripted mocks for every sync port. Each mock records its calls
// and can be told to fail (for all suppliers or one), to fail a fixed number
// of times before recovering, or to take a while.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{AuthPort, ExtractionPort, NotifyPort, PersistencePort, SyncDeps};
use crate::domains::sync::errors::SyncError;
use crate::domains::sync::models::{
    ExtractionParams, ExtractionResult, NotifyEvent, ProductCounts, Session,
};

// =============================================================================
// Fault script shared by the mocks
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Failure {
    /// Fail the first n attempts with a retryable error
    Times(u32),
    /// Fail every attempt with a non-retryable error
    Permanent,
}

#[derive(Default)]
struct Faults {
    /// `None` targets every supplier
    failures: Vec<(Option<String>, Failure)>,
    delays: Vec<(Option<String>, Duration)>,
    attempts: HashMap<String, u32>,
}

enum Injected {
    Retryable,
    Permanent,
}

impl Faults {
    fn targets(target: &Option<String>, supplier: &str) -> bool {
        target.as_deref().map_or(true, |t| t == supplier)
    }

    /// Count an attempt for `supplier` and decide whether it fails.
    fn attempt(&mut self, supplier: &str) -> Option<Injected> {
        let attempt = self.attempts.entry(supplier.to_string()).or_insert(0);
        *attempt += 1;
        let attempt = *attempt;

        self.failures
            .iter()
            .filter(|(target, _)| Self::targets(target, supplier))
            .find_map(|(_, failure)| match *failure {
                Failure::Times(n) if attempt <= n => Some(Injected::Retryable),
                Failure::Permanent => Some(Injected::Permanent),
                _ => None,
            })
    }

    fn delay(&self, supplier: &str) -> Option<Duration> {
        self.delays
            .iter()
            .rev()
            .find(|(target, _)| Self::targets(target, supplier))
            .map(|(_, d)| *d)
    }
}

/// Apply the fault script for one call: sleep if delayed, then fail if told to.
async fn inject(
    faults: &Mutex<Faults>,
    supplier: &str,
    error: impl FnOnce() -> SyncError,
) -> Result<(), SyncError> {
    let (delay, injected) = {
        let mut faults = faults.lock().unwrap();
        let delay = faults.delay(supplier);
        (delay, faults.attempt(supplier))
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match injected {
        None => Ok(()),
        Some(Injected::Retryable) => Err(error()),
        Some(Injected::Permanent) => Err(error().permanent()),
    }
}

macro_rules! fault_builders {
    ($mock:ty) => {
        impl $mock {
            /// Fail the first `n` calls (per supplier) with a retryable error
            pub fn failing_times(self, n: u32) -> Self {
                self.faults.lock().unwrap().failures.push((None, Failure::Times(n)));
                self
            }

            pub fn failing_times_for(self, supplier: &str, n: u32) -> Self {
                self.faults
                    .lock()
                    .unwrap()
                    .failures
                    .push((Some(supplier.to_string()), Failure::Times(n)));
                self
            }

            /// Fail every call with a non-retryable error
            pub fn failing_permanently(self) -> Self {
                self.faults.lock().unwrap().failures.push((None, Failure::Permanent));
                self
            }

            pub fn failing_permanently_for(self, supplier: &str) -> Self {
                self.faults
                    .lock()
                    .unwrap()
                    .failures
                    .push((Some(supplier.to_string()), Failure::Permanent));
                self
            }

            pub fn with_delay(self, delay: Duration) -> Self {
                self.faults.lock().unwrap().delays.push((None, delay));
                self
            }

            pub fn with_delay_for(self, supplier: &str, delay: Duration) -> Self {
                self.faults
                    .lock()
                    .unwrap()
                    .delays
                    .push((Some(supplier.to_string()), delay));
                self
            }
        }
    };
}

// =============================================================================
// Mock Auth
// =============================================================================

pub struct MockAuth {
    faults: Mutex<Faults>,
    calls: Arc<Mutex<Vec<String>>>,
    session_ttl: chrono::Duration,
}

impl MockAuth {
    pub fn new() -> Self {
        Self {
            faults: Mutex::new(Faults::default()),
            calls: Arc::new(Mutex::new(Vec::new())),
            session_ttl: chrono::Duration::hours(1),
        }
    }

    /// Hand back sessions that are already expired
    pub fn with_expired_sessions(mut self) -> Self {
        self.session_ttl = chrono::Duration::hours(-1);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count_for(&self, supplier: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|s| *s == supplier).count()
    }
}

fault_builders!(MockAuth);

impl Default for MockAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthPort for MockAuth {
    async fn authenticate(&self, supplier: &str) -> Result<Session, SyncError> {
        self.calls.lock().unwrap().push(supplier.to_string());
        inject(&self.faults, supplier, || {
            SyncError::auth(supplier, "mock portal rejected login")
        })
        .await?;

        Ok(Session {
            token: format!("token-{}", supplier),
            expires_at: Utc::now() + self.session_ttl,
        })
    }
}

// =============================================================================
// Mock Extractor
// =============================================================================

pub struct MockExtractor {
    faults: Mutex<Faults>,
    default_result: ExtractionResult,
    results: Mutex<HashMap<String, ExtractionResult>>,
    calls: Arc<Mutex<Vec<ExtractionParams>>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            faults: Mutex::new(Faults::default()),
            default_result: ExtractionResult::from_pages(
                2,
                0,
                ProductCounts {
                    extracted: 10,
                    created: 4,
                    updated: 6,
                    errors: 0,
                },
            ),
            results: Mutex::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Result returned for every supplier without a specific one
    pub fn with_result(mut self, result: ExtractionResult) -> Self {
        self.default_result = result;
        self
    }

    pub fn with_result_for(self, supplier: &str, result: ExtractionResult) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(supplier.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<ExtractionParams> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count_for(&self, supplier: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.supplier == supplier)
            .count()
    }
}

fault_builders!(MockExtractor);

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionPort for MockExtractor {
    async fn extract(
        &self,
        _session: &Session,
        params: &ExtractionParams,
    ) -> Result<ExtractionResult, SyncError> {
        self.calls.lock().unwrap().push(params.clone());
        let supplier = params.supplier.as_str();
        inject(&self.faults, supplier, || {
            SyncError::extraction(supplier, "mock pagination failed")
        })
        .await?;

        let result = self
            .results
            .lock()
            .unwrap()
            .get(supplier)
            .cloned()
            .unwrap_or_else(|| self.default_result.clone());
        Ok(result)
    }
}

// =============================================================================
// Mock Catalog Store
// =============================================================================

pub struct MockCatalogStore {
    faults: Mutex<Faults>,
    persisted: Arc<Mutex<Vec<(String, ExtractionResult)>>>,
}

impl MockCatalogStore {
    pub fn new() -> Self {
        Self {
            faults: Mutex::new(Faults::default()),
            persisted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Successful persist calls, in order
    pub fn persisted(&self) -> Vec<(String, ExtractionResult)> {
        self.persisted.lock().unwrap().clone()
    }

    pub fn persisted_suppliers(&self) -> Vec<String> {
        self.persisted
            .lock()
            .unwrap()
            .iter()
            .map(|(s, _)| s.clone())
            .collect()
    }
}

fault_builders!(MockCatalogStore);

impl Default for MockCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistencePort for MockCatalogStore {
    async fn persist(&self, supplier: &str, result: &ExtractionResult) -> Result<(), SyncError> {
        inject(&self.faults, supplier, || {
            SyncError::persist(supplier, "mock store unavailable")
        })
        .await?;
        self.persisted
            .lock()
            .unwrap()
            .push((supplier.to_string(), result.clone()));
        Ok(())
    }
}

// =============================================================================
// Mock Notifier
// =============================================================================

pub struct MockNotifier {
    events: Arc<Mutex<Vec<NotifyEvent>>>,
    fail: bool,
    delay: Option<Duration>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            fail: false,
            delay: None,
        }
    }

    /// Every send fails after being recorded
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every attempted send, delivered or not
    pub fn events(&self) -> Vec<NotifyEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for(&self, supplier: &str) -> Vec<NotifyEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.supplier == supplier)
            .cloned()
            .collect()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotifyPort for MockNotifier {
    async fn notify(&self, event: &NotifyEvent) -> Result<(), SyncError> {
        self.events.lock().unwrap().push(event.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SyncError::Notify("mock webhook down".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub auth: Arc<MockAuth>,
    pub extractor: Arc<MockExtractor>,
    pub store: Arc<MockCatalogStore>,
    pub notifier: Arc<MockNotifier>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            auth: Arc::new(MockAuth::new()),
            extractor: Arc::new(MockExtractor::new()),
            store: Arc::new(MockCatalogStore::new()),
            notifier: Arc::new(MockNotifier::new()),
        }
    }

    pub fn mock_auth(mut self, auth: MockAuth) -> Self {
        self.auth = Arc::new(auth);
        self
    }

    pub fn mock_extractor(mut self, extractor: MockExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn mock_store(mut self, store: MockCatalogStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn mock_notifier(mut self, notifier: MockNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Wire the mocks into `SyncDeps`; the mocks stay inspectable through `self`.
    pub fn deps(&self) -> Arc<SyncDeps> {
        Arc::new(SyncDeps::new(
            self.auth.clone(),
            self.extractor.clone(),
            self.store.clone(),
            self.notifier.clone(),
        ))
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
