use crate::core::parser::normalize_name;
use crate::domain::model::CatalogRecord;
use crate::domain::ports::{CardCatalog, ConfigProvider};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// Scryfall 的 collection 端點一次最多接受 75 個 identifiers，我們保留餘裕
pub const MAX_BATCH_SIZE: usize = 70;
pub const MIN_REQUEST_DELAY_MS: u64 = 110;
pub const DEFAULT_MAX_FALLBACK_FAILURES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupSettings {
    pub batch_size: usize,
    pub request_delay: Duration,
    pub max_fallback_failures: usize,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            batch_size: MAX_BATCH_SIZE,
            request_delay: Duration::from_millis(MIN_REQUEST_DELAY_MS),
            max_fallback_failures: DEFAULT_MAX_FALLBACK_FAILURES,
        }
    }
}

impl LookupSettings {
    /// Values outside the rate-limit contract are clamped back into it.
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            batch_size: config.batch_size().clamp(1, MAX_BATCH_SIZE),
            request_delay: Duration::from_millis(config.request_delay_ms().max(MIN_REQUEST_DELAY_MS)),
            max_fallback_failures: config.max_fallback_failures().max(1),
        }
    }
}

/// A record that only the fuzzy endpoint could find, keyed by what the player typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyMatch {
    pub requested: String,
    pub record: CatalogRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupOutcome {
    pub found: Vec<CatalogRecord>,
    pub not_found: Vec<String>,
    pub fuzzy_matches: Vec<FuzzyMatch>,
    pub warnings: Vec<String>,
    pub requests_made: usize,
}

/// Keeps successive catalog requests at least `delay` apart, measured from the
/// end of one request to the start of the next.
struct RateLimiter {
    delay: Duration,
    last_finished: Option<Instant>,
}

impl RateLimiter {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_finished: None,
        }
    }

    async fn acquire(&self) {
        if let Some(last) = self.last_finished {
            tokio::time::sleep_until(last + self.delay).await;
        }
    }

    fn release(&mut self) {
        self.last_finished = Some(Instant::now());
    }
}

/// 批次查詢 + 模糊查詢備援。所有請求依序送出，從不並行。
pub async fn resolve_names<C: CardCatalog + ?Sized>(
    catalog: &C,
    names: &[String],
    settings: &LookupSettings,
) -> LookupOutcome {
    let mut outcome = LookupOutcome::default();
    let mut limiter = RateLimiter::new(settings.request_delay);
    let batch_size = settings.batch_size.clamp(1, MAX_BATCH_SIZE);
    let total_batches = names.len().div_ceil(batch_size);

    for (index, batch) in names.chunks(batch_size).enumerate() {
        limiter.acquire().await;
        tracing::debug!(
            "Catalog batch {}/{} ({} names)",
            index + 1,
            total_batches,
            batch.len()
        );

        match catalog.fetch_collection(batch).await {
            Ok(page) => {
                outcome.found.extend(page.found);
                outcome.not_found.extend(page.not_found);
            }
            Err(e) => {
                tracing::warn!(
                    "Catalog batch {}/{} failed, marking {} names as not found: {}",
                    index + 1,
                    total_batches,
                    batch.len(),
                    e
                );
                outcome.not_found.extend(batch.iter().cloned());
            }
        }

        outcome.requests_made += 1;
        limiter.release();
    }

    run_fuzzy_fallback(catalog, settings, &mut limiter, &mut outcome).await;

    tracing::info!(
        "Catalog lookup finished: {} found, {} fuzzy, {} not found, {} requests",
        outcome.found.len(),
        outcome.fuzzy_matches.len(),
        outcome.not_found.len(),
        outcome.requests_made
    );

    outcome
}

async fn run_fuzzy_fallback<C: CardCatalog + ?Sized>(
    catalog: &C,
    settings: &LookupSettings,
    limiter: &mut RateLimiter,
    outcome: &mut LookupOutcome,
) {
    let mut seen = HashSet::new();
    let unresolved: Vec<String> = outcome
        .not_found
        .iter()
        .filter(|name| seen.insert(normalize_name(name)))
        .cloned()
        .collect();

    let mut failures = 0;
    let mut skipped = 0;
    let mut resolved = HashSet::new();

    for name in unresolved {
        if failures >= settings.max_fallback_failures {
            skipped += 1;
            continue;
        }

        limiter.acquire().await;
        match catalog.fetch_named_fuzzy(&name).await {
            Ok(Some(record)) => {
                tracing::debug!("Fuzzy lookup resolved '{}' to '{}'", name, record.name);
                resolved.insert(normalize_name(&name));
                outcome.fuzzy_matches.push(FuzzyMatch {
                    requested: name,
                    record,
                });
            }
            Ok(None) => {
                tracing::debug!("Fuzzy lookup found no match for '{}'", name);
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(
                    "Fuzzy lookup for '{}' failed ({}/{}): {}",
                    name,
                    failures,
                    settings.max_fallback_failures,
                    e
                );
            }
        }
        outcome.requests_made += 1;
        limiter.release();
    }

    if skipped > 0 {
        outcome.warnings.push(format!(
            "Fuzzy card lookup stopped after {} failures; {} card(s) were not retried.",
            failures, skipped
        ));
    }

    outcome
        .not_found
        .retain(|name| !resolved.contains(&normalize_name(name)));
}
