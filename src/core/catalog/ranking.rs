use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Usage metrics for catalog entries
#[derive(Debug, Clone, Default)]
pub struct UsageMetrics {
    /// How many times each entry has been opened
    usage_counts: Arc<Mutex<HashMap<String, u32>>>,
    /// Last use per entry (Unix timestamp)
    last_used: Arc<Mutex<HashMap<String, i64>>>,
}

// A poisoned map is still usable; the counts are advisory
fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!(what, "usage metrics mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl UsageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from persisted counts (no recency information)
    pub fn from_counts(counts: HashMap<String, u32>) -> Self {
        Self {
            usage_counts: Arc::new(Mutex::new(counts)),
            last_used: Arc::default(),
        }
    }

    pub fn record_usage(&self, entry_id: &str) {
        *lock(&self.usage_counts, "usage_counts")
            .entry(entry_id.to_string())
            .or_insert(0) += 1;

        let now = chrono::Utc::now().timestamp();
        lock(&self.last_used, "last_used").insert(entry_id.to_string(), now);

        tracing::trace!(entry_id, "recorded usage");
    }

    pub fn get_usage_count(&self, entry_id: &str) -> u32 {
        lock(&self.usage_counts, "usage_counts")
            .get(entry_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn get_last_used(&self, entry_id: &str) -> Option<i64> {
        lock(&self.last_used, "last_used").get(entry_id).copied()
    }

    pub fn get_all_usage(&self) -> HashMap<String, u32> {
        lock(&self.usage_counts, "usage_counts").clone()
    }

    pub fn clear(&self) {
        lock(&self.usage_counts, "usage_counts").clear();
        lock(&self.last_used, "last_used").clear();
    }
}

/// Order entries by usage count (capped at 100), recency (up to 50, decaying
/// over 30 days) and an optional per-id boost. Ties keep input order.
pub fn rank_entries<T>(
    entries: Vec<T>,
    get_id: impl Fn(&T) -> String,
    metrics: &UsageMetrics,
    boost: Option<HashMap<String, f64>>,
) -> Vec<T> {
    let now = chrono::Utc::now().timestamp();

    let mut scored: Vec<(T, f64)> = entries
        .into_iter()
        .map(|entry| {
            let id = get_id(&entry);
            let mut score = f64::from(metrics.get_usage_count(&id)).min(100.0);

            if let Some(last_used) = metrics.get_last_used(&id) {
                let days_ago = (now - last_used) as f64 / 86400.0;
                score += 50.0 * (-days_ago / 30.0).exp();
            }

            if let Some(extra) = boost.as_ref().and_then(|map| map.get(&id)) {
                score += extra;
            }

            (entry, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(entry, _)| entry).collect()
}
