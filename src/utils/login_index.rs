use anyhow::{Result, anyhow};
use autoscale_cuckoo_filter::CuckooFilter;
use futures_util::StreamExt;
use moka::future::Cache;
use sqlx::MySqlPool;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Expected capacity and false-positive rate.
/// Tune these based on real account counts.
const FILTER_CAPACITY: usize = 100_000;
const FALSE_POSITIVE_RATE: f64 = 0.001;
const CACHE_CAPACITY: u64 = 500_000;
const CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Which unique account column a handle belongs to.
#[derive(Debug, Clone, Copy)]
pub enum Handle<'a> {
    Email(&'a str),
    Username(&'a str),
}

impl Handle<'_> {
    fn key(&self) -> String {
        match self {
            Handle::Email(v) => format!("email:{}", v.trim().to_lowercase()),
            Handle::Username(v) => format!("username:{}", v.trim().to_lowercase()),
        }
    }
}

/// In-memory index of taken login handles.
///
/// The cuckoo filter answers "definitely free" without touching the database;
/// the cache answers "definitely taken" for recently active accounts. Anything
/// else falls through to the `users` table.
pub struct LoginIndex {
    filter: RwLock<CuckooFilter<String>>,
    taken: Cache<String, ()>,
}

impl Default for LoginIndex {
    fn default() -> Self {
        Self {
            filter: RwLock::new(CuckooFilter::new(FILTER_CAPACITY, FALSE_POSITIVE_RATE)),
            taken: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }
}

impl LoginIndex {
    fn read(&self) -> RwLockReadGuard<'_, CuckooFilter<String>> {
        self.filter.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CuckooFilter<String>> {
        self.filter.write().unwrap_or_else(|e| e.into_inner())
    }

    /// False positives possible, false negatives not.
    pub fn might_exist(&self, handle: Handle<'_>) -> bool {
        self.read().contains(&handle.key())
    }

    pub async fn is_taken(&self, handle: Handle<'_>) -> bool {
        self.taken.get(&handle.key()).await.is_some()
    }

    pub async fn mark_taken(&self, handle: Handle<'_>) {
        let key = handle.key();
        self.write().add(&key);
        self.taken.insert(key, ()).await;
    }

    #[cfg(test)]
    pub async fn evict(&self, handle: Handle<'_>) {
        self.taken.invalidate(&handle.key()).await;
    }

    /// Filter every existing account; cache those that logged in within `recent_days`.
    pub async fn warmup(&self, pool: &MySqlPool, recent_days: u32, batch_size: usize) -> Result<()> {
        let mut stream = sqlx::query_as::<_, (String, String, i64)>(
            r#"
            SELECT email, username,
                   COALESCE(last_login_at >= NOW() - INTERVAL ? DAY, FALSE) AS recent
            FROM users
            "#,
        )
        .bind(recent_days)
        .fetch(pool);

        let mut batch = Vec::with_capacity(batch_size);
        let mut total = 0usize;
        let mut recent = 0usize;

        while let Some(row) = stream.next().await {
            let (email, username, recent_flag) =
                row.map_err(|e| anyhow!("DB row fetch failed: {}", e))?;
            let is_recent = recent_flag != 0;

            for key in [Handle::Email(&email).key(), Handle::Username(&username).key()] {
                if is_recent {
                    self.taken.insert(key.clone(), ()).await;
                }
                batch.push(key);
            }
            total += 1;
            recent += usize::from(is_recent);

            if batch.len() >= batch_size {
                self.insert_batch(&batch);
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.insert_batch(&batch);
        }

        log::info!(
            "Login index warmup complete: {} accounts, {} cached as recent (last {} days)",
            total,
            recent,
            recent_days
        );
        Ok(())
    }

    fn insert_batch(&self, keys: &[String]) {
        let mut filter = self.write();
        for key in keys {
            filter.add(key);
        }
    }
}
