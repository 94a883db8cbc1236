//! Parallel Fetcher (C6): drives every bucket in a Plan against a dedicated
//! worker pool, sized to the bucket count (capped), and aggregates the
//! results.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rayon::prelude::*;

use crate::errors::{YoinkError, YoinkResult};
use crate::plan::Plan;
use crate::retriever::FileRetriever;

/// Upper bound on worker pool size, independent of how many buckets a Plan
/// produces (a product spread across many servers could otherwise spawn an
/// unbounded number of OS threads).
const MAX_POOL_THREADS: usize = 64;

/// What the fetcher produced: every destination path written, plus the
/// total number of attempts spent getting there.
#[derive(Debug)]
pub struct FetchOutcome {
    pub retrieved: Vec<PathBuf>,
    pub total_tries: u32,
}

/// Run every bucket in `plan` against its own worker, bounded by a pool
/// sized to `plan.len()` (capped at `MAX_POOL_THREADS`). Other buckets run
/// to completion regardless of failures elsewhere, but a bucket that hits
/// a fatal error abandons its own remaining files rather than retrieving
/// them only to discard the result; the first error across all buckets
/// wins and the whole fetch is reported as failed even though other
/// buckets may have finished cleanly.
pub fn fetch_plan(
    plan: &Plan,
    output_dir: PathBuf,
    dry_run: bool,
    force_overwrite: bool,
) -> YoinkResult<FetchOutcome> {
    if plan.is_empty() {
        return Ok(FetchOutcome {
            retrieved: Vec::new(),
            total_tries: 0,
        });
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(plan.len().min(MAX_POOL_THREADS))
        .build()
        .map_err(|e| YoinkError::FileError(format!("failed to build worker pool: {e}")))?;

    let retriever = FileRetriever::new(output_dir, dry_run, force_overwrite)?;
    let expected_files: usize = plan.iter().map(|bucket| bucket.files.len()).sum();

    let results: Mutex<Vec<PathBuf>> = Mutex::new(Vec::with_capacity(expected_files));
    let total_tries = AtomicUsize::new(0);
    let first_error: Mutex<Option<YoinkError>> = Mutex::new(None);

    pool.install(|| {
        plan.par_iter().for_each(|bucket| {
            log::debug!(
                "bucket {}: retrieving {} file(s)",
                bucket.server_host,
                bucket.files.len()
            );
            for file in &bucket.files {
                match retriever.retrieve(file) {
                    Ok(outcome) => {
                        total_tries.fetch_add(outcome.num_tries as usize, Ordering::Relaxed);
                        results.lock().push(outcome.destination);
                    }
                    Err(err) => {
                        log::error!("bucket {}: {err}", bucket.server_host);
                        let mut guard = first_error.lock();
                        if guard.is_none() {
                            *guard = Some(err);
                        }
                        drop(guard);
                        break;
                    }
                }
            }
        });
    });

    if let Some(err) = first_error.into_inner() {
        return Err(err);
    }

    let retrieved = results.into_inner();
    if retrieved.len() != expected_files {
        return Err(YoinkError::NgasServiceError {
            server: "pool".to_string(),
            status_code: None,
            message: format!(
                "expected {expected_files}, got {}",
                retrieved.len()
            ),
        });
    }

    Ok(FetchOutcome {
        retrieved,
        total_tries: total_tries.load(Ordering::Relaxed) as u32,
    })
}
