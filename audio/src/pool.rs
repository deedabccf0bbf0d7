//! Memory-pool placement for long-lived pipeline buffers.
//!
//! Embedded targets usually expose a small fast internal RAM and a larger,
//! slower external RAM. Buffers that live for the whole process (sample
//! buffer, feature matrix, spectral basis, FFT scratch) are placed through a
//! [`PoolAllocator`], which honours a preferred pool, an optional fallback and
//! per-pool byte budgets. On a host build both pools are the global heap; the
//! budgets still apply so placement decisions can be exercised and tested.

use std::mem::size_of;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AudioError;

/// A memory region buffers can be placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryPool {
    /// Small, fast on-chip memory.
    Internal,
    /// Large external memory (PSRAM on the reference board).
    External,
}

/// Placement policy: which pool to try first, where to fall back, and how
/// many bytes each pool may hand out (`None` = unbounded).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolPolicy {
    pub preferred: MemoryPool,
    pub fallback: Option<MemoryPool>,
    pub internal_budget: Option<usize>,
    pub external_budget: Option<usize>,
}

impl Default for PoolPolicy {
    fn default() -> Self {
        Self {
            preferred: MemoryPool::External,
            fallback: Some(MemoryPool::Internal),
            internal_budget: None,
            external_budget: None,
        }
    }
}

/// Bytes handed out per pool so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolUsage {
    pub internal: usize,
    pub external: usize,
}

impl PoolUsage {
    pub fn total(&self) -> usize {
        self.internal + self.external
    }
}

/// Fallible, budget-aware allocator for fixed-size buffers.
#[derive(Debug, Default)]
pub struct PoolAllocator {
    policy: PoolPolicy,
    usage: PoolUsage,
}

impl PoolAllocator {
    pub fn new(policy: PoolPolicy) -> Self {
        Self {
            policy,
            usage: PoolUsage::default(),
        }
    }

    pub fn policy(&self) -> &PoolPolicy {
        &self.policy
    }

    pub fn usage(&self) -> PoolUsage {
        self.usage
    }

    /// Allocates a zero-initialised buffer of `len` elements.
    ///
    /// The preferred pool is tried first, then the fallback. A pool is skipped
    /// when the request would exceed its budget.
    pub fn alloc<T: Copy + Default>(
        &mut self,
        what: &'static str,
        len: usize,
    ) -> Result<Vec<T>, AudioError> {
        let bytes = len
            .checked_mul(size_of::<T>())
            .ok_or_else(|| AudioError::Alloc {
                what,
                bytes: usize::MAX,
                reason: "size overflow".into(),
            })?;

        let mut tried = Vec::with_capacity(2);
        for pool in self.candidates().into_iter().flatten() {
            tried.push(pool);
            if !self.fits(pool, bytes) {
                continue;
            }

            let mut buf = Vec::new();
            buf.try_reserve_exact(len).map_err(|e| AudioError::Alloc {
                what,
                bytes,
                reason: e.to_string(),
            })?;
            buf.resize(len, T::default());

            match pool {
                MemoryPool::Internal => self.usage.internal += bytes,
                MemoryPool::External => self.usage.external += bytes,
            }
            debug!(what, bytes, ?pool, "pool: allocated");
            return Ok(buf);
        }

        Err(AudioError::PoolExhausted { what, bytes, tried })
    }

    fn candidates(&self) -> [Option<MemoryPool>; 2] {
        let preferred = self.policy.preferred;
        [Some(preferred), self.policy.fallback.filter(|&p| p != preferred)]
    }

    fn fits(&self, pool: MemoryPool, bytes: usize) -> bool {
        let (used, budget) = match pool {
            MemoryPool::Internal => (self.usage.internal, self.policy.internal_budget),
            MemoryPool::External => (self.usage.external, self.policy.external_budget),
        };
        match budget {
            Some(limit) => used.checked_add(bytes).is_some_and(|total| total <= limit),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_prefers_external() {
        let mut alloc = PoolAllocator::default();
        let buf: Vec<f32> = alloc.alloc("scratch", 16).unwrap();
        assert_eq!(buf.len(), 16);
        assert!(buf.iter().all(|&v| v == 0.0));
        assert_eq!(alloc.usage().external, 64);
        assert_eq!(alloc.usage().internal, 0);
    }

    #[test]
    fn falls_back_when_preferred_budget_is_spent() {
        let mut alloc = PoolAllocator::new(PoolPolicy {
            preferred: MemoryPool::Internal,
            fallback: Some(MemoryPool::External),
            internal_budget: Some(100),
            external_budget: None,
        });

        let _a: Vec<i16> = alloc.alloc("small", 40).unwrap(); // 80 bytes
        let _b: Vec<i16> = alloc.alloc("large", 40).unwrap(); // does not fit internal

        assert_eq!(alloc.usage().internal, 80);
        assert_eq!(alloc.usage().external, 80);
        assert_eq!(alloc.usage().total(), 160);
    }

    #[test]
    fn exhausted_without_fallback() {
        let mut alloc = PoolAllocator::new(PoolPolicy {
            preferred: MemoryPool::Internal,
            fallback: None,
            internal_budget: Some(8),
            external_budget: None,
        });

        let err = alloc.alloc::<f32>("window", 4).unwrap_err();
        match err {
            AudioError::PoolExhausted { what, bytes, tried } => {
                assert_eq!(what, "window");
                assert_eq!(bytes, 16);
                assert_eq!(tried, vec![MemoryPool::Internal]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(alloc.usage().total(), 0);
    }

    #[test]
    fn fallback_equal_to_preferred_is_tried_once() {
        let mut alloc = PoolAllocator::new(PoolPolicy {
            preferred: MemoryPool::External,
            fallback: Some(MemoryPool::External),
            internal_budget: None,
            external_budget: Some(0),
        });
        match alloc.alloc::<u8>("x", 1).unwrap_err() {
            AudioError::PoolExhausted { tried, .. } => assert_eq!(tried.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn policy_from_json() {
        let policy: PoolPolicy =
            serde_json::from_str(r#"{"preferred":"internal","internal_budget":1024}"#).unwrap();
        assert_eq!(policy.preferred, MemoryPool::Internal);
        assert_eq!(policy.fallback, Some(MemoryPool::Internal));
        assert_eq!(policy.internal_budget, Some(1024));
    }
}
