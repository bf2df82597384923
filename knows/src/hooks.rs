//! Adapter-level lifecycle hooks for cache and batch activity.
//!
//! ```rust
//! use knows::{KnowsHooks, NoopKnowsHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn KnowsHooks) {}
//!
//! assert_hooks_trait(&NoopKnowsHooks);
//! ```

use std::time::Duration;

pub trait KnowsHooks: Send + Sync {
    fn on_cache_hit(&self, _key: &str) {}

    fn on_cache_miss(&self, _key: &str) {}

    fn on_batch_start(&self, _operation: &str, _items: usize, _concurrency: usize) {}

    fn on_batch_complete(
        &self,
        _operation: &str,
        _succeeded: usize,
        _failed: usize,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopKnowsHooks;

impl KnowsHooks for NoopKnowsHooks {}
