//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use kcommon::{CancelSignal, MetadataMap, SessionId, TraceId};
//!
//! let session = SessionId::from("session-1");
//! let trace = TraceId::new("trace-1");
//! let mut metadata = MetadataMap::new();
//! metadata.insert("tenant".to_string(), "acme".to_string());
//!
//! let signal = CancelSignal::new();
//! assert_eq!(session.as_str(), "session-1");
//! assert_eq!(trace.to_string(), "trace-1");
//! assert!(!signal.is_interrupted());
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use kcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Shared metadata and cross-crate identifier newtypes.
    //!
    //! ```rust
    //! use kcommon::{MetadataMap, SessionId, TraceId};
    //!
    //! let session = SessionId::new("session-42");
    //! let trace = TraceId::from("trace-42");
    //! let mut metadata = MetadataMap::new();
    //! metadata.insert("env".to_string(), "test".to_string());
    //!
    //! assert_eq!(session.to_string(), "session-42");
    //! assert_eq!(trace.as_str(), "trace-42");
    //! ```

    use std::collections::HashMap;
    use std::fmt::{Display, Formatter};

    pub type MetadataMap = HashMap<String, String>;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct SessionId(String);

    impl SessionId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for SessionId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for SessionId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for SessionId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    pub struct TraceId(String);

    impl TraceId {
        pub fn new(value: impl Into<String>) -> Self {
            Self(value.into())
        }

        pub fn as_str(&self) -> &str {
            self.0.as_str()
        }
    }

    impl Display for TraceId {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl From<String> for TraceId {
        fn from(value: String) -> Self {
            Self(value)
        }
    }

    impl From<&str> for TraceId {
        fn from(value: &str) -> Self {
            Self(value.to_string())
        }
    }
}

pub mod cancel {
    //! Caller-supplied cancellation and deadline signal.
    //!
    //! A [`CancelSignal`] combines an explicit [`CancellationToken`] with an
    //! optional deadline. Clones share the same token, so cancelling any clone
    //! interrupts every network call and backoff wait observing it.
    //!
    //! ```rust
    //! use std::time::Duration;
    //! use kcommon::{CancelSignal, Interruption};
    //!
    //! let signal = CancelSignal::new().with_timeout(Duration::from_secs(30));
    //! let observer = signal.clone();
    //! assert_eq!(observer.interruption(), None);
    //!
    //! signal.cancel();
    //! assert_eq!(observer.interruption(), Some(Interruption::Cancelled));
    //! ```

    use std::fmt::{Display, Formatter};
    use std::future::Future;
    use std::time::Duration;

    use tokio::time::{Instant, sleep, sleep_until};
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Interruption {
        Cancelled,
        DeadlineExceeded,
    }

    impl Display for Interruption {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::Cancelled => f.write_str("operation cancelled"),
                Self::DeadlineExceeded => f.write_str("deadline exceeded"),
            }
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct CancelSignal {
        token: CancellationToken,
        deadline: Option<Instant>,
    }

    impl CancelSignal {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn from_token(token: CancellationToken) -> Self {
            Self {
                token,
                deadline: None,
            }
        }

        /// Sets a deadline. When one is already present the earlier of the two wins.
        pub fn with_deadline(mut self, deadline: Instant) -> Self {
            self.deadline = Some(match self.deadline {
                Some(existing) => existing.min(deadline),
                None => deadline,
            });
            self
        }

        /// A timeout too large to represent leaves the signal without a deadline.
        pub fn with_timeout(self, timeout: Duration) -> Self {
            match Instant::now().checked_add(timeout) {
                Some(deadline) => self.with_deadline(deadline),
                None => self,
            }
        }

        pub fn token(&self) -> &CancellationToken {
            &self.token
        }

        pub fn deadline(&self) -> Option<Instant> {
            self.deadline
        }

        pub fn cancel(&self) {
            self.token.cancel();
        }

        /// Reports whether the signal has already fired, without waiting.
        pub fn interruption(&self) -> Option<Interruption> {
            if self.token.is_cancelled() {
                return Some(Interruption::Cancelled);
            }

            match self.deadline {
                Some(deadline) if deadline <= Instant::now() => Some(Interruption::DeadlineExceeded),
                _ => None,
            }
        }

        pub fn is_interrupted(&self) -> bool {
            self.interruption().is_some()
        }

        /// Resolves once the token is cancelled or the deadline passes.
        pub async fn interrupted(&self) -> Interruption {
            match self.deadline {
                Some(deadline) => tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Interruption::Cancelled,
                    _ = sleep_until(deadline) => Interruption::DeadlineExceeded,
                },
                None => {
                    self.token.cancelled().await;
                    Interruption::Cancelled
                }
            }
        }

        /// Waits for `delay` unless the signal fires first.
        pub async fn sleep(&self, delay: Duration) -> Result<(), Interruption> {
            self.run(sleep(delay)).await
        }

        /// Drives `future` to completion unless the signal fires first.
        pub async fn run<F>(&self, future: F) -> Result<F::Output, Interruption>
        where
            F: Future,
        {
            if let Some(interruption) = self.interruption() {
                return Err(interruption);
            }

            tokio::select! {
                biased;
                interruption = self.interrupted() => Err(interruption),
                output = future => Ok(output),
            }
        }
    }
}

pub mod registry {
    //! Generic name-ordered registry map used by runtime registries.
    //!
    //! ```rust
    //! use kcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("beta".to_string(), 2_u32);
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert_eq!(registry.keys().cloned().collect::<Vec<_>>(), vec!["alpha", "beta"]);
    //! ```

    use std::borrow::Borrow;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: BTreeMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Ord,
    {
        fn default() -> Self {
            Self {
                items: BTreeMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Ord,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Ord + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.items.keys()
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use cancel::{CancelSignal, Interruption};
pub use context::{MetadataMap, SessionId, TraceId};
pub use future::BoxFuture;
pub use registry::Registry;
