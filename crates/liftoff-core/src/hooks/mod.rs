//! Hook System - Typed extension points
//!
//! Every extension point is one of three strategies:
//! - waterfall: each tap receives the previous tap's output
//! - bail: the first tap returning `Some` wins, later taps are not run
//! - collect: every tap runs in order and all results are returned
//!
//! Taps run in registration order. A tap is either a plain closure
//! ([`WaterfallHook::tap`]) or an async one ([`WaterfallHook::tap_async`]).

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::trace;

/// How the taps of a hook are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStrategy {
    /// Thread a value through every tap
    Waterfall,
    /// Stop at the first tap with an answer
    Bail,
    /// Run every tap and keep all answers
    Collect,
}

impl HookStrategy {
    /// Get the strategy name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waterfall => "waterfall",
            Self::Bail => "bail",
            Self::Collect => "collect",
        }
    }
}

type Handler<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, R> + Send + Sync>;

struct Tap<A, R> {
    name: String,
    handler: Handler<A, R>,
}

impl<A, R> Clone for Tap<A, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

fn sync_handler<A, R, F>(f: F) -> Handler<A, R>
where
    F: Fn(A) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    Arc::new(move |args| {
        let out = f(args);
        Box::pin(std::future::ready(out))
    })
}

fn async_handler<A, R, F, Fut>(f: F) -> Handler<A, R>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    Arc::new(move |args| Box::pin(f(args)))
}

/// A hook whose taps each transform the value produced by the previous tap
pub struct WaterfallHook<T> {
    name: &'static str,
    taps: Vec<Tap<T, T>>,
}

impl<T: Send + 'static> WaterfallHook<T> {
    /// Create an empty hook
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            taps: Vec::new(),
        }
    }

    /// Register a synchronous tap
    pub fn tap<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            handler: sync_handler(f),
        });
    }

    /// Register an asynchronous tap
    pub fn tap_async<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            handler: async_handler(f),
        });
    }

    /// Run every tap in order, threading the value through
    pub async fn call(&self, value: T) -> T {
        let mut value = value;
        for tap in &self.taps {
            trace!(hook = self.name, tap = %tap.name, "calling waterfall tap");
            value = (tap.handler)(value).await;
        }
        value
    }
}

/// A hook that stops at the first tap returning `Some`
pub struct BailHook<A, R> {
    name: &'static str,
    taps: Vec<Tap<A, Option<R>>>,
}

impl<A: Clone + Send + 'static, R: Send + 'static> BailHook<A, R> {
    /// Create an empty hook
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            taps: Vec::new(),
        }
    }

    /// Register a synchronous tap
    pub fn tap<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(A) -> Option<R> + Send + Sync + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            handler: sync_handler(f),
        });
    }

    /// Register an asynchronous tap
    pub fn tap_async<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<R>> + Send + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            handler: async_handler(f),
        });
    }

    /// Run taps in order until one answers
    pub async fn call(&self, args: A) -> Option<R> {
        for tap in &self.taps {
            trace!(hook = self.name, tap = %tap.name, "calling bail tap");
            if let Some(result) = (tap.handler)(args.clone()).await {
                return Some(result);
            }
        }
        None
    }
}

/// A hook that runs every tap and collects their results
pub struct SeriesHook<A, R = ()> {
    name: &'static str,
    taps: Vec<Tap<A, R>>,
}

impl<A: Clone + Send + 'static, R: Send + 'static> SeriesHook<A, R> {
    /// Create an empty hook
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            taps: Vec::new(),
        }
    }

    /// Register a synchronous tap
    pub fn tap<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            handler: sync_handler(f),
        });
    }

    /// Register an asynchronous tap
    pub fn tap_async<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            handler: async_handler(f),
        });
    }

    /// Run every tap in order
    pub async fn call(&self, args: A) -> Vec<R> {
        let mut results = Vec::with_capacity(self.taps.len());
        for tap in &self.taps {
            trace!(hook = self.name, tap = %tap.name, "calling series tap");
            results.push((tap.handler)(args.clone()).await);
        }
        results
    }
}

macro_rules! hook_common {
    ($hook:ident < $($gen:ident),+ >, $strategy:expr) => {
        impl<$($gen),+> $hook<$($gen),+> {
            /// Name of the extension point
            pub fn name(&self) -> &'static str {
                self.name
            }

            /// How taps are combined
            pub fn strategy(&self) -> HookStrategy {
                $strategy
            }

            /// Names of registered taps, in call order
            pub fn tap_names(&self) -> Vec<&str> {
                self.taps.iter().map(|t| t.name.as_str()).collect()
            }

            /// Whether any tap is registered
            pub fn is_tapped(&self) -> bool {
                !self.taps.is_empty()
            }

            /// Append the taps of another hook after this hook's taps
            pub fn extend(&mut self, other: &Self) {
                self.taps.extend(other.taps.iter().cloned());
            }
        }

        impl<$($gen),+> Clone for $hook<$($gen),+> {
            fn clone(&self) -> Self {
                Self {
                    name: self.name,
                    taps: self.taps.clone(),
                }
            }
        }

        impl<$($gen),+> fmt::Debug for $hook<$($gen),+> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($hook))
                    .field("name", &self.name)
                    .field("taps", &self.tap_names())
                    .finish()
            }
        }
    };
}

hook_common!(WaterfallHook<T>, HookStrategy::Waterfall);
hook_common!(BailHook<A, R>, HookStrategy::Bail);
hook_common!(SeriesHook<A, R>, HookStrategy::Collect);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_waterfall_threads_value_in_order() {
        let mut hook = WaterfallHook::new("render");
        hook.tap("first", |s: String| format!("{s}a"));
        hook.tap_async("second", |s: String| async move { format!("{s}b") });
        hook.tap("third", |s: String| format!("{s}c"));

        assert_eq!(hook.call("-".to_string()).await, "-abc");
        assert_eq!(hook.tap_names(), vec!["first", "second", "third"]);
        assert_eq!(hook.strategy(), HookStrategy::Waterfall);
    }

    #[tokio::test]
    async fn test_bail_stops_at_first_answer() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut hook: BailHook<u32, String> = BailHook::new("title");
        hook.tap("skip", |_| None);
        hook.tap("answer", |n| Some(format!("#{n}")));
        let counter = Arc::clone(&calls);
        hook.tap("never", move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Some("late".to_string())
        });

        assert_eq!(hook.call(7).await.as_deref(), Some("#7"));
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_bail_without_taps_is_none() {
        let hook: BailHook<(), bool> = BailHook::new("omit");
        assert!(hook.call(()).await.is_none());
        assert!(!hook.is_tapped());
    }

    #[tokio::test]
    async fn test_extend_appends_taps() {
        let mut base = WaterfallHook::new("parse");
        base.tap("first", |n: u32| n + 1);
        let mut extra = WaterfallHook::new("parse");
        extra.tap("second", |n: u32| n * 10);

        base.extend(&extra);
        assert_eq!(base.tap_names(), vec!["first", "second"]);
        assert_eq!(base.call(1).await, 20);
        assert_eq!(extra.tap_names(), vec!["second"]);
    }

    #[tokio::test]
    async fn test_series_collects_all_results() {
        let mut hook: SeriesHook<u32, u32> = SeriesHook::new("after");
        hook.tap("double", |n| n * 2);
        hook.tap_async("triple", |n| async move { n * 3 });

        assert_eq!(hook.call(2).await, vec![4, 6]);
        assert_eq!(hook.strategy(), HookStrategy::Collect);
    }
}
