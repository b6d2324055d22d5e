//! Rule-driven interception of chat events
//!
//! Operators define named interceptors per origin server (or for every
//! server), each holding an ordered list of rules. Every inbound event is
//! matched against every enabled interceptor in scope, and the first rule
//! that matches records a hit.
//!
//! # Example
//!
//! ```no_run
//! use interceptor_engine::{InterceptorEngine, InterceptorEventType, InterceptorRule, MatchMode};
//! use std::time::Duration;
//!
//! # fn example() -> interceptor_engine::Result<()> {
//! let engine = InterceptorEngine::builder().build()?;
//!
//! let mut watcher = engine.create_interceptor("libera", "Watcher");
//! watcher.rules.push(
//!     InterceptorRule::new("swearing")
//!         .with_message(MatchMode::Regex, "(damn|heck)")
//!         .with_nick(MatchMode::Like, "ali"),
//! );
//! engine.save_interceptor("libera", watcher.clone())?;
//!
//! engine.ingest_event(
//!     "libera",
//!     "#one",
//!     "alice",
//!     "alice!ident@host.example",
//!     "this is heck",
//!     InterceptorEventType::Message,
//! );
//! engine.wait_idle(Duration::from_secs(1));
//!
//! for hit in engine.list_hits("libera", &watcher.id, 10) {
//!     println!("{} matched {}", hit.from_nick, hit.reason);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::module_inception)]

// Re-export commonly used items
pub use bus::{ChangeBus, ChangeKind, ChangeSubscription, InterceptorChange};
pub use error::{ErrorContext, InterceptorError, Result};
pub use event::{ChatEvent, InterceptorEventType};
pub use pattern::{MatchMode, PatternMatcher};
pub use pipeline::{PipelineConfig, PipelineMetricsSnapshot};
pub use result::InterceptorHit;
pub use rule::{InterceptorActions, InterceptorDefinition, InterceptorRule};
pub use ruleset::DefinitionRegistry;
pub use service::{EngineBuilder, EngineConfig, InterceptorEngine};

/// Error types
pub mod error;

/// Event types and normalized chat events
pub mod event;

/// Pattern matching implementations
pub mod pattern;

/// Rule and definition model, compiled forms, and evaluation
pub mod rule;

/// Server and channel scope resolution
pub mod scope;

/// Storage and CRUD for definitions
pub mod ruleset;

/// Hit records
pub mod result;

/// Bounded hit history
pub mod history;

/// Change notification
pub mod bus;

/// Background event ingestion
pub mod pipeline;

/// Engine facade
pub mod service;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber with default settings
///
/// JSON output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
