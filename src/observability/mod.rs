//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! BodyRewriter / gateway:
//!     → logging.rs (structured events under the rewriter's span)
//!     → metrics.rs (per-outcome counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder; the binary does
//! - Metrics are cheap and are no-ops without an installed recorder

pub mod logging;
pub mod metrics;
