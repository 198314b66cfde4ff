//! Shared tracing configuration for observability instrumentation.
//!
//! Centralises the log targets used by the crate so subscribers can filter
//! fetch events without pulling in unrelated application logs.

/// Target used by orchestration spans and logs.
pub(crate) const LOG_TARGET: &str = "prisma_fetch::observability";

/// Target used by cache hit/miss and locking events.
pub(crate) const CACHE_LOG_TARGET: &str = "prisma_fetch::cache";

/// Target used by HTTP transfer and install events.
pub(crate) const DOWNLOAD_LOG_TARGET: &str = "prisma_fetch::download";
