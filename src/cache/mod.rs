//! Local layout of cached Prisma binaries.
//!
//! Fetched artifacts live in a versioned directory so that bumping
//! [`crate::PRISMA_VERSION`] starts from an empty cache. Old versions are
//! never garbage-collected.
//!
//! # Cache Location
//!
//! Two roots are available through [`CacheRoot`]:
//!
//! 1. the OS temp directory ([`global_temp_dir`])
//! 2. the per-user cache directory ([`global_cache_dir`])
//!
//! # Cross-Process Coordination
//!
//! Installation of each artifact is guarded by an [`ArtifactLock`] so that
//! parallel processes targeting the same directory download it once.
//!
//! The lock files live in a hidden `.locks/` subdirectory of the target
//! directory, one `<file name>.lock` per artifact, so they never appear next
//! to the installed binaries. They are left in place after the lock is
//! released and are not removed by this crate.

mod config;
mod lock;

pub use config::{CacheRoot, base_dir, global_cache_dir, global_temp_dir};
pub use lock::ArtifactLock;
