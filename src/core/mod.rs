/*!
 * Core Module
 * Synchronization primitives, error handling and tunables
 */

pub mod errors;
pub mod limits;
pub mod sync;

// Re-export for convenience
pub use errors::*;
