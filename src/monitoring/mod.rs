/*!
 * Monitoring
 * Tracing bootstrap and batch spans
 */

mod tracer;

pub use tracer::{init_tracing, BatchSpan};
