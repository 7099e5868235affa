/*!
 * Monitoring
 * Tracing subscriber setup and scenario spans
 */

mod tracer;

pub use tracer::{init_tracing, ScenarioSpan};
