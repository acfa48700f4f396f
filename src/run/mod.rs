//! Run-level collaborators of the metric store.
//!
//! - [`RunData`]: read projection of a run (latest/min/max maps, params, tags)
//! - [`ParamStore`] / [`TagStore`]: last-write-wins string maps per run
//! - [`RunRegistry`]: which run IDs may receive metrics

mod params;
mod registry;
mod run_data;

pub use params::{KeyValueStore, ParamStore, TagStore};
pub use registry::{MemoryRunRegistry, RunRegistry};
pub use run_data::{RunData, RunDataBuilder};
