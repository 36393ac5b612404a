//! @ai:module:intent Out-of-band resource usage sampling
//! @ai:module:layer infrastructure
//! @ai:module:public_api ResourceSampler, ResourceSeries, ProcessMemorySampler

pub mod memory;

pub use memory::{ProcessMemorySampler, ResourceSampler, ResourceSeries};
