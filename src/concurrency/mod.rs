//! The back-end scheduling model (spec.md §5): the front-end
//! (scanner/preparser/precompiler) stays single-threaded on the driver
//! thread, and a fixed-size worker pool runs parser -> analyzer -> MIR
//! generator per dependency-tree node, leaves first.

pub(crate) mod worker_pool;

pub use worker_pool::{PackageResult, WorkerPool};
