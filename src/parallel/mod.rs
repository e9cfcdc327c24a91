pub mod batch;
pub mod pool;

pub use batch::{batch_ranges, checkpoint_batches};
pub use pool::WorkerPool;
