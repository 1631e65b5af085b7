//! The worker pool that runs distribution jobs off the event sources'
//! own tasks.

mod job;
mod pool;

pub use job::DistributeJob;
pub use pool::{WorkerPool, WorkerPoolConfig, WorkerPoolError};
