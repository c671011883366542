pub mod pool;

pub use pool::WorkflowPool;
