pub mod binary_semaphore;
/// Handles synchronization
pub mod fence;
mod memory_barrier;

pub use binary_semaphore::BinarySemaphore;
pub use fence::Fence;
