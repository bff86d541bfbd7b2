//! Search orchestration: the model pool, the memoized parallel batch
//! engine and the coordinator that ties them to a selection scheme.

mod cache;
mod coordinator;
mod engine;
mod pool;
mod progress;

pub use cache::{CachedOutcome, EvaluationCache};
pub use coordinator::{run_search, ModelSearchCoordinator, SearchOutput};
pub use engine::{build_worker_pool, BatchEngine};
pub use pool::{ModelPool, PoolSlot};
pub use progress::{ProgressObserver, SearchProgress};
