//! Window selection and impact estimation for appliance tasks.

pub mod impact;
pub mod optimizer;
pub mod types;

pub use impact::estimate;
pub use optimizer::{OptimizerParams, SlotOptimizer, window_len};
pub use types::{
    BehaviorClass, ImpactEstimate, SlotRecommendation, SlotStatus, TaskError, TaskRequest,
    validate_duration,
};
