pub mod dispatch;
pub mod plan;
pub mod transformers;

pub use dispatch::{DispatchFuture, LocalPlanDispatcher, PlanDispatcher, QueryResponse};
pub use plan::{ExecNode, ExecPlan};
pub use transformers::RangeVectorTransformer;
