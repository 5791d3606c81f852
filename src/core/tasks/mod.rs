pub mod handle;
pub mod types;

pub use handle::CancelToken;
pub use types::{
    ImportPhase,
    ImportProgress,
    ImportSummary,
    ProgressCallback,
};
