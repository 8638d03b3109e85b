pub mod analysis;
pub mod report;
pub mod snapshot;

pub use analysis::*;
pub use report::*;
pub use snapshot::*;
