pub mod dom_path;
pub mod error;
pub mod extract;
pub mod model;
pub mod node;
pub mod report;
pub mod store;
pub mod wait;
pub mod walker;

pub use error::{HarvestError, Result};
pub use model::{CategoryMap, DiseaseRecord, DiseaseStore};
pub use node::TreeNode;
pub use store::StorePaths;
pub use walker::{CategoryOutcome, Harvest, HarvestStats, ProgressCallback, WalkOptions, WalkProgress};
