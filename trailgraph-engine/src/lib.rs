pub mod analysis;
pub mod error;
pub mod frequency;
pub mod graph;
pub mod path;
pub mod record;
pub mod traversal;

pub use analysis::{Analysis, AnalysisOptions, analyze};
pub use error::{AnalysisError, Result};
pub use frequency::{FrequencyTables, PathFrequency, PathMining, VisitCount};
pub use graph::{NavigationGraph, NodeKey, PageNode, Transition};
pub use path::{Endpoints, PathResult};
pub use record::{VisitRecord, load_records, parse_records};
pub use traversal::TraversalResult;
