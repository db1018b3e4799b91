mod engine;
mod resolve;
mod scope;
mod shared;
mod statistic;
mod synthesize;
mod target;

pub use engine::{EngineState, MalformedReference, RelocationEngine, RelocationOutcome};
pub use resolve::{resolve_claims, ThemeGroup};
pub use scope::{FeatureScope, OwnerPath};
pub use shared::{is_shared_geometry, FeatureLocation, SharedTemplates, TemplateUsage};
pub use statistic::ResultStatistic;
pub use synthesize::{synthesize, SynthesisReport};
pub use target::{attachment_point, LocalAppTarget};
