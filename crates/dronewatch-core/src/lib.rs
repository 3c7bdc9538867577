pub mod classify;
pub mod list;
pub mod models;
pub mod normalizer;
pub mod path;
pub mod rules;
pub mod store;
pub mod sync;
pub mod viewport;

pub use classify::{classify, Classifier, PrefixClassifier};
pub use list::{ListPage, ListProjection, ListRow};
pub use models::{
    Category, ConnectivityState, Entity, EntityUpdate, PathSample, Position, Statistics,
};
pub use normalizer::{normalize, reports_in, NormalizeError};
pub use path::FlightPath;
pub use rules::TrackerRules;
pub use store::{compute_statistics, BatchOutcome, EntityStore, StoreSnapshot};
pub use sync::{MarkerLayer, Placement, Popup, SyncReport, VisualizationSync};
pub use viewport::{LatLng, Viewport};
