pub mod metadata;
pub mod snapshot;

pub use metadata::{MetadataStore, ScryfallCard, LAND_IDENTITY_FIXES};
pub use snapshot::{load_snapshot, JsonFileSource, Snapshot, SnapshotSource};
