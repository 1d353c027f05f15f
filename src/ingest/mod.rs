mod batch;
mod orchestrator;
mod refresh;

pub use batch::{BatchImporter, BatchReport, FailedItem, ImportedItem};
pub use orchestrator::{
    ArtistIngestor, IngestReport, ItemFailure, SectionReport, PLAYLIST_REL_DISCOVERED_ON,
};
pub use refresh::{merge_upsert, replace_all};
