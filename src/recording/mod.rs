// Raw recording side of the pipeline: resources in, stimulus-locked windows out.
pub mod batch;
pub mod segment;
pub mod source;
pub mod summary;

pub use batch::{Batch, BatchLoader, ErrorRegistry, FileFailure, LoadedRecording};
pub use segment::{
    detect_onsets, extract_window, GridCheck, ResponseWindow, Segmentation, Segmenter,
    StimulusResponse,
};
pub use source::{
    DataResource, DirectoryStore, HeaderResource, MemoryStore, RecordingStore, StimulusEvent,
};
pub use summary::{OffsetCategory, RecordingSummary, Symmetry};
