//! Core types for the assay engine.

pub mod path;
pub mod category;
pub mod record;
pub mod state;
pub mod rejection;

pub use path::{resolve, PathError, StructuralPath, PATH_SEPARATOR};
pub use category::{Category, CategoryFamily};
pub use record::{
    to_json_lines, AttributedElement, CandidateRecord, Dimensions, GeometryRecord, Location,
};
pub use state::AssayState;
pub use rejection::{PageRejection, RejectionLog, RejectionReason, Severity};
