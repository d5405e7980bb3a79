//! Filesystem access: source walking, the report store, rendered output and
//! the run lock.

pub mod lock;
pub mod output;
pub mod store;
pub mod walker;

pub use lock::RunLock;
pub use output::{Dashboard, JsonWriter, MarkdownWriter, OutputWriter};
pub use store::{ArtifactKind, ReportStore};
pub use walker::FileWalker;
