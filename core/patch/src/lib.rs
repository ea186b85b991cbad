pub mod editor;
pub mod engine;
pub mod error;
pub mod project;

pub use editor::PackageEditor;
pub use engine::{ReplaceSummary, replace_wem};
pub use error::{PatchError, Result};
pub use project::{ActionKind, Project, ProjectAction, ProjectReport};
