pub mod edit;
pub mod export;
pub mod find;
pub mod stats;
pub mod validate;

pub use edit::{edit, EditArgs};
pub use export::{export, ExportArgs};
pub use find::{find, FindArgs};
pub use stats::{stats, StatsArgs};
pub use validate::{validate, ValidateArgs};
