//! CLI command handlers. Each command is in its own file.

mod checksum;
mod fetch;
mod import;
mod list;
mod verify;

pub use checksum::run_checksum;
pub use fetch::run_fetch;
pub use import::run_import;
pub use list::run_list;
pub use verify::run_verify;
