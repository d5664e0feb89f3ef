//! FILENAME: app/server/src/commands/mod.rs
// PURPOSE: Tool handlers, one free function per tool, each taking the
//          application state explicitly.

pub mod cells;
pub mod pivot;
pub mod sheets;
pub mod workbooks;

pub use cells::*;
pub use pivot::*;
pub use sheets::*;
pub use workbooks::*;
