//! Capture Module - Raw Record Sources
//!
//! Capture library nằm bên ngoài; module này chỉ chuyển output của nó
//! thành `RawRecord` và ghi lại capture table.

pub mod record;
pub mod source;
pub mod table;

pub use record::{RawRecord, RawValue};
pub use source::{JsonLinesSource, RecordSource, TableSource, VecSource};
pub use table::write_capture_table;
