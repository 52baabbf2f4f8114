//! Core types for the element registry.

pub mod element;
pub mod page;
pub mod report;

pub use element::{Element, ElementId, ElementRecord};
pub use page::{Page, UpkeepCheck};
pub use report::{CloseOutcome, MaintenanceReport};
