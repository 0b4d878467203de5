//! Data model for harvested directory records
//!
//! - [`SearchPage`] and [`RawDocument`]: lenient wire types
//! - [`EmployeeRow`]: the canonical output schema and its mapping
//! - [`Dataset`]: the deduplicated, sorted result

mod assemble;
mod page;
mod row;

pub use assemble::{assemble, Dataset};
pub use page::{total_pages, PageRequest, RawDocument, SearchPage};
pub use row::{map_documents, EmployeeRow, HEADERS};
