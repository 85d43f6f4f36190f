pub mod access;
pub mod dataset;
pub mod feed;
pub mod model;
pub mod query;
pub mod source;

pub use access::{ContentAccess, Fetched, Origin};
pub use dataset::StaticDataset;
pub use source::{Collection, ContentSource, Page};
