// Request definitions and the catalog that holds them

mod catalog;
mod definition;

pub use catalog::Catalog;
pub use definition::{BuiltRequest, RequestDefinition, RequestTemplate, ResponseTemplate};
