// Template expansion: JSON templates in, concrete JSON documents out

mod expander;
mod hooks;
mod writer;

pub use expander::TemplateExpander;
pub use hooks::{ExpandHooks, NoHooks};
pub use writer::JsonWriter;
