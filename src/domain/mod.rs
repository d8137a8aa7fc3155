// Core engines: values, parameters, path queries, slots and template expansion

pub mod expand;
pub mod html;
pub mod parameter;
pub mod path;
pub mod slot;
pub mod value;
