pub mod capabilities;
pub mod description;
pub mod utils;

mod property;
mod string;
pub use description::{
    ActionDescription, ActionSchema, FieldSchema, Link, PropertyDescriptor, ThingDescription,
};
pub use property::*;
pub use string::*;
