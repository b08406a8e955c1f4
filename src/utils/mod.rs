//! Generic utility primitives with zero domain knowledge.
//!
//! - `command` - External program execution with captured output
//! - `template` - `{{placeholder}}` argument rendering
//! - `validation` - Input validation helpers

pub mod command;
pub mod template;
pub mod validation;
