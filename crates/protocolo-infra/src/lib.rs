//! Infrastructure layer - persistence implementations, template patching

pub mod persistence;
pub mod xlsx_template;
