//! Business logic services.

pub mod csv_import;
pub mod lifecycle;
pub mod scan;
