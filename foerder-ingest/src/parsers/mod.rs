pub mod csv_programs;
pub mod json;
