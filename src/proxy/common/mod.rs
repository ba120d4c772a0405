pub mod schema;
pub mod schemas;
