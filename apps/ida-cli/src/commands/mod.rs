pub mod resolve;
pub mod schema;

pub use resolve::ResolveArgs;
pub use schema::SchemaArgs;
