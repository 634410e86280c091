pub mod models;
pub mod rules;
pub mod schema;
pub mod errors;

pub use models::*;
pub use rules::*;
pub use schema::*;
pub use errors::*;
