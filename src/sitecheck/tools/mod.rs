pub mod aggregate;
pub mod date;
pub mod decode;
pub mod encode;
pub mod error;
pub mod io;
pub mod layout;
pub mod model;
pub mod schema;
pub mod score;
pub mod sync;

pub use error::{Result, ToolError};
