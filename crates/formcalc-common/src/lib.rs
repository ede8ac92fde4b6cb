pub mod error;
pub mod function;
pub mod name;
pub mod value;

pub use error::*;
pub use function::*;
pub use name::*;
pub use value::*;
