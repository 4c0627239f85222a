//! Kernel functions for vectorial, labeled and sequential data

pub mod normalized;
pub mod path;
pub mod rbf;
pub mod symbol;
pub mod traits;

pub use self::normalized::*;
pub use self::path::*;
pub use self::rbf::*;
pub use self::symbol::*;
pub use self::traits::*;
