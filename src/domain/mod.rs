pub mod model;
pub mod records;
pub mod role;

pub use role::Role;
