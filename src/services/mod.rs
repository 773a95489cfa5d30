pub mod availability;
pub mod resolver;
