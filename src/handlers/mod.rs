pub mod assistant;
pub mod protected;
