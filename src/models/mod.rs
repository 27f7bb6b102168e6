pub mod coordinate;
pub mod order;
