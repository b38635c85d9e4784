pub mod card;
pub mod hierarchy;
pub mod store;
