pub mod changes;
pub mod lot;
