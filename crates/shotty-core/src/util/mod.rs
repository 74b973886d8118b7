// Utility modules

pub mod crop;
pub mod detect;
pub mod store;
