pub mod batch;
pub mod health;
pub mod profile;
pub mod quote;
