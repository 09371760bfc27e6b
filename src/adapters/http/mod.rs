pub mod client;
pub mod envelope;
