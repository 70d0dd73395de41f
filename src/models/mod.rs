pub mod codec;
pub mod filter;
pub mod job;
