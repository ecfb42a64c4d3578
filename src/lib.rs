pub mod codec;
pub mod entry;
pub mod error;
pub mod server;
pub mod shelf;
pub mod tabular;
