pub mod message;

pub use message::{Message, Phase, Reply, Role};
