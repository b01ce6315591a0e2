mod actors;
mod movies;

pub use actors::ActorRepo;
pub use movies::MovieRepo;
