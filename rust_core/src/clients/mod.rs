pub mod discord;
pub mod shl;

// Re-export commonly used types
pub use discord::{DiscordClient, DiscordUser};
pub use shl::ShlClient;
