// streamcord-api: Async Rust clients for Emby, Jellyfin, and Discord REST

pub mod discord;
pub mod error;
pub mod media;
pub mod transport;

pub use discord::{DiscordClient, Snowflake};
pub use error::Error;
pub use media::{EmbyClient, JellyfinClient};
pub use transport::{TlsMode, TransportConfig};
