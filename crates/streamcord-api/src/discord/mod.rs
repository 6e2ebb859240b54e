// Discord REST client modules

pub mod client;
pub mod models;

pub use client::{DEFAULT_API_BASE, DiscordClient};
pub use models::Snowflake;
