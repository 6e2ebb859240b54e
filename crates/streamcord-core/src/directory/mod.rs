// Chat directory implementations

mod discord;

pub use discord::DiscordDirectory;
