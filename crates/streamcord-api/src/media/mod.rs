// Media server client modules
//
// Hand-written clients for the Emby and Jellyfin HTTP APIs. Both expose
// the same endpoint set; the response models in `models` capture where
// their payloads differ.

pub mod emby;
pub mod jellyfin;
pub mod models;

pub use emby::EmbyClient;
pub use jellyfin::JellyfinClient;
