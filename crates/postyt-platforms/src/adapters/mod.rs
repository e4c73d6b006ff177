//! Concrete platform adapters
//!
//! TikTok and Snapchat have no adapter; the registry keeps them as "not yet implemented".

#[cfg(feature = "adapter-facebook")]
pub mod facebook;
#[cfg(feature = "adapter-instagram")]
pub mod instagram;
#[cfg(feature = "adapter-reddit")]
pub mod reddit;
#[cfg(feature = "adapter-twitter")]
pub mod twitter;
#[cfg(feature = "adapter-youtube")]
pub mod youtube;

#[cfg(feature = "adapter-facebook")]
pub use facebook::FacebookAdapter;
#[cfg(feature = "adapter-instagram")]
pub use instagram::InstagramAdapter;
#[cfg(feature = "adapter-reddit")]
pub use reddit::RedditAdapter;
#[cfg(feature = "adapter-twitter")]
pub use twitter::TwitterAdapter;
#[cfg(feature = "adapter-youtube")]
pub use youtube::YoutubeAdapter;
