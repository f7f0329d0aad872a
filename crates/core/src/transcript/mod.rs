pub mod captions;
pub mod client;
pub mod tracks;

pub use client::YoutubeClient;
pub use tracks::{CaptionTrack, select_track};
