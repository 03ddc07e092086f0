//! Video sources.
//!
//! Only YouTube is supported: a source turns user input into a [`VideoId`].

mod youtube;

pub use youtube::{extract_video_id, VideoId, VIDEO_ID_LEN};
