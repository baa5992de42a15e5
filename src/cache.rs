//! Best-effort auxiliary caches
//!
//! Neither cache is authoritative: the recording history tolerates a missing
//! or corrupt file, and the image prefetch never propagates failures.
//!
//! - `history`: bounded local history of past recordings, persisted to disk
//! - `images`: in-memory prefetch of cuisine images keyed by filename

mod history;
mod images;

pub use history::{HISTORY_CAPACITY, HistoryEntry, RecordingHistory};
pub use images::{ImageCache, ImageCacheEntry};
