//! Windowed prefetch of image URL sequences
//!
//! A viewer scrubbing through a sample's image sequence must never wait
//! on the network for the next frame. The controller keeps a fixed-size
//! window of already-fetched URLs centered near the viewing offset and
//! refetches the whole window in one batched request whenever the viewer
//! drifts within reach of the window edge.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;

/// Source of image URLs for a window refetch
///
/// The production implementation is the per-sample images endpoint
/// behind the authenticated pipeline (see
/// [`DatasetClient::frame_source`](crate::client::DatasetClient::frame_source));
/// tests substitute scripted sources.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Fetch up to `limit` URLs for indices starting at `offset`.
    ///
    /// May return fewer than `limit` entries near the end of the
    /// sequence.
    async fn fetch_urls(&self, offset: u64, limit: usize) -> Result<Vec<String>>;
}

/// Keeps a window of prefetched URLs around the viewing offset
///
/// Invariants:
/// - the buffer always has exactly `window_size` slots; entries past the
///   end of a short fetch are `None`
/// - `current_url` never indexes outside the buffer; offsets that have
///   drifted outside the fetched window resolve to `None`
///
/// As long as the viewer moves by fewer than `refetch_trigger` positions
/// between refetch completions, resolution always hits a buffered entry.
pub struct PrefetchController {
    source: Arc<dyn FrameSource>,
    window_size: usize,
    refetch_trigger: u64,
    offset: u64,
    center: u64,
    buffer: Vec<Option<String>>,
    fetched_len: Option<usize>,
}

impl PrefetchController {
    /// Create a controller over a frame source.
    ///
    /// `window_size` is the number of URL slots kept around the viewer;
    /// `refetch_trigger` is the offset distance from the window center at
    /// which a refetch is issued (see
    /// [`ClientConfig::refetch_trigger`](crate::config::ClientConfig::refetch_trigger)).
    pub fn new(source: Arc<dyn FrameSource>, window_size: usize, refetch_trigger: u64) -> Self {
        Self {
            source,
            window_size,
            refetch_trigger,
            offset: 0,
            center: 0,
            buffer: vec![None; window_size],
            fetched_len: None,
        }
    }

    /// The currently viewed index.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The offset the window was last fetched around.
    pub fn center(&self) -> u64 {
        self.center
    }

    /// True once a fetch has shown the sequence to be a single resource.
    ///
    /// Drives the wheel smoother's no-op rule: scrubbing a 2D image makes
    /// no sense.
    pub fn is_single(&self) -> bool {
        self.fetched_len == Some(1)
    }

    /// Record the viewed index, refetching if it nears the window edge.
    ///
    /// Exactly one refetch is issued iff
    /// `|new_offset - center| >= refetch_trigger`; the new window starts
    /// at `max(0, new_offset - window_size / 2)` so the buffer stays
    /// ahead of the viewer in the scroll direction.
    pub async fn set_offset(&mut self, new_offset: u64) -> Result<()> {
        self.offset = new_offset;
        let distance = new_offset.abs_diff(self.center);
        if distance >= self.refetch_trigger {
            let start = new_offset.saturating_sub(self.window_size as u64 / 2);
            self.refetch_window(start).await?;
        }
        Ok(())
    }

    /// Replace the window with `window_size` URLs fetched from `start`.
    ///
    /// A short response pads the remaining slots with `None`; the buffer
    /// length is unchanged. On success the window center becomes
    /// `start + window_size / 2`.
    pub async fn refetch_window(&mut self, start: u64) -> Result<()> {
        let urls = self.source.fetch_urls(start, self.window_size).await?;
        tracing::debug!(start, fetched = urls.len(), "window refetched");

        self.fetched_len = Some(urls.len().min(self.window_size));
        let mut buffer = vec![None; self.window_size];
        for (slot, url) in buffer.iter_mut().zip(urls) {
            *slot = Some(url);
        }
        self.buffer = buffer;
        self.center = start + self.window_size as u64 / 2;
        Ok(())
    }

    /// Resolve the URL for the currently viewed index, if buffered.
    ///
    /// The buffer index is `offset - center + window_size / 2`; anything
    /// outside `[0, window_size)` resolves to `None` rather than
    /// indexing out of bounds.
    pub fn current_url(&self) -> Option<&str> {
        let index = self.offset as i64 - self.center as i64 + self.window_size as i64 / 2;
        if !(0..self.window_size as i64).contains(&index) {
            return None;
        }
        self.buffer[index as usize].as_deref()
    }
}

impl std::fmt::Debug for PrefetchController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefetchController")
            .field("offset", &self.offset)
            .field("center", &self.center)
            .field("window_size", &self.window_size)
            .field("fetched_len", &self.fetched_len)
            .finish()
    }
}
