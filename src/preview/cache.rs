use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::error::{DecodeError, Result};

/// Bounded store of decoded images keyed by path.
///
/// Eviction is strictly insertion-order (FIFO): once the cache holds more
/// than `capacity` entries the oldest-inserted one is dropped, and a lookup
/// never changes an entry's eviction priority. A hot entry can still be
/// evicted if it was inserted `capacity` insertions ago. This mirrors the
/// observable behavior of the preview this was built for, so it is kept
/// over LRU on purpose.
#[derive(Debug)]
pub struct ImageDecodeCache {
    capacity: usize,
    entries: HashMap<PathBuf, Arc<DynamicImage>>,
    insertion_order: VecDeque<PathBuf>,
}

impl ImageDecodeCache {
    /// Default number of decoded images kept in memory
    pub const DEFAULT_CAPACITY: usize = 20;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
        }
    }

    /// Return the decoded image for `path`, decoding and caching it on miss.
    ///
    /// A miss decodes from storage and may evict the oldest-inserted entry;
    /// a hit returns the shared image untouched.
    pub fn get(&mut self, path: &Path) -> Result<Arc<DynamicImage>> {
        if let Some(image) = self.entries.get(path) {
            return Ok(Arc::clone(image));
        }

        if !path.exists() {
            return Err(DecodeError::NotFound { path: path.display().to_string() }.into());
        }

        let image = image::open(path).map_err(|e| DecodeError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!("Decoded {:?} ({}x{})", path, image.width(), image.height());

        let image = Arc::new(image);
        self.entries.insert(path.to_path_buf(), Arc::clone(&image));
        self.insertion_order.push_back(path.to_path_buf());

        while self.entries.len() > self.capacity {
            if let Some(oldest) = self.insertion_order.pop_front() {
                debug!("Evicting {:?} from decode cache", oldest);
                self.entries.remove(&oldest);
            }
        }

        Ok(image)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ImageDecodeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(4, 4, Rgba([200, 30, 30, 255])).save(&path).unwrap();
        path
    }

    #[test]
    fn test_hit_returns_cached_image() {
        let dir = tempdir().unwrap();
        let path = write_png(dir.path(), "a.png");

        let mut cache = ImageDecodeCache::new();
        cache.get(&path).unwrap();

        // Corrupt the file on disk; a hit must not touch storage
        std::fs::write(&path, b"not an image").unwrap();
        assert!(cache.get(&path).is_ok());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unreadable_file_is_decode_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"garbage").unwrap();

        let mut cache = ImageDecodeCache::new();
        assert!(matches!(
            cache.get(&path),
            Err(crate::error::SlidesError::Decode(DecodeError::Unreadable { .. }))
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let mut cache = ImageDecodeCache::new();
        assert!(matches!(
            cache.get(Path::new("/no/such/image.png")),
            Err(crate::error::SlidesError::Decode(DecodeError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_fifo_eviction_ignores_access_recency() {
        let dir = tempdir().unwrap();
        let mut cache = ImageDecodeCache::new();

        let first = write_png(dir.path(), "img_00.png");
        cache.get(&first).unwrap();

        for i in 1..20 {
            let path = write_png(dir.path(), &format!("img_{i:02}.png"));
            cache.get(&path).unwrap();
        }
        assert_eq!(cache.len(), 20);

        // Touch the oldest entry right before overflowing; FIFO must still
        // evict it rather than the least recently used entry.
        cache.get(&first).unwrap();

        let overflow = write_png(dir.path(), "img_20.png");
        cache.get(&overflow).unwrap();

        assert_eq!(cache.len(), 20);
        assert!(!cache.contains(&first));
        assert!(cache.contains(&overflow));
    }

    #[test]
    fn test_custom_capacity() {
        let dir = tempdir().unwrap();
        let mut cache = ImageDecodeCache::with_capacity(2);

        let a = write_png(dir.path(), "a.png");
        let b = write_png(dir.path(), "b.png");
        let c = write_png(dir.path(), "c.png");

        cache.get(&a).unwrap();
        cache.get(&b).unwrap();
        cache.get(&c).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&a));
        assert!(cache.contains(&b));
        assert!(cache.contains(&c));
    }
}
