//! Condition icon cache.
//!
//! Icons are keyed by provider condition code only (`01d`, `10n`, ...). The
//! code space is a few dozen entries, so the cache never evicts.

use std::collections::HashMap;
use std::io::Cursor;

use image::imageops::FilterType;
use image::ImageFormat;

use crate::types::IconError;

/// Icons are delivered to the host as square PNGs of this size
pub const ICON_SIZE: u32 = 72;

/// What the caller should do after resolving or completing an icon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconLookup {
    /// Same code as before, nothing to do
    Unchanged,
    /// Another icon request is still running; the active code is fetched after it
    Pending,
    /// The active code's icon is cached
    Ready(String),
    /// The active code's icon could not be fetched
    Unavailable(String),
    /// Fetch this code
    Fetch(String),
}

#[derive(Debug, Default)]
pub struct IconCache {
    icons: HashMap<String, Vec<u8>>,
    active: Option<String>,
    in_flight: Option<String>,
}

impl IconCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `code` the active icon.
    ///
    /// Repeating the active code is a no-op as long as its icon is cached or
    /// being fetched; after a failed fetch it is retried.
    pub fn resolve(&mut self, code: &str) -> IconLookup {
        let is_active = self.active.as_deref() == Some(code);
        let in_flight = self.in_flight.as_deref() == Some(code);
        if is_active && (self.icons.contains_key(code) || in_flight) {
            return IconLookup::Unchanged;
        }

        self.active = Some(code.to_string());

        if self.icons.contains_key(code) {
            tracing::debug!("Icon {} served from cache", code);
            return IconLookup::Ready(code.to_string());
        }
        if self.in_flight.is_some() {
            return IconLookup::Pending;
        }

        self.in_flight = Some(code.to_string());
        IconLookup::Fetch(code.to_string())
    }

    /// Record the result of fetching `code`.
    ///
    /// A failure leaves the cache untouched. If the active code changed while
    /// the request was running, the returned lookup starts its fetch.
    pub fn complete(&mut self, code: &str, result: Result<Vec<u8>, IconError>) -> IconLookup {
        if self.in_flight.as_deref() == Some(code) {
            self.in_flight = None;
        }

        match result {
            Ok(png) => {
                tracing::debug!("Cached icon {} ({} bytes)", code, png.len());
                self.icons.insert(code.to_string(), png);
            }
            Err(e) => tracing::warn!("Icon {} unavailable: {}", code, e),
        }

        let Some(active) = self.active.clone() else {
            return IconLookup::Unchanged;
        };

        if active == code {
            return if self.icons.contains_key(code) {
                IconLookup::Ready(active)
            } else {
                IconLookup::Unavailable(active)
            };
        }

        if self.icons.contains_key(&active) {
            IconLookup::Ready(active)
        } else if self.in_flight.is_none() {
            self.in_flight = Some(active.clone());
            IconLookup::Fetch(active)
        } else {
            IconLookup::Pending
        }
    }

    pub fn active_code(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// PNG for the active code, if cached
    pub fn active_icon(&self) -> Option<&[u8]> {
        self.active
            .as_deref()
            .and_then(|code| self.icons.get(code))
            .map(Vec::as_slice)
    }

    pub fn get(&self, code: &str) -> Option<&[u8]> {
        self.icons.get(code).map(Vec::as_slice)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.icons.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

/// Decode a provider icon, scale it to [`ICON_SIZE`] square and re-encode as PNG.
pub fn render_icon(raw: &[u8]) -> Result<Vec<u8>, IconError> {
    let image = image::load_from_memory(raw)?;
    let resized = image.resize_exact(ICON_SIZE, ICON_SIZE, FilterType::Lanczos3);

    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FetchError;
    use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255])));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn failed() -> Result<Vec<u8>, IconError> {
        Err(IconError::Fetch(FetchError::Status {
            status: 404,
            message: "not found".into(),
        }))
    }

    #[test]
    fn test_render_icon_resizes() {
        let rendered = render_icon(&png(100, 50)).unwrap();
        let decoded = image::load_from_memory(&rendered).unwrap();
        assert_eq!(decoded.dimensions(), (ICON_SIZE, ICON_SIZE));
        assert_eq!(image::guess_format(&rendered).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_render_icon_rejects_garbage() {
        assert!(matches!(render_icon(b"not an image"), Err(IconError::Image(_))));
    }

    #[test]
    fn test_same_code_fetches_once() {
        let mut cache = IconCache::new();
        assert_eq!(cache.resolve("01d"), IconLookup::Fetch("01d".into()));
        // still in flight
        assert_eq!(cache.resolve("01d"), IconLookup::Unchanged);
        assert_eq!(cache.complete("01d", Ok(png(72, 72))), IconLookup::Ready("01d".into()));
        assert_eq!(cache.resolve("01d"), IconLookup::Unchanged);
        assert!(cache.active_icon().is_some());
    }

    #[test]
    fn test_recurring_code_hits_cache() {
        let mut cache = IconCache::new();
        cache.resolve("01d");
        cache.complete("01d", Ok(png(72, 72)));
        assert_eq!(cache.resolve("02d"), IconLookup::Fetch("02d".into()));
        cache.complete("02d", Ok(png(72, 72)));

        assert_eq!(cache.resolve("01d"), IconLookup::Ready("01d".into()));
        assert_eq!(cache.active_code(), Some("01d"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failure_keeps_previous_icon_and_retries() {
        let mut cache = IconCache::new();
        cache.resolve("01d");
        cache.complete("01d", Ok(png(72, 72)));

        assert_eq!(cache.resolve("09d"), IconLookup::Fetch("09d".into()));
        assert_eq!(cache.complete("09d", failed()), IconLookup::Unavailable("09d".into()));

        assert_eq!(cache.active_code(), Some("09d"));
        assert!(cache.active_icon().is_none());
        assert!(cache.get("01d").is_some());
        assert_eq!(cache.len(), 1);

        // next snapshot with the same code retries
        assert_eq!(cache.resolve("09d"), IconLookup::Fetch("09d".into()));
    }

    #[test]
    fn test_code_change_during_fetch() {
        let mut cache = IconCache::new();
        assert_eq!(cache.resolve("01d"), IconLookup::Fetch("01d".into()));
        assert_eq!(cache.resolve("01n"), IconLookup::Pending);

        // the stale result is still cached, then the active code is fetched
        assert_eq!(cache.complete("01d", Ok(png(72, 72))), IconLookup::Fetch("01n".into()));
        assert!(cache.contains("01d"));
        assert_eq!(cache.complete("01n", Ok(png(72, 72))), IconLookup::Ready("01n".into()));
    }
}
