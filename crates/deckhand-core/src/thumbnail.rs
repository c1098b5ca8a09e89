//! Slide preview thumbnails.
//!
//! Capture runs in two phases so it can take as long as the backend needs:
//! [`ThumbnailSync::take_due`] hands out a [`CaptureRequest`] once the
//! debounce expires, the host runs a [`SlideCapture`], and
//! [`ThumbnailSync::apply`] stores the result. Requests already in flight
//! are never cancelled; the last one to finish wins.
//!
//! Thumbnails are cosmetic. Every failure here is logged and dropped.

use crate::config::{CanvasConfig, ThumbnailConfig};
use crate::deck::{Slide, SlideDeck, SlideId, SlidePatch};
use crate::elements::{ElementKind, SerializableColor};
use crate::timing::{Debouncer, Instant};
use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use thiserror::Error;

/// Capture errors.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Capture region is empty")]
    EmptyRegion,
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("Capture backend error: {0}")]
    Backend(String),
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Boxed future for capture backends (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Raw RGBA8 raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaImage {
    /// RGBA pixel data (4 bytes per pixel).
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RgbaImage {
    /// A raster filled with one color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            pixels: color.repeat(count),
            width,
            height,
        }
    }

    /// Get the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Source-over blend `color` into the pixel rectangle `[x0, x1) × [y0, y1)`.
    fn blend_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: [u8; 4]) {
        let alpha = color[3] as u32;
        if alpha == 0 {
            return;
        }
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                let i = (y as usize * self.width as usize + x as usize) * 4;
                for c in 0..3 {
                    let dst = self.pixels[i + c] as u32;
                    self.pixels[i + c] = ((color[c] as u32 * alpha + dst * (255 - alpha)) / 255) as u8;
                }
                let dst_a = self.pixels[i + 3] as u32;
                self.pixels[i + 3] = (alpha + dst_a * (255 - alpha) / 255) as u8;
            }
        }
    }
}

/// Encode a raster as a `data:image/png;base64,...` URL.
pub fn encode_png_data_url(image: &RgbaImage) -> CaptureResult<String> {
    use base64::{Engine, engine::general_purpose::STANDARD};

    if image.width == 0 || image.height == 0 {
        return Err(CaptureError::EmptyRegion);
    }

    let mut png_data = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_data, image.width, image.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder
            .write_header()
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        writer
            .write_image_data(&image.pixels)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
    }

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png_data)))
}

/// Renders a slide to pixels.
pub trait SlideCapture {
    /// Render `slide` into a `width × height` raster.
    fn capture<'a>(&'a self, slide: &'a Slide, width: u32, height: u32) -> BoxFuture<'a, CaptureResult<RgbaImage>>;
}

/// CPU capture that paints the background and each element's bounds.
///
/// Good enough for a sidebar preview; text and images are drawn as
/// tinted blocks.
#[derive(Debug, Clone)]
pub struct SoftwareRasterizer {
    /// Logical slide size the element coordinates refer to.
    pub canvas_width: f64,
    pub canvas_height: f64,
}

impl Default for SoftwareRasterizer {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

impl SoftwareRasterizer {
    /// Create a rasterizer for the given logical canvas.
    pub fn new(canvas: &CanvasConfig) -> Self {
        Self {
            canvas_width: canvas.width,
            canvas_height: canvas.height,
        }
    }

    /// Render synchronously.
    pub fn render(&self, slide: &Slide, width: u32, height: u32) -> CaptureResult<RgbaImage> {
        if width == 0 || height == 0 || self.canvas_width <= 0.0 || self.canvas_height <= 0.0 {
            return Err(CaptureError::EmptyRegion);
        }

        let sx = width as f64 / self.canvas_width;
        let sy = height as f64 / self.canvas_height;
        let mut image = RgbaImage::filled(width, height, slide.background.to_array());

        for element in &slide.elements {
            let bounds = element.bounds().abs();
            let to_px = |v: f64, scale: f64, max: u32| (v * scale).round().clamp(0.0, max as f64) as u32;
            let x0 = to_px(bounds.x0, sx, width);
            let y0 = to_px(bounds.y0, sy, height);
            let x1 = to_px(bounds.x1, sx, width);
            let y1 = to_px(bounds.y1, sy, height);
            image.blend_rect(x0, y0, x1, y1, preview_color(&element.kind).to_array());
        }

        Ok(image)
    }
}

impl SlideCapture for SoftwareRasterizer {
    fn capture<'a>(&'a self, slide: &'a Slide, width: u32, height: u32) -> BoxFuture<'a, CaptureResult<RgbaImage>> {
        Box::pin(async move { self.render(slide, width, height) })
    }
}

/// Flat color standing in for an element in previews.
fn preview_color(kind: &ElementKind) -> SerializableColor {
    match kind {
        ElementKind::Text(text) => SerializableColor { a: 160, ..text.color },
        ElementKind::Image(_) => SerializableColor::new(203, 213, 225, 255),
        ElementKind::Shape(shape) => shape.fill.unwrap_or(shape.stroke),
        ElementKind::Chart(_) => SerializableColor::new(99, 102, 241, 255),
        ElementKind::Table(_) => SerializableColor::new(226, 232, 240, 255),
    }
}

/// A capture the host should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub slide_id: SlideId,
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
}

/// Debounced, change-driven thumbnail regeneration.
#[derive(Debug, Clone)]
pub struct ThumbnailSync {
    debouncer: Debouncer,
    pixel_size: (u32, u32),
    /// Fingerprint of the active slide content last observed.
    last_fingerprint: Option<u64>,
    in_flight: usize,
}

impl Default for ThumbnailSync {
    fn default() -> Self {
        Self::new(&ThumbnailConfig::default())
    }
}

impl ThumbnailSync {
    /// Create an idle scheduler from configuration.
    pub fn new(config: &ThumbnailConfig) -> Self {
        Self {
            debouncer: Debouncer::new(config.debounce()),
            pixel_size: config.pixel_size(),
            last_fingerprint: None,
            in_flight: 0,
        }
    }

    /// Raster size of produced thumbnails.
    pub fn pixel_size(&self) -> (u32, u32) {
        self.pixel_size
    }

    /// Captures handed out and not yet applied.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// When the pending capture becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Look at the deck and schedule a capture if the active slide changed.
    ///
    /// Thumbnails themselves are not part of the fingerprint, so storing
    /// one never schedules another capture.
    pub fn observe<D: SlideDeck + ?Sized>(&mut self, deck: &D, now: Instant) -> bool {
        let Some(fingerprint) = content_fingerprint(deck) else {
            return false;
        };
        if self.last_fingerprint == Some(fingerprint) {
            return false;
        }
        self.last_fingerprint = Some(fingerprint);
        self.debouncer.schedule(now);
        true
    }

    /// Force the next `observe` to treat the deck as changed.
    pub fn invalidate(&mut self) {
        self.last_fingerprint = None;
    }

    /// Drop a scheduled capture that has not been handed out yet.
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }

    /// Hand out a capture request once the debounce has expired.
    pub fn take_due<D: SlideDeck + ?Sized>(&mut self, deck: &D, now: Instant) -> Option<CaptureRequest> {
        if !self.debouncer.fire(now) {
            return None;
        }
        let slide = deck.current_slide()?;
        self.in_flight += 1;
        Some(CaptureRequest {
            slide_id: slide.id,
            width: self.pixel_size.0,
            height: self.pixel_size.1,
        })
    }

    /// Store a finished capture. Returns true if the slide was updated.
    ///
    /// Failed captures, slides deleted in the meantime and thumbnails
    /// identical to the stored one all leave the deck untouched.
    pub fn apply<D: SlideDeck + ?Sized>(
        &mut self,
        request: &CaptureRequest,
        result: CaptureResult<RgbaImage>,
        deck: &mut D,
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        let encoded = match result.and_then(|image| encode_png_data_url(&image)) {
            Ok(encoded) => encoded,
            Err(err) => {
                log::debug!("thumbnail capture failed: {err}");
                return false;
            }
        };

        let Some(index) = deck.index_of(request.slide_id) else {
            log::debug!("thumbnail for removed slide {} dropped", request.slide_id);
            return false;
        };
        if deck.slides()[index].thumbnail.as_deref() == Some(encoded.as_str()) {
            return false;
        }

        match deck.update_slide(index, SlidePatch::thumbnail(Some(encoded))) {
            Ok(()) => true,
            Err(err) => {
                log::debug!("thumbnail write failed: {err}");
                false
            }
        }
    }

    /// Take a due request, capture it and apply the result in one go.
    pub async fn run_due<D, C>(&mut self, deck: &mut D, capture: &C, now: Instant) -> bool
    where
        D: SlideDeck + ?Sized,
        C: SlideCapture + ?Sized,
    {
        let Some(request) = self.take_due(deck, now) else {
            return false;
        };
        let Some(slide) = deck.index_of(request.slide_id).map(|i| deck.slides()[i].clone()) else {
            self.in_flight = self.in_flight.saturating_sub(1);
            return false;
        };
        let result = capture.capture(&slide, request.width, request.height).await;
        self.apply(&request, result, deck)
    }
}

/// Hash of the active index plus the active slide's elements and background.
fn content_fingerprint<D: SlideDeck + ?Sized>(deck: &D) -> Option<u64> {
    let index = deck.current_index();
    let slide = deck.current_slide()?;
    let content = match serde_json::to_string(&(index, slide.id, &slide.elements, slide.background)) {
        Ok(content) => content,
        Err(err) => {
            log::debug!("could not fingerprint slide: {err}");
            return None;
        }
    };
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    Some(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::Presentation;
    use crate::elements::{Element, Shape, ShapeKind};
    use crate::timing::Duration;
    use std::cell::Cell;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

        fn dummy_raw_waker() -> RawWaker {
            fn no_op(_: *const ()) {}
            fn clone(_: *const ()) -> RawWaker {
                dummy_raw_waker()
            }
            static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
            RawWaker::new(std::ptr::null(), &VTABLE)
        }

        let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
                return result;
            }
        }
    }

    /// Always returns the same raster and counts calls.
    #[derive(Default)]
    struct FixedCapture {
        calls: Cell<u32>,
    }

    impl SlideCapture for FixedCapture {
        fn capture<'a>(&'a self, _slide: &'a Slide, width: u32, height: u32) -> BoxFuture<'a, CaptureResult<RgbaImage>> {
            self.calls.set(self.calls.get() + 1);
            Box::pin(async move { Ok(RgbaImage::filled(width, height, [255, 0, 0, 255])) })
        }
    }

    struct FailingCapture;

    impl SlideCapture for FailingCapture {
        fn capture<'a>(&'a self, _slide: &'a Slide, _width: u32, _height: u32) -> BoxFuture<'a, CaptureResult<RgbaImage>> {
            Box::pin(async { Err(CaptureError::Backend("gpu lost".into())) })
        }
    }

    fn red_square() -> Element {
        let mut shape = Shape::new(ShapeKind::Rectangle);
        shape.fill = Some(SerializableColor::new(255, 0, 0, 255));
        Element::new(0.0, 0.0, 480.0, 270.0, ElementKind::Shape(shape))
    }

    #[test]
    fn test_encode_png_data_url() {
        let image = RgbaImage::filled(4, 2, [0, 0, 0, 255]);
        let url = encode_png_data_url(&image).unwrap();
        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_encode_empty_fails() {
        let image = RgbaImage::filled(0, 2, [0, 0, 0, 255]);
        assert!(matches!(encode_png_data_url(&image), Err(CaptureError::EmptyRegion)));
    }

    #[test]
    fn test_software_rasterizer_paints_elements() {
        let slide = Slide::with_elements(vec![red_square()]);
        let image = SoftwareRasterizer::default().render(&slide, 200, 112).unwrap();

        assert_eq!(image.pixels.len(), 200 * 112 * 4);
        assert_eq!(image.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(image.pixel(150, 100), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_software_rasterizer_rejects_empty() {
        let slide = Slide::new();
        assert!(matches!(
            SoftwareRasterizer::default().render(&slide, 0, 10),
            Err(CaptureError::EmptyRegion)
        ));
    }

    #[test]
    fn test_debounced_capture_on_change() {
        let mut deck = Presentation::new();
        let mut sync = ThumbnailSync::default();
        let start = Instant::now();

        assert!(sync.observe(&deck, start));
        assert!(!sync.observe(&deck, start + Duration::from_millis(100)));
        assert!(sync.take_due(&deck, start + Duration::from_millis(499)).is_none());

        deck.update_slide(0, SlidePatch::elements(vec![red_square()])).unwrap();
        assert!(sync.observe(&deck, start + Duration::from_millis(200)));
        assert!(sync.take_due(&deck, start + Duration::from_millis(600)).is_none());

        let request = sync.take_due(&deck, start + Duration::from_millis(700)).unwrap();
        assert_eq!(request.slide_id, deck.slides()[0].id);
        assert_eq!((request.width, request.height), (400, 224));
        assert_eq!(sync.in_flight(), 1);
    }

    #[test]
    fn test_identical_thumbnail_written_once() {
        let mut deck = Presentation::new();
        let mut sync = ThumbnailSync::default();
        let capture = FixedCapture::default();
        let start = Instant::now();

        sync.observe(&deck, start);
        assert!(block_on(sync.run_due(&mut deck, &capture, start + Duration::from_millis(500))));
        assert!(deck.slides()[0].thumbnail.is_some());

        // Storing the thumbnail is not a content change
        assert!(!sync.observe(&deck, start + Duration::from_millis(600)));

        sync.invalidate();
        assert!(sync.observe(&deck, start + Duration::from_millis(700)));
        assert!(!block_on(sync.run_due(&mut deck, &capture, start + Duration::from_millis(1200))));
        assert_eq!(capture.calls.get(), 2);
        assert_eq!(sync.in_flight(), 0);
    }

    #[test]
    fn test_capture_failure_is_silent() {
        let mut deck = Presentation::new();
        let mut sync = ThumbnailSync::default();
        let start = Instant::now();

        sync.observe(&deck, start);
        assert!(!block_on(sync.run_due(&mut deck, &FailingCapture, start + Duration::from_secs(1))));
        assert!(deck.slides()[0].thumbnail.is_none());
        assert_eq!(sync.in_flight(), 0);
    }

    #[test]
    fn test_in_flight_capture_survives_new_request() {
        let mut deck = Presentation::new();
        let mut sync = ThumbnailSync::default();
        let rasterizer = SoftwareRasterizer::default();
        let start = Instant::now();

        sync.observe(&deck, start);
        let first = sync.take_due(&deck, start + Duration::from_millis(500)).unwrap();
        let first_image = rasterizer.render(&deck.slides()[0], first.width, first.height);

        deck.update_slide(0, SlidePatch::elements(vec![red_square()])).unwrap();
        sync.observe(&deck, start + Duration::from_millis(600));
        let second = sync.take_due(&deck, start + Duration::from_millis(1100)).unwrap();
        let second_image = rasterizer.render(&deck.slides()[0], second.width, second.height);
        assert_eq!(sync.in_flight(), 2);

        // Later-resolving write wins
        assert!(sync.apply(&second, second_image, &mut deck));
        assert!(sync.apply(&first, first_image, &mut deck));
        let blank = encode_png_data_url(&rasterizer.render(&Slide::new(), 400, 224).unwrap()).unwrap();
        assert_eq!(deck.slides()[0].thumbnail.as_deref(), Some(blank.as_str()));
        assert_eq!(sync.in_flight(), 0);
    }

    #[test]
    fn test_apply_for_removed_slide_is_dropped() {
        let mut deck = Presentation::new();
        deck.add_slide();
        let mut sync = ThumbnailSync::default();
        let start = Instant::now();

        sync.observe(&deck, start);
        let request = sync.take_due(&deck, start + Duration::from_millis(500)).unwrap();
        deck.remove_slide(1).unwrap();

        let image = RgbaImage::filled(request.width, request.height, [0, 0, 0, 255]);
        assert!(!sync.apply(&request, Ok(image), &mut deck));
    }

    #[test]
    fn test_switching_slide_schedules_capture() {
        let mut deck = Presentation::new();
        deck.add_slide();
        let mut sync = ThumbnailSync::default();
        let start = Instant::now();

        sync.observe(&deck, start);
        sync.take_due(&deck, start + Duration::from_millis(500));
        deck.set_current(0).unwrap();
        assert!(sync.observe(&deck, start + Duration::from_millis(600)));
    }
}
