//! A remembered QR painter for immediate-mode and retained UIs.
//!
//! [`QrPainter`] owns the latest rendered bitmap and renders on a background
//! thread. Until a render lands (or when it fails) it hands out a transparent
//! placeholder of the requested size, so the layout never jumps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use flume::{Receiver, TryRecvError};
use log::{debug, warn};

use crate::error::{check_request, Result};
use crate::helper::{create_default_bitmap, generate_qr_bitmap_with, generate_qr_bitmap_with_overlay_with, Bitmap};
use crate::matrix::{QrCodeEncoder, QrEncoder};
use crate::options::RenderOptions;
use crate::units::{Density, Dp};

/// Default edge length of a plain painter.
pub const DEFAULT_SIZE: Dp = Dp(150.0);
/// Default edge length of a painter with a logo.
pub const DEFAULT_LOGO_SIZE: Dp = Dp(600.0);

/// What a [`QrPainter`] should draw.
#[derive(Clone, Debug)]
pub struct PainterRequest {
    pub content: String,
    pub size: Dp,
    pub padding: Dp,
    pub logo: Option<Arc<Bitmap>>,
    pub options: RenderOptions,
}

impl PainterRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            size: DEFAULT_SIZE,
            padding: Dp::ZERO,
            logo: None,
            options: RenderOptions::default(),
        }
    }

    pub fn with_logo(content: impl Into<String>, logo: Bitmap) -> Self {
        Self {
            size: DEFAULT_LOGO_SIZE,
            logo: Some(Arc::new(logo)),
            ..Self::new(content)
        }
    }

    pub fn size(mut self, size: Dp) -> Self {
        self.size = size;
        self
    }

    pub fn padding(mut self, padding: Dp) -> Self {
        self.padding = padding;
        self
    }

    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    fn same_render(&self, other: &Self) -> bool {
        let same_logo = match (&self.logo, &other.logo) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.content == other.content
            && self.size == other.size
            && self.padding == other.padding
            && self.options == other.options
            && same_logo
    }
}

/// Work handed to a render thread.
type Job = Box<dyn FnOnce() + Send + 'static>;

fn spawn_thread(job: Job) -> std::io::Result<()> {
    thread::Builder::new()
        .name("qrpaint-render".to_string())
        .spawn(job)
        .map(|_| ())
}

/// A render in flight: where its result arrives and how to call it off.
struct Render {
    recv: Receiver<Option<Bitmap>>,
    cancelled: Arc<AtomicBool>,
}

impl Render {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Holds the bitmap for a [`PainterRequest`] and keeps it up to date.
///
/// Replacing the request cancels the render in flight. A cancelled render
/// that has not started encoding skips the encoder entirely; one that is
/// already encoding finishes, and its result is dropped unsent. Dropping the
/// painter cancels as well.
pub struct QrPainter {
    request: PainterRequest,
    density: Density,
    size_px: i32,
    padding_px: i32,
    encoder: Arc<dyn QrEncoder>,
    placeholder: Bitmap,
    bitmap: Option<Bitmap>,
    pending: Option<Render>,
    spawn: fn(Job) -> std::io::Result<()>,
}

impl QrPainter {
    /// Validates `request` and starts rendering it with the default encoder.
    pub fn new(request: PainterRequest, density: Density) -> Result<Self> {
        Self::with_encoder(request, density, Arc::new(QrCodeEncoder))
    }

    pub fn with_encoder(request: PainterRequest, density: Density, encoder: Arc<dyn QrEncoder>) -> Result<Self> {
        let (size_px, padding_px) = pixel_request(&request, &density)?;
        let mut painter = Self {
            request,
            density,
            size_px,
            padding_px,
            encoder,
            placeholder: create_default_bitmap(size_px),
            bitmap: None,
            pending: None,
            spawn: spawn_thread,
        };
        let render = painter.launch(&painter.request, size_px, padding_px)?;
        painter.pending = Some(render);
        Ok(painter)
    }

    /// The bitmap to draw right now.
    pub fn image(&self) -> &Bitmap {
        self.bitmap.as_ref().unwrap_or(&self.placeholder)
    }

    /// Whether a rendered QR code (rather than the placeholder) is shown.
    pub fn is_rendered(&self) -> bool {
        self.bitmap.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn request(&self) -> &PainterRequest {
        &self.request
    }

    pub fn size_px(&self) -> i32 {
        self.size_px
    }

    pub fn padding_px(&self) -> i32 {
        self.padding_px
    }

    /// Picks up a finished render without blocking. Returns true when the
    /// displayed image changed.
    pub fn poll(&mut self) -> bool {
        let Some(render) = &self.pending else {
            return false;
        };
        match render.recv.try_recv() {
            Ok(bitmap) => {
                self.finish(bitmap);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                warn!("render worker exited without a result");
                self.finish(None);
                true
            }
        }
    }

    /// Blocks until the in-flight render, if any, has landed.
    pub fn wait(&mut self) -> &Bitmap {
        if let Some(render) = self.pending.take() {
            match render.recv.recv() {
                Ok(bitmap) => self.finish(bitmap),
                Err(_) => {
                    warn!("render worker exited without a result");
                    self.finish(None);
                }
            }
        }
        self.image()
    }

    /// Re-renders when `content` differs from the current content.
    pub fn set_content(&mut self, content: impl Into<String>) -> Result<bool> {
        let request = PainterRequest {
            content: content.into(),
            ..self.request.clone()
        };
        self.update(request)
    }

    /// Replaces the request, re-rendering when anything that affects the
    /// output changed. Returns whether a new render was started.
    ///
    /// An invalid request, or one whose render cannot be started, is
    /// rejected and the painter keeps its state.
    pub fn update(&mut self, request: PainterRequest) -> Result<bool> {
        let (size_px, padding_px) = pixel_request(&request, &self.density)?;
        if request.same_render(&self.request) {
            return Ok(false);
        }

        let render = self.launch(&request, size_px, padding_px)?;
        debug!("qr painter input changed, re-rendering at {}px", size_px);
        if let Some(previous) = self.pending.replace(render) {
            previous.cancel();
        }
        if size_px != self.size_px {
            self.placeholder = create_default_bitmap(size_px);
        }
        self.request = request;
        self.size_px = size_px;
        self.padding_px = padding_px;
        Ok(true)
    }

    fn finish(&mut self, bitmap: Option<Bitmap>) {
        self.pending = None;
        if bitmap.is_none() {
            warn!("showing placeholder, QR code could not be generated");
        }
        self.bitmap = bitmap;
    }

    /// Starts rendering `request` on a worker thread without touching the
    /// painter's state.
    fn launch(&self, request: &PainterRequest, size_px: i32, padding_px: i32) -> Result<Render> {
        let (send, recv) = flume::bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));

        let encoder = Arc::clone(&self.encoder);
        let request = request.clone();
        let flag = Arc::clone(&cancelled);
        (self.spawn)(Box::new(move || {
            let bitmap = render_request(encoder.as_ref(), &request, size_px, padding_px, &flag);
            if flag.load(Ordering::Acquire) {
                debug!("dropping result of a superseded render");
                return;
            }
            // The painter may have moved on; nobody is listening then.
            let _ = send.send(bitmap);
        }))?;

        Ok(Render { recv, cancelled })
    }
}

impl Drop for QrPainter {
    fn drop(&mut self) {
        if let Some(render) = &self.pending {
            render.cancel();
        }
    }
}

/// Renders `request` unless it was cancelled before encoding started.
fn render_request(
    encoder: &dyn QrEncoder,
    request: &PainterRequest,
    size_px: i32,
    padding_px: i32,
    cancelled: &AtomicBool,
) -> Option<Bitmap> {
    if cancelled.load(Ordering::Acquire) {
        return None;
    }
    let rendered = match &request.logo {
        Some(logo) => generate_qr_bitmap_with_overlay_with(
            encoder,
            &request.content,
            logo,
            size_px,
            padding_px,
            &request.options,
        ),
        None => generate_qr_bitmap_with(encoder, &request.content, size_px, padding_px, &request.options),
    };
    // Preconditions were checked before spawning.
    rendered.ok().flatten()
}

fn pixel_request(request: &PainterRequest, density: &Density) -> Result<(i32, i32)> {
    let size_px = density.round_to_px(request.size);
    let padding_px = density.round_to_px(request.padding);
    check_request(&request.content, size_px, padding_px)?;
    Ok((size_px, padding_px))
}

/// Creates a painter for `content`, rendered at `size` with `padding` quiet zone.
pub fn remember_qr_bitmap_painter(content: &str, size: Dp, padding: Dp, density: Density) -> Result<QrPainter> {
    QrPainter::new(PainterRequest::new(content).size(size).padding(padding), density)
}

/// Creates a painter for `content` with `logo` drawn over the center.
pub fn remember_qr_bitmap_painter_with_logo(
    content: &str,
    logo: Bitmap,
    size: Dp,
    padding: Dp,
    density: Density,
) -> Result<QrPainter> {
    QrPainter::new(
        PainterRequest::with_logo(content, logo).size(size).padding(padding),
        density,
    )
}
