//! Double-Buffered Framebuffer
//!
//! Owns the hardware-visible linear surface (front) and, once double
//! buffering is enabled, an off-screen back surface. Every drawing
//! primitive writes to the *active* surface: the back surface whenever it
//! exists, the front surface otherwise. `swap_buffers` copies the whole
//! back surface to the front surface.
//!
//! The surface is always 32 bits per pixel, `0x00RRGGBB`, with
//! `pitch = width * 4`.

use alloc::alloc::{alloc_zeroed, dealloc, Layout};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::ptr::NonNull;

use crate::color::Color;
use crate::geometry::Rect;

/// Alignment of the back surface allocation
pub const BACK_BUFFER_ALIGN: usize = 4096;

/// The only supported pixel depth
pub const SUPPORTED_BPP: u32 = 32;

/// Framebuffer error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferError {
    /// Pixel depth other than 32 bpp requested
    UnsupportedDepth(u32),
    /// Zero or out-of-range resolution
    InvalidMode { width: u32, height: u32 },
    /// The display driver handed back a surface smaller than the mode needs
    SurfaceTooSmall { required: usize, available: usize },
    /// The back surface could not be allocated
    OutOfMemory { requested: usize },
    /// The display driver rejected the mode
    ModeSetFailed,
}

impl fmt::Display for FramebufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramebufferError::UnsupportedDepth(bpp) => {
                write!(f, "unsupported pixel depth: {} bpp", bpp)
            }
            FramebufferError::InvalidMode { width, height } => {
                write!(f, "invalid display mode {}x{}", width, height)
            }
            FramebufferError::SurfaceTooSmall {
                required,
                available,
            } => write!(
                f,
                "surface too small: {} bytes required, {} available",
                required, available
            ),
            FramebufferError::OutOfMemory { requested } => {
                write!(f, "out of memory allocating {} bytes", requested)
            }
            FramebufferError::ModeSetFailed => write!(f, "display mode set failed"),
        }
    }
}

// =============================================================================
// SURFACE MEMORY
// =============================================================================

enum SurfaceMemory {
    /// Memory-mapped hardware region
    Mapped { base: NonNull<u32>, len: usize },
    /// Heap-backed surface (headless display, host tests)
    Owned(Vec<u32>),
}

/// A linear 32-bit pixel surface as handed out by a display driver
pub struct LinearSurface {
    memory: SurfaceMemory,
}

// Safety: the mapped region is exclusively owned by the framebuffer that
// holds this surface; nothing else aliases it.
unsafe impl Send for LinearSurface {}

impl LinearSurface {
    /// Wrap a memory-mapped linear framebuffer.
    ///
    /// Returns `None` for a null base address.
    ///
    /// # Safety
    ///
    /// `base` must be valid for reads and writes of `len` pixels for as long
    /// as the returned surface lives, and must not be aliased elsewhere.
    pub unsafe fn mapped(base: *mut u32, len: usize) -> Option<Self> {
        let base = NonNull::new(base)?;
        Some(Self {
            memory: SurfaceMemory::Mapped { base, len },
        })
    }

    /// Allocate a zeroed in-memory surface of `len` pixels
    pub fn owned(len: usize) -> Self {
        Self {
            memory: SurfaceMemory::Owned(vec![0u32; len]),
        }
    }

    /// Length in pixels
    pub fn len(&self) -> usize {
        match &self.memory {
            SurfaceMemory::Mapped { len, .. } => *len,
            SurfaceMemory::Owned(pixels) => pixels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[u32] {
        match &self.memory {
            // Safety: guaranteed by the contract of `mapped`
            SurfaceMemory::Mapped { base, len } => unsafe {
                core::slice::from_raw_parts(base.as_ptr(), *len)
            },
            SurfaceMemory::Owned(pixels) => pixels,
        }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        match &mut self.memory {
            // Safety: guaranteed by the contract of `mapped`
            SurfaceMemory::Mapped { base, len } => unsafe {
                core::slice::from_raw_parts_mut(base.as_ptr(), *len)
            },
            SurfaceMemory::Owned(pixels) => pixels,
        }
    }
}

/// Display mode-set collaborator
pub trait DisplayDriver {
    /// Program the display for `width x height @ bpp` and return the linear
    /// surface that now scans out to the screen.
    fn set_mode(
        &mut self,
        width: u32,
        height: u32,
        bpp: u32,
    ) -> Result<LinearSurface, FramebufferError>;
}

/// Headless display backed by heap memory
#[derive(Debug, Default)]
pub struct MemoryDisplay;

impl MemoryDisplay {
    pub const fn new() -> Self {
        MemoryDisplay
    }
}

impl DisplayDriver for MemoryDisplay {
    fn set_mode(
        &mut self,
        width: u32,
        height: u32,
        _bpp: u32,
    ) -> Result<LinearSurface, FramebufferError> {
        Ok(LinearSurface::owned(width as usize * height as usize))
    }
}

// =============================================================================
// BACK SURFACE ALLOCATION
// =============================================================================

/// Zeroed, aligned heap block holding 32-bit pixels. Freed on drop.
pub struct AlignedBuffer {
    ptr: NonNull<u32>,
    len: usize,
    layout: Layout,
}

// Safety: the allocation is uniquely owned
unsafe impl Send for AlignedBuffer {}

impl AlignedBuffer {
    /// Allocate `bytes` zeroed bytes aligned to `align`.
    ///
    /// Returns `None` when the allocator is exhausted or the request is
    /// malformed (zero size, non power-of-two alignment).
    pub fn zeroed(bytes: usize, align: usize) -> Option<Self> {
        if bytes == 0 {
            return None;
        }
        let align = align.max(core::mem::align_of::<u32>());
        let layout = Layout::from_size_align(bytes, align).ok()?;

        // Safety: layout has non-zero size
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw as *mut u32)?;

        Some(Self {
            ptr,
            len: bytes / core::mem::size_of::<u32>(),
            layout,
        })
    }

    /// Size of the block in bytes
    pub fn byte_len(&self) -> usize {
        self.layout.size()
    }

    /// Alignment of the block
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    pub fn as_slice(&self) -> &[u32] {
        // Safety: ptr is a live allocation of at least len pixels
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        // Safety: ptr is a live, uniquely owned allocation of len pixels
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // Safety: allocated in `zeroed` with this exact layout
        unsafe { dealloc(self.ptr.as_ptr() as *mut u8, self.layout) }
    }
}

/// Aligned-allocation collaborator used for the back surface
pub trait SurfaceAllocator {
    /// Allocate a zeroed block, or `None` on exhaustion
    fn allocate(&mut self, bytes: usize, align: usize) -> Option<AlignedBuffer>;
}

/// Allocates from the kernel heap (the global allocator)
#[derive(Debug, Default, Clone, Copy)]
pub struct KernelHeap;

impl SurfaceAllocator for KernelHeap {
    fn allocate(&mut self, bytes: usize, align: usize) -> Option<AlignedBuffer> {
        AlignedBuffer::zeroed(bytes, align)
    }
}

// =============================================================================
// FRAMEBUFFER DEVICE
// =============================================================================

/// Framebuffer device with optional double buffering
pub struct Framebuffer {
    /// Hardware-visible surface
    front: LinearSurface,
    /// Off-screen render target; present iff double buffering is active
    back: Option<AlignedBuffer>,
    /// Screen width in pixels
    width: u32,
    /// Screen height in pixels
    height: u32,
    /// Bits per pixel
    bpp: u32,
    /// Bytes per row
    pitch: u32,
    /// Total surface size in bytes
    size: usize,
}

impl Framebuffer {
    /// Set the display mode and take ownership of the hardware surface.
    ///
    /// Drawing initially targets the front surface directly.
    pub fn init(
        driver: &mut dyn DisplayDriver,
        width: u32,
        height: u32,
        bpp: u32,
    ) -> Result<Self, FramebufferError> {
        if bpp != SUPPORTED_BPP {
            return Err(FramebufferError::UnsupportedDepth(bpp));
        }
        if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(FramebufferError::InvalidMode { width, height });
        }

        let invalid = FramebufferError::InvalidMode { width, height };
        let pitch = width.checked_mul(bpp / 8).ok_or(invalid)?;
        let size = (pitch as usize)
            .checked_mul(height as usize)
            .ok_or(invalid)?;

        let front = driver.set_mode(width, height, bpp)?;
        let available = front.len() * core::mem::size_of::<u32>();
        if available < size {
            return Err(FramebufferError::SurfaceTooSmall {
                required: size,
                available,
            });
        }

        log::info!(
            "[FB] Mode set: {}x{} @ {} bpp, pitch {} bytes, {} bytes",
            width,
            height,
            bpp,
            pitch,
            size
        );

        Ok(Self {
            front,
            back: None,
            width,
            height,
            bpp,
            pitch,
            size,
        })
    }

    /// Allocate the back surface and redirect drawing to it.
    ///
    /// On failure double buffering stays disabled and drawing keeps
    /// targeting the front surface. On success the back surface is cleared
    /// to black and swapped once so both surfaces match.
    pub fn enable_double_buffer(
        &mut self,
        allocator: &mut dyn SurfaceAllocator,
    ) -> Result<(), FramebufferError> {
        if self.back.is_some() {
            return Ok(());
        }

        let Some(back) = allocator.allocate(self.size, BACK_BUFFER_ALIGN) else {
            log::warn!(
                "[FB] Double buffer allocation failed: out of memory ({} bytes)",
                self.size
            );
            return Err(FramebufferError::OutOfMemory {
                requested: self.size,
            });
        };

        if back.byte_len() < self.size {
            log::warn!("[FB] Double buffer allocation too small, staying single-buffered");
            return Err(FramebufferError::SurfaceTooSmall {
                required: self.size,
                available: back.byte_len(),
            });
        }

        self.back = Some(back);
        self.clear(Color::BLACK);
        self.swap_buffers();

        log::info!(
            "[FB] Double buffer initialized: {} KiB allocated",
            self.size / 1024
        );
        Ok(())
    }

    /// Whether drawing currently targets the back surface
    #[inline]
    pub fn is_double_buffered(&self) -> bool {
        self.back.is_some()
    }

    /// Active drawing surface, limited to the visible pixels
    fn target(&mut self) -> &mut [u32] {
        let pixels = self.width as usize * self.height as usize;
        match &mut self.back {
            Some(back) => &mut back.as_mut_slice()[..pixels],
            None => &mut self.front.as_mut_slice()[..pixels],
        }
    }

    fn target_ref(&self) -> &[u32] {
        let pixels = self.width as usize * self.height as usize;
        match &self.back {
            Some(back) => &back.as_slice()[..pixels],
            None => &self.front.as_slice()[..pixels],
        }
    }

    /// Screen bounds as a rectangle
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Set a single pixel; out-of-bounds coordinates are ignored
    #[inline]
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let offset = y as usize * self.width as usize + x as usize;
        self.target()[offset] = color.to_pixel();
    }

    /// Read a pixel from the active surface
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let offset = y as usize * self.width as usize + x as usize;
        Some(Color::from_pixel(self.target_ref()[offset]))
    }

    /// Fill a rectangle, clipped to the screen
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.fill_rect_clipped(rect, self.bounds(), color);
    }

    /// Fill `rect ∩ clip ∩ screen`
    pub fn fill_rect_clipped(&mut self, rect: Rect, clip: Rect, color: Color) {
        let area = rect.intersect(&clip).intersect(&self.bounds());
        if area.is_empty() {
            return;
        }

        let stride = self.width as usize;
        let pixel = color.to_pixel();
        let target = self.target();

        for row in area.y..area.bottom() {
            let start = row as usize * stride + area.x as usize;
            target[start..start + area.width as usize].fill(pixel);
        }
    }

    /// Fill the whole active surface
    pub fn clear(&mut self, color: Color) {
        self.fill_rect(self.bounds(), color);
    }

    /// Copy the entire back surface to the front surface.
    ///
    /// Always O(size) regardless of how much changed. No-op while double
    /// buffering is disabled.
    pub fn swap_buffers(&mut self) {
        let pixels = self.width as usize * self.height as usize;
        if let Some(back) = &self.back {
            self.front.as_mut_slice()[..pixels].copy_from_slice(&back.as_slice()[..pixels]);
        }
    }

    /// Hardware-visible pixels
    pub fn front_pixels(&self) -> &[u32] {
        let pixels = self.width as usize * self.height as usize;
        &self.front.as_slice()[..pixels]
    }

    /// Off-screen pixels, if double buffering is active
    pub fn back_pixels(&self) -> Option<&[u32]> {
        self.back.as_ref().map(|b| b.as_slice())
    }

    /// Size of the allocated back surface in bytes
    pub fn back_size(&self) -> Option<usize> {
        self.back.as_ref().map(|b| b.byte_len())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bpp(&self) -> u32 {
        self.bpp
    }

    /// Bytes per row
    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    /// Total surface size in bytes
    pub fn size(&self) -> usize {
        self.size
    }
}
