//! Bochs/QEMU VBE DISPI display driver
//!
//! Programs the DISPI register interface through ports `0x01CE`/`0x01CF`
//! and hands out the linear framebuffer at its conventional physical
//! address, which the kernel is expected to identity-map.

use x86_64::instructions::port::Port;

use crate::framebuffer::{DisplayDriver, FramebufferError, LinearSurface};

const DISPI_IOPORT_INDEX: u16 = 0x01CE;
const DISPI_IOPORT_DATA: u16 = 0x01CF;

const DISPI_INDEX_ID: u16 = 0;
const DISPI_INDEX_XRES: u16 = 1;
const DISPI_INDEX_YRES: u16 = 2;
const DISPI_INDEX_BPP: u16 = 3;
const DISPI_INDEX_ENABLE: u16 = 4;

/// Newest interface revision; older adapters report 0xB0C0..0xB0C4
const DISPI_ID5: u16 = 0xB0C5;
const DISPI_ID0: u16 = 0xB0C0;

const DISPI_DISABLED: u16 = 0x00;
const DISPI_ENABLED: u16 = 0x01;
const DISPI_LFB_ENABLED: u16 = 0x40;

/// Typical linear framebuffer base on Bochs/QEMU
pub const DEFAULT_LFB_BASE: usize = 0xFD00_0000;

/// Bochs/QEMU standard VGA adapter
pub struct BochsVbe {
    index: Port<u16>,
    data: Port<u16>,
    lfb_base: usize,
}

impl BochsVbe {
    /// # Safety
    ///
    /// The DISPI ports must belong to a Bochs-compatible adapter and
    /// `lfb_base` must be mapped writable for the largest mode that will
    /// be requested.
    pub const unsafe fn new(lfb_base: usize) -> Self {
        Self {
            index: Port::new(DISPI_IOPORT_INDEX),
            data: Port::new(DISPI_IOPORT_DATA),
            lfb_base,
        }
    }

    fn write(&mut self, index: u16, value: u16) {
        // Safety: port ownership is asserted by `new`
        unsafe {
            self.index.write(index);
            self.data.write(value);
        }
    }

    fn read(&mut self, index: u16) -> u16 {
        // Safety: port ownership is asserted by `new`
        unsafe {
            self.index.write(index);
            self.data.read()
        }
    }
}

impl DisplayDriver for BochsVbe {
    fn set_mode(
        &mut self,
        width: u32,
        height: u32,
        bpp: u32,
    ) -> Result<LinearSurface, FramebufferError> {
        let (Ok(xres), Ok(yres), Ok(depth)) =
            (u16::try_from(width), u16::try_from(height), u16::try_from(bpp))
        else {
            return Err(FramebufferError::InvalidMode { width, height });
        };

        self.write(DISPI_INDEX_ID, DISPI_ID5);
        let id = self.read(DISPI_INDEX_ID);
        if !(DISPI_ID0..=DISPI_ID5).contains(&id) {
            log::warn!("[FB] No DISPI adapter (id {:#06x})", id);
            return Err(FramebufferError::ModeSetFailed);
        }

        self.write(DISPI_INDEX_ENABLE, DISPI_DISABLED);
        self.write(DISPI_INDEX_XRES, xres);
        self.write(DISPI_INDEX_YRES, yres);
        self.write(DISPI_INDEX_BPP, depth);
        self.write(DISPI_INDEX_ENABLE, DISPI_ENABLED | DISPI_LFB_ENABLED);

        log::debug!("[FB] DISPI id {:#06x}, LFB at {:#x}", id, self.lfb_base);

        let pixels = width as usize * height as usize;
        // Safety: mapping of the LFB is asserted by `new`
        unsafe { LinearSurface::mapped(self.lfb_base as *mut u32, pixels) }
            .ok_or(FramebufferError::ModeSetFailed)
    }
}
