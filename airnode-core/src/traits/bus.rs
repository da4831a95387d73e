//! Bus Transaction Adapter
//!
//! Blocking register access to one sensor plus a delay primitive. This is
//! the lowest layer the core talks to; an I2C or SPI binding implements it.
//!
//! Every method takes `&mut self`: whoever holds the transport owns the bus.
//! Two sensors on one physical bus go through one owner (or a binding that
//! serialises transactions internally), never concurrent raw access.

use fugit::MicrosDurationU32;

use crate::errors::BusResult;

/// Register-level access to one device
///
/// ## Example Implementation
///
/// ```rust
/// use airnode_core::traits::BusTransport;
/// use airnode_core::errors::{BusError, BusResult};
/// use fugit::MicrosDurationU32;
///
/// struct RegisterFile {
///     regs: [u8; 256],
/// }
///
/// impl BusTransport for RegisterFile {
///     fn read(&mut self, register: u8, buf: &mut [u8]) -> BusResult<()> {
///         let start = register as usize;
///         let src = self.regs.get(start..start + buf.len())
///             .ok_or(BusError::Nack { register })?;
///         buf.copy_from_slice(src);
///         Ok(())
///     }
///
///     fn write(&mut self, register: u8, data: &[u8]) -> BusResult<()> {
///         let start = register as usize;
///         let dst = self.regs.get_mut(start..start + data.len())
///             .ok_or(BusError::Nack { register })?;
///         dst.copy_from_slice(data);
///         Ok(())
///     }
///
///     fn delay(&mut self, _duration: MicrosDurationU32) {}
/// }
/// ```
pub trait BusTransport {
    /// Read `buf.len()` bytes starting at `register`
    ///
    /// A transfer that moves fewer bytes than requested is a
    /// [`BusError::ShortTransfer`](crate::errors::BusError::ShortTransfer).
    fn read(&mut self, register: u8, buf: &mut [u8]) -> BusResult<()>;

    /// Write `data` starting at `register`
    fn write(&mut self, register: u8, data: &[u8]) -> BusResult<()>;

    /// Block for at least `duration`
    fn delay(&mut self, duration: MicrosDurationU32);
}

impl<T: BusTransport + ?Sized> BusTransport for &mut T {
    fn read(&mut self, register: u8, buf: &mut [u8]) -> BusResult<()> {
        (**self).read(register, buf)
    }

    fn write(&mut self, register: u8, data: &[u8]) -> BusResult<()> {
        (**self).write(register, data)
    }

    fn delay(&mut self, duration: MicrosDurationU32) {
        (**self).delay(duration)
    }
}
