//! Wire frames - zero-copy views over inbound and outbound messages.
//!
//! A view wraps a `(buffer, offset)` pair and reads or writes the fixed
//! little-endian layout in place; nothing is deserialized into an
//! intermediate struct. The ingress path wraps each inbound frame where
//! the transport lends it, copies the four scalars into a claimed ring
//! slot, and moves on.
//!
//! Inbound order frame (25 bytes):
//!
//! ```text
//!   0                   8                   16                  24   25
//!   +-------------------+-------------------+-------------------+----+
//!   |     order_id      |      price        |     quantity      |side|
//!   +-------------------+-------------------+-------------------+----+
//! ```
//!
//! Outbound execution report (26 bytes):
//!
//! ```text
//!   0                   8                   16                  24     25    26
//!   +-------------------+-------------------+-------------------+------+-----+
//!   |     order_id      |    filled_qty     |    fill_price     |status|side |
//!   +-------------------+-------------------+-------------------+------+-----+
//! ```

use crate::command::{Command, Side};
use crate::error::FrameError;

/// Total length of an inbound order frame.
pub const ORDER_FRAME_LEN: usize = 25;

const ORDER_ID_OFFSET: usize = 0;
const PRICE_OFFSET: usize = 8;
const QUANTITY_OFFSET: usize = 16;
const SIDE_OFFSET: usize = 24;

/// Total length of an outbound execution report frame.
pub const EXEC_REPORT_LEN: usize = 26;

const REPORT_ORDER_ID_OFFSET: usize = 0;
const FILLED_QTY_OFFSET: usize = 8;
const FILL_PRICE_OFFSET: usize = 16;
const STATUS_OFFSET: usize = 24;
const REPORT_SIDE_OFFSET: usize = 25;

/// Execution report status byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ExecStatus {
    /// Order rested; `filled_qty` carries the resting quantity
    Accepted = 0,
    /// A fill slice; `filled_qty` carries the traded quantity
    Filled = 1,
}

impl ExecStatus {
    #[inline]
    pub const fn to_wire(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_wire(byte: u8) -> Result<Self, FrameError> {
        match byte {
            0 => Ok(ExecStatus::Accepted),
            1 => Ok(ExecStatus::Filled),
            other => Err(FrameError::UnknownStatus(other)),
        }
    }
}

#[inline]
fn read_i64(buf: &[u8], offset: usize) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    i64::from_le_bytes(bytes)
}

#[inline]
fn write_i64(buf: &mut [u8], offset: usize, value: i64) {
    buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn window(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], FrameError> {
    buf.get(offset..offset + len).ok_or(FrameError::Truncated {
        needed: len,
        offset,
        available: buf.len(),
    })
}

#[inline]
fn window_mut(buf: &mut [u8], offset: usize, len: usize) -> Result<&mut [u8], FrameError> {
    let available = buf.len();
    buf.get_mut(offset..offset + len).ok_or(FrameError::Truncated {
        needed: len,
        offset,
        available,
    })
}

/// Read view over an inbound order frame.
#[derive(Clone, Copy, Debug)]
pub struct OrderFrame<'a> {
    buf: &'a [u8],
}

impl<'a> OrderFrame<'a> {
    /// Wrap a frame at `offset` within `buf`.
    #[inline]
    pub fn wrap(buf: &'a [u8], offset: usize) -> Result<Self, FrameError> {
        Ok(Self {
            buf: window(buf, offset, ORDER_FRAME_LEN)?,
        })
    }

    #[inline]
    pub fn order_id(&self) -> i64 {
        read_i64(self.buf, ORDER_ID_OFFSET)
    }

    #[inline]
    pub fn price(&self) -> i64 {
        read_i64(self.buf, PRICE_OFFSET)
    }

    #[inline]
    pub fn quantity(&self) -> i64 {
        read_i64(self.buf, QUANTITY_OFFSET)
    }

    #[inline]
    pub fn side(&self) -> Result<Side, FrameError> {
        Side::from_wire(self.buf[SIDE_OFFSET])
    }

    /// Extract all four fields as a ring-buffer command.
    #[inline]
    pub fn to_command(&self) -> Result<Command, FrameError> {
        Ok(Command {
            id: self.order_id(),
            price: self.price(),
            qty: self.quantity(),
            side: self.side()?,
        })
    }
}

/// Write view over an inbound order frame (gateway side).
#[derive(Debug)]
pub struct OrderFrameMut<'a> {
    buf: &'a mut [u8],
}

impl<'a> OrderFrameMut<'a> {
    #[inline]
    pub fn wrap(buf: &'a mut [u8], offset: usize) -> Result<Self, FrameError> {
        Ok(Self {
            buf: window_mut(buf, offset, ORDER_FRAME_LEN)?,
        })
    }

    #[inline]
    pub fn set_order_id(&mut self, id: i64) -> &mut Self {
        write_i64(self.buf, ORDER_ID_OFFSET, id);
        self
    }

    #[inline]
    pub fn set_price(&mut self, price: i64) -> &mut Self {
        write_i64(self.buf, PRICE_OFFSET, price);
        self
    }

    #[inline]
    pub fn set_quantity(&mut self, qty: i64) -> &mut Self {
        write_i64(self.buf, QUANTITY_OFFSET, qty);
        self
    }

    #[inline]
    pub fn set_side(&mut self, side: Side) -> &mut Self {
        self.buf[SIDE_OFFSET] = side.to_wire();
        self
    }
}

/// Read view over an outbound execution report.
#[derive(Clone, Copy, Debug)]
pub struct ExecReportFrame<'a> {
    buf: &'a [u8],
}

impl<'a> ExecReportFrame<'a> {
    #[inline]
    pub fn wrap(buf: &'a [u8], offset: usize) -> Result<Self, FrameError> {
        Ok(Self {
            buf: window(buf, offset, EXEC_REPORT_LEN)?,
        })
    }

    #[inline]
    pub fn order_id(&self) -> i64 {
        read_i64(self.buf, REPORT_ORDER_ID_OFFSET)
    }

    /// Resting quantity for ACCEPTED, traded slice for FILLED.
    #[inline]
    pub fn filled_qty(&self) -> i64 {
        read_i64(self.buf, FILLED_QTY_OFFSET)
    }

    /// Passive level price; equals the submission price for ACCEPTED.
    #[inline]
    pub fn fill_price(&self) -> i64 {
        read_i64(self.buf, FILL_PRICE_OFFSET)
    }

    #[inline]
    pub fn status(&self) -> Result<ExecStatus, FrameError> {
        ExecStatus::from_wire(self.buf[STATUS_OFFSET])
    }

    /// The subject order's original side.
    #[inline]
    pub fn side(&self) -> Result<Side, FrameError> {
        Side::from_wire(self.buf[REPORT_SIDE_OFFSET])
    }
}

/// Write view over an outbound execution report (egress side).
#[derive(Debug)]
pub struct ExecReportFrameMut<'a> {
    buf: &'a mut [u8],
}

impl<'a> ExecReportFrameMut<'a> {
    #[inline]
    pub fn wrap(buf: &'a mut [u8], offset: usize) -> Result<Self, FrameError> {
        Ok(Self {
            buf: window_mut(buf, offset, EXEC_REPORT_LEN)?,
        })
    }

    #[inline]
    pub fn set_order_id(&mut self, id: i64) -> &mut Self {
        write_i64(self.buf, REPORT_ORDER_ID_OFFSET, id);
        self
    }

    #[inline]
    pub fn set_filled_qty(&mut self, qty: i64) -> &mut Self {
        write_i64(self.buf, FILLED_QTY_OFFSET, qty);
        self
    }

    #[inline]
    pub fn set_fill_price(&mut self, price: i64) -> &mut Self {
        write_i64(self.buf, FILL_PRICE_OFFSET, price);
        self
    }

    #[inline]
    pub fn set_status(&mut self, status: ExecStatus) -> &mut Self {
        self.buf[STATUS_OFFSET] = status.to_wire();
        self
    }

    #[inline]
    pub fn set_side(&mut self, side: Side) -> &mut Self {
        self.buf[REPORT_SIDE_OFFSET] = side.to_wire();
        self
    }
}
