//! Command types flowing from the I/O thread to the matching thread.
//!
//! A `Command` is the pre-allocated ring-buffer slot: the four scalar
//! fields of an inbound order, already extracted from the wire frame.

/// Order side (buy = bid, sell = ask). Wire encoding: 0 = buy, 1 = sell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Buy = 0,
    /// Sell side (asks)
    Sell = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Wire byte for this side.
    #[inline]
    pub const fn to_wire(self) -> u8 {
        self as u8
    }

    /// Decode a wire byte. Anything other than 0/1 is a gateway
    /// validation failure.
    #[inline]
    pub const fn from_wire(byte: u8) -> Result<Self, crate::error::FrameError> {
        match byte {
            0 => Ok(Side::Buy),
            1 => Ok(Side::Sell),
            other => Err(crate::error::FrameError::UnknownSide(other)),
        }
    }
}

/// A new-order command occupying one ring-buffer slot.
///
/// Slots are pre-allocated at startup and overwritten in place by the
/// producer; the fields mirror the inbound frame layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    /// External order ID (assigned upstream by the sequencer)
    pub id: i64,
    /// Fixed-point limit price (e.g. 10000 = 100.00)
    pub price: i64,
    /// Order quantity in lots
    pub qty: i64,
    /// Order side
    pub side: Side,
}

impl Command {
    #[inline]
    pub const fn new(id: i64, price: i64, qty: i64, side: Side) -> Self {
        Self { id, price, qty, side }
    }
}

impl Default for Command {
    /// Empty slot value used to pre-fill the ring at startup.
    fn default() -> Self {
        Self {
            id: 0,
            price: 0,
            qty: 0,
            side: Side::Buy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_side_wire_round_trip() {
        assert_eq!(Side::from_wire(Side::Buy.to_wire()), Ok(Side::Buy));
        assert_eq!(Side::from_wire(Side::Sell.to_wire()), Ok(Side::Sell));
        assert!(Side::from_wire(2).is_err());
        assert!(Side::from_wire(255).is_err());
    }

    #[test]
    fn test_command_slot_default() {
        let slot = Command::default();
        assert_eq!(slot.id, 0);
        assert_eq!(slot.qty, 0);
        assert_eq!(slot.side, Side::Buy);
    }
}
