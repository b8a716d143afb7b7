//! Board definitions and hardware signatures.
//!
//! Each supported board kind statically determines the set of digital pins a
//! configuration may assign and which four of those pins belong to the SPI bus
//! shared by the display modules. Bus pins are still assignable; callers use
//! [`BoardKind::is_bus_pin`] to flag such assignments as contended rather
//! than forbidding them.
//!
//! The signature table maps USB (vendor id, product id) pairs to board kinds
//! during discovery. Devices from a recognized vendor whose exact model is not
//! in the table classify as [`BoardKind::Unknown`]; everything else is
//! rejected by the enumerator.

use serde::{Deserialize, Serialize};

/// A named microcontroller variant determining the legal pin set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoardKind {
    /// Recognized vendor, unrecognized model. No pin data available.
    Unknown,
    /// Arduino Pro Micro (ATmega32U4), including Leonardo-compatible clones.
    ProMicro,
    /// Arduino Mega 2560 (ATmega2560).
    Mega2560,
}

/// The four fixed-function SPI bus pins of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiPins {
    pub miso: u8,
    pub mosi: u8,
    pub sck: u8,
    /// Default slave-select. Per-display chip-select lines are ordinary
    /// digital pins; this is the hardware SS the bus reserves.
    pub ss: u8,
}

impl SpiPins {
    /// True if `pin` is one of the four bus lines.
    pub fn contains(&self, pin: u8) -> bool {
        pin == self.miso || pin == self.mosi || pin == self.sck || pin == self.ss
    }
}

impl BoardKind {
    /// Human-readable board name.
    pub fn label(&self) -> &'static str {
        match self {
            BoardKind::ProMicro => "Arduino Pro Micro",
            BoardKind::Mega2560 => "Arduino Mega 2560",
            BoardKind::Unknown => "Unknown Board",
        }
    }

    /// Digital pins a configuration may assign on this board.
    pub fn available_pins(&self) -> Vec<u8> {
        match self {
            BoardKind::ProMicro => vec![2, 3, 4, 5, 6, 7, 8, 9, 10, 14, 15, 16, 18, 19, 20, 21],
            BoardKind::Mega2560 => (2..=53).collect(),
            BoardKind::Unknown => Vec::new(),
        }
    }

    /// The reserved SPI bus pins, if the board is recognized.
    pub fn spi_pins(&self) -> Option<SpiPins> {
        match self {
            BoardKind::ProMicro => Some(SpiPins {
                miso: 14,
                mosi: 16,
                sck: 15,
                ss: 10,
            }),
            BoardKind::Mega2560 => Some(SpiPins {
                miso: 50,
                mosi: 51,
                sck: 52,
                ss: 53,
            }),
            BoardKind::Unknown => None,
        }
    }

    /// True if `pin` sits on the shared SPI bus. Such assignments work but
    /// contend with display traffic.
    pub fn is_bus_pin(&self, pin: u8) -> bool {
        self.spi_pins().is_some_and(|spi| spi.contains(pin))
    }
}

/// USB vendor ids accepted when the exact (vid, pid) pair is not in the
/// signature table: Arduino, SparkFun, and QinHeng (CH340 clones).
pub const ACCEPTED_VENDORS: [u16; 3] = [0x2341, 0x1B4F, 0x1A86];

/// Known (vendor id, product id) signatures.
const KNOWN_SIGNATURES: &[(u16, u16, BoardKind)] = &[
    // Pro Micro (SparkFun)
    (0x1B4F, 0x9205, BoardKind::ProMicro),
    (0x1B4F, 0x9206, BoardKind::ProMicro),
    // Pro Micro / Leonardo (Arduino)
    (0x2341, 0x8036, BoardKind::ProMicro),
    (0x2341, 0x8037, BoardKind::ProMicro),
    (0x2341, 0x0036, BoardKind::ProMicro),
    // Mega 2560
    (0x2341, 0x0042, BoardKind::Mega2560),
    (0x2341, 0x0010, BoardKind::Mega2560),
    (0x2341, 0x0242, BoardKind::Mega2560),
    // CH340 bridge: could front any board
    (0x1A86, 0x7523, BoardKind::Unknown),
];

/// Classify a USB device by its (vendor id, product id) pair.
///
/// Returns `None` for devices that are neither an exact signature match nor
/// from an accepted vendor; the enumerator drops those entirely.
pub fn classify(vid: u16, pid: u16) -> Option<BoardKind> {
    if let Some((_, _, kind)) = KNOWN_SIGNATURES
        .iter()
        .find(|(v, p, _)| *v == vid && *p == pid)
    {
        return Some(*kind);
    }
    if ACCEPTED_VENDORS.contains(&vid) {
        return Some(BoardKind::Unknown);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_exact_signatures() {
        assert_eq!(classify(0x2341, 0x0042), Some(BoardKind::Mega2560));
        assert_eq!(classify(0x1B4F, 0x9206), Some(BoardKind::ProMicro));
        assert_eq!(classify(0x1A86, 0x7523), Some(BoardKind::Unknown));
    }

    #[test]
    fn accepted_vendor_with_unknown_model_classifies_as_unknown() {
        assert_eq!(classify(0x2341, 0xFFFF), Some(BoardKind::Unknown));
    }

    #[test]
    fn foreign_vendor_is_rejected() {
        assert_eq!(classify(0x0403, 0x6001), None);
    }

    #[test]
    fn mega_pin_range_spans_2_to_53() {
        let pins = BoardKind::Mega2560.available_pins();
        assert_eq!(pins.first(), Some(&2));
        assert_eq!(pins.last(), Some(&53));
        assert_eq!(pins.len(), 52);
    }

    #[test]
    fn pro_micro_bus_pins_are_flagged() {
        assert!(BoardKind::ProMicro.is_bus_pin(16));
        assert!(BoardKind::ProMicro.is_bus_pin(10));
        assert!(!BoardKind::ProMicro.is_bus_pin(2));
    }

    #[test]
    fn unknown_board_has_no_pins() {
        assert!(BoardKind::Unknown.available_pins().is_empty());
        assert!(BoardKind::Unknown.spi_pins().is_none());
        assert!(!BoardKind::Unknown.is_bus_pin(10));
    }
}
