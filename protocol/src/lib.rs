//! Data sent by the Pinguino demo sketches to the host.
#![no_std]
#![warn(missing_docs)]

use core::fmt;

/// Microchip vendor ID, shared by all Pinguino boards.
pub const VENDOR_ID: u16 = 0x04D8;
/// Product ID of 8-bit (PIC18F) boards.
pub const P8_PRODUCT_ID: u16 = 0xFEAA;
/// Product ID of 32-bit (PIC32MX) boards.
pub const P32_PRODUCT_ID: u16 = 0x003C;

/// USB configuration the sketches run in.
pub const CONFIGURATION: u8 = 1;
/// Interface carrying the bulk endpoints.
pub const INTERFACE: u8 = 0;
/// Device-to-host bulk endpoint.
pub const ENDPOINT_IN: u8 = 0x81;
/// Host-to-device bulk endpoint.
pub const ENDPOINT_OUT: u8 = 0x01;
/// Maximum packet size of a full-speed bulk endpoint.
pub const PACKET_SIZE: usize = 64;

/// Board family, told apart by the product ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// 8-bit PIC18F board.
    P8,
    /// 32-bit PIC32MX board.
    P32,
}

impl Architecture {
    /// Look up the architecture of a Pinguino product ID.
    pub fn from_product_id(product_id: u16) -> Option<Self> {
        match product_id {
            P8_PRODUCT_ID => Some(Self::P8),
            P32_PRODUCT_ID => Some(Self::P32),
            _ => None,
        }
    }

    /// The product ID boards of this architecture enumerate with.
    pub fn product_id(self) -> u16 {
        match self {
            Self::P8 => P8_PRODUCT_ID,
            Self::P32 => P32_PRODUCT_ID,
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P8 => f.write_str("8-bit"),
            Self::P32 => f.write_str("32-bit"),
        }
    }
}

/// Bytes from the device that do not form the expected value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Wrong number of bytes for the value.
    #[error("expected {expected} bytes, got {actual}")]
    Length {
        /// Width of the value.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// Sign byte of a temperature is neither 0 nor 1.
    #[error("invalid sign byte {0:#04x}")]
    Sign(u8),
}

fn array<const N: usize>(bytes: &[u8]) -> Result<[u8; N], DecodeError> {
    bytes.try_into().map_err(|_| DecodeError::Length {
        expected: N,
        actual: bytes.len(),
    })
}

/// Decode a two's complement byte.
pub fn signed8(bytes: &[u8]) -> Result<i8, DecodeError> {
    array(bytes).map(i8::from_le_bytes)
}

/// Decode a little-endian `u16`.
pub fn unsigned16(bytes: &[u8]) -> Result<u16, DecodeError> {
    array(bytes).map(u16::from_le_bytes)
}

/// Decode a little-endian `i16`.
pub fn signed16(bytes: &[u8]) -> Result<i16, DecodeError> {
    array(bytes).map(i16::from_le_bytes)
}

/// Decode a little-endian `u32`.
pub fn unsigned32(bytes: &[u8]) -> Result<u32, DecodeError> {
    array(bytes).map(u32::from_le_bytes)
}

/// Decode a little-endian `i32`.
pub fn signed32(bytes: &[u8]) -> Result<i32, DecodeError> {
    array(bytes).map(i32::from_le_bytes)
}

/// One point of the `sin100` sketch.
///
/// `x` is the angle in degrees, `y` is `sin100(x)` in `[-100, 100]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Coordinate {
    /// Abscissa.
    pub x: i16,
    /// Ordinate.
    pub y: i16,
}

impl Coordinate {
    /// Size on the wire.
    pub const SIZE: usize = 4;

    /// Decode from exactly [`Self::SIZE`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let bytes: [u8; Self::SIZE] = array(bytes)?;
        Ok(Self {
            x: i16::from_le_bytes([bytes[0], bytes[1]]),
            y: i16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

/// Sent by the BMP280 sketch ahead of every [`Environment`] record.
pub const START_MARKER: &[u8; 5] = b"START";

/// Pressure and temperature record of the BMP280 sketch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Environment {
    /// Pressure in Pa.
    pub pressure: i32,
    /// Temperature in hundredths of a °C.
    pub temperature: i32,
}

impl Environment {
    /// Size on the wire.
    pub const SIZE: usize = 8;

    /// Decode from exactly [`Self::SIZE`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let bytes: [u8; Self::SIZE] = array(bytes)?;
        let (pressure, temperature) = bytes.split_at(4);
        Ok(Self {
            pressure: signed32(pressure)?,
            temperature: signed32(temperature)?,
        })
    }

    /// Pressure in hPa.
    pub fn pressure_hpa(&self) -> f64 {
        self.pressure as f64 / 100.0
    }

    /// Temperature in °C.
    pub fn temperature_c(&self) -> f64 {
        self.temperature as f64 / 100.0
    }
}

/// A DS18x20 reading as laid out by the sensor library.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Temperature {
    /// Below zero.
    pub negative: bool,
    /// Whole degrees.
    pub integer: u8,
    /// Fractional part in units of [`Temperature::FRACTION_SCALE`].
    ///
    /// Fahrenheit readings may exceed one whole degree.
    pub fraction: u16,
}

impl Temperature {
    /// Size on the wire.
    pub const SIZE: usize = 4;
    /// The fraction counts ten-thousandths of a degree.
    pub const FRACTION_SCALE: u16 = 10_000;

    /// Decode from exactly [`Self::SIZE`] bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let bytes: [u8; Self::SIZE] = array(bytes)?;
        let negative = match bytes[0] {
            0 => false,
            1 => true,
            other => return Err(DecodeError::Sign(other)),
        };
        Ok(Self {
            negative,
            integer: bytes[1],
            fraction: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }

    /// Signed value in degrees.
    pub fn value(&self) -> f64 {
        let magnitude =
            self.integer as f64 + self.fraction as f64 / Self::FRACTION_SCALE as f64;
        if self.negative { -magnitude } else { magnitude }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Fahrenheit readings scale the fraction by 9/5, past one degree.
        let hundredths = self.integer as u32 * 100 + self.fraction as u32 / 100;
        let sign = if self.negative { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, hundredths / 100, hundredths % 100)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::string::ToString;

    use super::*;

    #[test]
    fn test_architecture_lookup() {
        assert_eq!(Architecture::from_product_id(0xFEAA), Some(Architecture::P8));
        assert_eq!(Architecture::from_product_id(0x003C), Some(Architecture::P32));
        assert_eq!(Architecture::from_product_id(0x000A), None);
        assert_eq!(Architecture::P32.product_id(), P32_PRODUCT_ID);
    }

    #[test]
    fn test_signed_values() {
        assert_eq!(signed8(&[0xFF]), Ok(-1));
        assert_eq!(signed8(&[0x7F]), Ok(127));
        assert_eq!(signed16(&[0x9C, 0xFF]), Ok(-100));
        assert_eq!(signed16(&[0x64, 0x00]), Ok(100));
        assert_eq!(signed32(&[0x00, 0x00, 0x00, 0x80]), Ok(i32::MIN));
        assert_eq!(unsigned16(&[0x00, 0x80]), Ok(0x8000));
        assert_eq!(unsigned32(&[0x78, 0x56, 0x34, 0x12]), Ok(0x1234_5678));
    }

    #[test]
    fn test_wrong_width() {
        assert_eq!(
            signed16(&[1, 2, 3]),
            Err(DecodeError::Length {
                expected: 2,
                actual: 3
            })
        );
        assert!(Coordinate::decode(&[0; 3]).is_err());
        assert_eq!(
            signed8(&[]),
            Err(DecodeError::Length {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn test_coordinate() {
        // x = 270, y = -100
        let point = Coordinate::decode(&[0x0E, 0x01, 0x9C, 0xFF]).unwrap();
        assert_eq!(point, Coordinate { x: 270, y: -100 });
    }

    #[test]
    fn test_environment() {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&101_325i32.to_le_bytes());
        bytes[4..].copy_from_slice(&(-1_250i32).to_le_bytes());

        let record = Environment::decode(&bytes).unwrap();
        assert_eq!(record.pressure_hpa(), 1013.25);
        assert_eq!(record.temperature_c(), -12.5);
    }

    #[test]
    fn test_temperature() {
        // -5.0625 degrees: integer 5, fraction 1 * 625
        let reading = Temperature::decode(&[1, 5, 0x71, 0x02]).unwrap();
        assert!(reading.negative);
        assert_eq!(reading.fraction, 625);
        assert_eq!(reading.value(), -5.0625);
        assert_eq!(reading.to_string(), "-5.06");

        let reading = Temperature::decode(&[0, 21, 0x88, 0x13]).unwrap();
        assert_eq!(reading.to_string(), "21.50");
    }

    #[test]
    fn test_fahrenheit_fraction_carries() {
        // 69.6875 °F: the sensor library reports 68 and 16875 ten-thousandths
        let reading = Temperature::decode(&[0, 68, 0xEB, 0x41]).unwrap();
        assert_eq!(reading.fraction, 16875);
        assert_eq!(reading.value(), 69.6875);
        assert_eq!(reading.to_string(), "69.68");

        let reading = Temperature {
            negative: true,
            integer: 0,
            fraction: 10_000,
        };
        assert_eq!(reading.to_string(), "-1.00");
    }

    #[test]
    fn test_sign_byte_checked() {
        assert_eq!(
            Temperature::decode(&[2, 0, 0, 0]),
            Err(DecodeError::Sign(2))
        );
    }
}
