use thiserror::Error;
use zerocopy::byteorder::little_endian::F64;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::geo::{LocalPlane, Wgs84};
use crate::outputs::PositioningOutputs;

// ---------------------------------------------------------------------------
// PGN 100: corrected position (30 bytes)
// ---------------------------------------------------------------------------
//
//  0..2   preamble 0x80 0x81
//  2      source 0x7F
//  3      PGN 0x64
//  4      payload length 24
//  5..13  longitude, degrees, f64 LE
//  13..21 latitude, degrees, f64 LE
//  21..29 heading, degrees, f64 LE
//  29     checksum: low byte of the sum of bytes 2..29

pub const PGN_CORRECTED_POSITION: u8 = 0x64;
pub const FRAME_LEN: usize = 30;
pub const FRAME_HEADER: [u8; 5] = [0x80, 0x81, 0x7F, PGN_CORRECTED_POSITION, 24];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame is {actual} bytes, expected {expected}")]
    Length { expected: usize, actual: usize },
    #[error("frame header does not match PGN 100")]
    Header,
    #[error("checksum mismatch: frame says {actual:#04x}, computed {expected:#04x}")]
    Checksum { expected: u8, actual: u8 },
}

#[repr(C)]
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned, Clone, Copy, Debug, PartialEq)]
pub struct CorrectedPositionFrame {
    header: [u8; 5],
    longitude: F64,
    latitude: F64,
    heading_deg: F64,
    checksum: u8,
}

impl CorrectedPositionFrame {
    pub fn new(position: Wgs84, heading_deg: f64) -> Self {
        let mut frame = Self {
            header: FRAME_HEADER,
            longitude: F64::new(position.longitude),
            latitude: F64::new(position.latitude),
            heading_deg: F64::new(heading_deg),
            checksum: 0,
        };
        frame.checksum = checksum(frame.as_bytes());
        frame
    }

    /// Frame for a tick's pose, projected back to WGS84 through `plane`.
    pub fn from_outputs(outputs: &PositioningOutputs, plane: &LocalPlane) -> Self {
        Self::new(plane.to_wgs84(outputs.corrected_fix_local), outputs.fix_heading_deg())
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        let frame = Self::read_from_bytes(bytes).map_err(|_| FrameError::Length {
            expected: FRAME_LEN,
            actual: bytes.len(),
        })?;

        if frame.header != FRAME_HEADER {
            return Err(FrameError::Header);
        }
        let expected = checksum(frame.as_bytes());
        if frame.checksum != expected {
            return Err(FrameError::Checksum {
                expected,
                actual: frame.checksum,
            });
        }
        Ok(frame)
    }

    pub fn position(&self) -> Wgs84 {
        Wgs84::new(self.latitude.get(), self.longitude.get())
    }

    pub fn heading_deg(&self) -> f64 {
        self.heading_deg.get()
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut out = [0u8; FRAME_LEN];
        out.copy_from_slice(self.as_bytes());
        out
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes[2..FRAME_LEN - 1]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
}
