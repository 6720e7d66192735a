/*
 * Copyright (C) 2026 dmg-core contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

//! Error types for cartridge loading and RAM persistence.
//!
//! Errors that originate *inside* the simulated machine (illegal opcodes,
//! unmapped bus access) never surface here — those are contained and only
//! logged (see `bus` and `cpu`). Only initialisation and save I/O failures
//! are reported through this module.

use std::fmt::{Display, Formatter};

/// The module an [`Error`] is related to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cartridge,
    CartridgeRam,
}

/// A specific error code describing what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The ROM image was too small to contain a header.
    RomTooSmall,

    /// The cartridge header checksum did not match the computed value.
    ChecksumMismatch { expected: u8, computed: u8 },

    /// The `cartridge_type` byte does not map to a supported MBC.
    UnsupportedCartridgeType(u8),

    /// A RAM image had an unexpected size for the cartridge's RAM capacity.
    InvalidRamSize { actual: usize, expected: usize },
}

/// An I/O or validation error with the source it originated from attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    pub source: Source,
    pub code: ErrorCode,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(source: Source, code: ErrorCode) -> Self {
        Self { source, code }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Cartridge => write!(f, "cartridge"),
            Source::CartridgeRam => write!(f, "cartridge RAM"),
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::RomTooSmall => {
                write!(f, "ROM image is too small to contain a header")
            }
            ErrorCode::ChecksumMismatch { expected, computed } => {
                write!(f, "header checksum mismatch: expected {:#04x}, computed {:#04x}", expected, computed)
            }
            ErrorCode::UnsupportedCartridgeType(ty) => {
                write!(f, "unsupported cartridge type {:#04x}", ty)
            }
            ErrorCode::InvalidRamSize { actual, expected } => {
                write!(f, "invalid RAM image size: {} bytes (expected {})", actual, expected)
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.code)
    }
}

impl std::error::Error for Error {}
