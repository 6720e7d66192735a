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

//! Cartridge header parsing, checksum validation and the owning struct for
//! ROM/RAM bytes that the active [`mbc::Mbc`] banks into the address space.

pub mod mbc;
pub mod rtc;

use crate::error::{Error, ErrorCode, Result, Source};
use mbc::Mbc;

const HEADER_TITLE: std::ops::Range<usize> = 0x134..0x144;
const HEADER_CARTRIDGE_TYPE: usize = 0x147;
const HEADER_ROM_SIZE: usize = 0x148;
const HEADER_RAM_SIZE: usize = 0x149;
const HEADER_CHECKSUM: usize = 0x14d;

/// Header fields read out of the cartridge ROM at offset `0x0100`.
#[derive(Clone, Debug)]
pub struct Header {
    pub title: String,
    pub cartridge_type: u8,
    pub rom_size: u8,
    pub ram_size: u8,
    pub checksum: u8,
}

/// A loaded cartridge: immutable ROM bytes, mutable external RAM, and the
/// banking state of whichever MBC the header selected.
#[derive(Clone)]
pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    header: Header,
    has_battery: bool,
    mbc: Mbc,
}

impl Header {
    /// Parses the header at `0x0100` out of a ROM image.
    pub fn parse(rom: &[u8]) -> Result<Header> {
        if rom.len() < 0x150 {
            return Err(Error::new(Source::Cartridge, ErrorCode::RomTooSmall));
        }

        let title_bytes = &rom[HEADER_TITLE];
        let title_len = title_bytes.iter().position(|&b| b == 0).unwrap_or(title_bytes.len());
        let title = String::from_utf8_lossy(&title_bytes[..title_len]).into_owned();

        Ok(Header {
            title,
            cartridge_type: rom[HEADER_CARTRIDGE_TYPE],
            rom_size: rom[HEADER_ROM_SIZE],
            ram_size: rom[HEADER_RAM_SIZE],
            checksum: rom[HEADER_CHECKSUM],
        })
    }

    /// `Σ(-ROM[a] - 1) & 0xFF` over `0x0134..=0x014C`, matching the value
    /// stored at `0x014D`.
    pub fn compute_checksum(rom: &[u8]) -> u8 {
        let mut checksum: u8 = 0;
        for &byte in &rom[0x0134..=0x014c] {
            checksum = checksum.wrapping_sub(byte).wrapping_sub(1);
        }
        checksum
    }

    /// Number of 16 KiB ROM banks implied by `rom_size` (`32 KiB << rom_size`).
    pub fn rom_banks(&self) -> usize {
        (2usize << self.rom_size) as usize
    }

    /// External RAM size in bytes implied by `ram_size`.
    pub fn ram_bytes(&self) -> usize {
        match self.ram_size {
            0x00 => 0,
            0x01 => 2 * 1024,  // unofficial, kept for completeness
            0x02 => 8 * 1024,
            0x03 => 32 * 1024,
            0x04 => 128 * 1024,
            0x05 => 64 * 1024,
            _ => 0,
        }
    }

    /// Whether this cartridge type has a battery-backed save.
    pub fn has_battery(&self) -> bool {
        matches!(self.cartridge_type, 0x03 | 0x06 | 0x09 | 0x0d | 0x0f | 0x10 | 0x13 | 0x1b | 0x1e | 0xff)
    }

    /// Whether this cartridge type has an MBC3 real-time clock.
    pub fn has_rtc(&self) -> bool {
        matches!(self.cartridge_type, 0x0f | 0x10)
    }
}

impl Cartridge {
    /// Parses the header, validates the checksum, selects the MBC, and
    /// allocates (zeroed) external RAM.
    pub fn load(rom: Vec<u8>) -> Result<Cartridge> {
        let header = Header::parse(&rom)?;

        let computed = Header::compute_checksum(&rom);
        if computed != header.checksum {
            log::error!("cartridge '{}' failed header checksum: expected {:#04x}, computed {:#04x}", header.title, header.checksum, computed);
            return Err(Error::new(
                Source::Cartridge,
                ErrorCode::ChecksumMismatch { expected: header.checksum, computed },
            ));
        }

        let mbc = match header.cartridge_type {
            0x00 | 0x08 | 0x09 => Mbc::None,
            0x01..=0x03 => Mbc::new_mbc1(),
            0x05 | 0x06 => Mbc::new_mbc2(),
            0x0f..=0x13 => Mbc::new_mbc3(header.has_rtc()),
            other => {
                return Err(Error::new(Source::Cartridge, ErrorCode::UnsupportedCartridgeType(other)));
            }
        };

        let ram_bytes = header.ram_bytes();
        let has_battery = header.has_battery();

        log::info!(
            "loaded cartridge '{}': type={:#04x}, rom_banks={}, ram_bytes={}, battery={}",
            header.title, header.cartridge_type, header.rom_banks(), ram_bytes, has_battery
        );

        Ok(Cartridge {
            rom,
            ram: vec![0xff; ram_bytes],
            header,
            has_battery,
            mbc,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    /// Advances the RTC (if the cartridge has one) by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        self.mbc.update_rtc(dt);
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.mbc.read(&self.rom, &self.ram, addr)
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        self.mbc.write(&self.rom, &mut self.ram, addr, value);
    }

    /// The raw external-RAM bytes, for battery-backed persistence.
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// Loads external RAM bytes (e.g. from a `.sav` file). The slice must
    /// match the cartridge's RAM capacity exactly.
    pub fn load_ram(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() != self.ram.len() {
            return Err(Error::new(
                Source::CartridgeRam,
                ErrorCode::InvalidRamSize { actual: bytes.len(), expected: self.ram.len() },
            ));
        }

        self.ram.copy_from_slice(bytes);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn current_rom_bank(&self) -> u8 {
        self.mbc.current_rom_bank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rom_with_title(title: &str, cartridge_type: u8) -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        let title_bytes = title.as_bytes();
        rom[0x134..0x134 + title_bytes.len()].copy_from_slice(title_bytes);
        rom[HEADER_CARTRIDGE_TYPE] = cartridge_type;
        rom[HEADER_ROM_SIZE] = 0x00;
        rom[HEADER_RAM_SIZE] = 0x00;
        let checksum = Header::compute_checksum(&rom);
        rom[HEADER_CHECKSUM] = checksum;
        rom
    }

    #[test]
    fn tennis_checksum_matches_0x3c() {
        let rom = make_rom_with_title("TENNIS", 0x00);
        assert_eq!(rom[HEADER_CHECKSUM], 0x3c);
    }

    #[test]
    fn flipping_a_header_byte_breaks_checksum() {
        let mut rom = make_rom_with_title("TENNIS", 0x00);
        rom[0x140] = rom[0x140].wrapping_add(1);
        assert!(Cartridge::load(rom).is_err());
    }

    #[test]
    fn valid_header_loads_successfully() {
        let rom = make_rom_with_title("TENNIS", 0x00);
        assert!(Cartridge::load(rom).is_ok());
    }

    #[test]
    fn unsupported_cartridge_type_fails() {
        let rom = make_rom_with_title("BADTYPE", 0xfe);
        let err = Cartridge::load(rom).unwrap_err();
        assert!(matches!(err.code, ErrorCode::UnsupportedCartridgeType(0xfe)));
    }

    #[test]
    fn ram_save_load_round_trip() {
        let mut rom = make_rom_with_title("SAVES", 0x03); // MBC1+RAM+BATTERY
        rom[HEADER_RAM_SIZE] = 0x02; // 8 KiB
        let checksum = Header::compute_checksum(&rom);
        rom[HEADER_CHECKSUM] = checksum;

        let mut cart = Cartridge::load(rom).unwrap();
        assert!(cart.has_battery());

        cart.write(0x0000, 0x0a); // enable RAM
        cart.write(0xa000, 0x42);

        let saved = cart.ram().to_vec();
        cart.load_ram(&saved).unwrap();
        assert_eq!(cart.ram(), saved.as_slice());
    }
}
