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

//! A cycle-driven emulation core for the original Game Boy (DMG).
//!
//! [`Emulator`] owns a [`cpu::Cpu`] and a [`bus::Bus`]; every CPU memory
//! access ticks the timer, serial port and PPU in lock-step, so the
//! simulated hardware stays internally consistent without a separate
//! scheduler. There is no host window, audio, or boot ROM here — see
//! `SPEC_FULL.md` for what's explicitly out of scope.

pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod emulator;
pub mod error;
pub mod host;
pub mod interrupts;
pub mod joypad;
pub mod ppu;
pub mod serial;
pub mod timer;
pub mod utils;

pub use emulator::{Emulator, EmulatorConfig, EmulatorUpdateResult};
pub use error::{Error, ErrorCode, Result};
