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

//! The top-level [`Emulator`]: owns the CPU and bus, exposes the host-facing
//! `update`/`step` loop, and reports what happened on the way out.

use crate::bus::Bus;
use crate::cartridge::Cartridge;
use crate::cpu::{opcode, Cpu, CpuBus};
use crate::error::Result;
use crate::joypad::JoypadInput;
use crate::ppu::Frame;

/// The number of T-cycles the DMG's master clock runs at.
pub const CLOCK_RATE_HZ: u32 = 4_194_304;

/// Host-tunable knobs that don't change the simulated hardware's behaviour,
/// only how it's paced and observed.
#[derive(Clone, Copy, Debug)]
pub struct EmulatorConfig {
    /// Logs each opcode's mnemonic (via [`crate::cpu::opcode::name`]) as it's
    /// fetched. Noisy; meant for tracing a ROM instruction-by-instruction.
    pub print_opcodes: bool,

    /// Multiplies the T-cycles run per second of `dt_seconds` passed to
    /// [`Emulator::update`]. 1.0 runs at the real DMG clock rate.
    pub clock_speed_scale: f64,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self { print_opcodes: false, clock_speed_scale: 1.0 }
    }
}

/// What happened during an [`Emulator::update`] call, for the host to act on.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmulatorUpdateResult {
    /// Whether a new frame became available in [`Emulator::front_buffer`].
    pub new_frame: bool,
}

pub struct Emulator {
    cpu: Cpu,
    bus: Bus,
    config: EmulatorConfig,
}

impl Emulator {
    /// Loads a ROM image and builds a machine ready to run from `0x0100`,
    /// matching the state the DMG boot ROM hands off to a cartridge.
    pub fn load(rom: Vec<u8>, config: EmulatorConfig) -> Result<Self> {
        let cartridge = Cartridge::load(rom)?;
        Ok(Self { cpu: Cpu::new(), bus: Bus::new(cartridge), config })
    }

    pub fn config(&self) -> EmulatorConfig {
        self.config
    }

    pub fn set_config(&mut self, config: EmulatorConfig) {
        self.config = config;
    }

    /// Loads previously-saved battery-backed RAM (e.g. from a `.sav` file).
    pub fn load_ram(&mut self, bytes: &[u8]) -> Result<()> {
        self.bus.cartridge.load_ram(bytes)
    }

    /// The cartridge's current external RAM, for battery-backed persistence.
    pub fn save_ram(&self) -> Option<&[u8]> {
        if self.bus.cartridge.has_battery() {
            Some(self.bus.cartridge.ram())
        }
        else {
            None
        }
    }

    pub fn joypad_mut(&mut self) -> &mut JoypadInput {
        &mut self.bus.joypad.input
    }

    /// The most recently completed frame.
    pub fn front_buffer(&self) -> &Frame {
        self.bus.ppu.front_buffer()
    }

    /// Executes exactly one CPU instruction (or interrupt dispatch, or one
    /// idle M-cycle while halted), advancing every other component with it.
    pub fn step(&mut self) -> EmulatorUpdateResult {
        self.trace_next_opcode();
        self.cpu.step(&mut self.bus);

        EmulatorUpdateResult { new_frame: self.bus.ppu.take_frame_completed() }
    }

    /// Runs `dt_seconds * CLOCK_RATE_HZ * clock_speed_scale` T-cycles,
    /// sampling the joypad once at the start (the host should set
    /// `joypad_mut()` just before calling this).
    pub fn update(&mut self, dt_seconds: f64) -> EmulatorUpdateResult {
        self.bus.joypad.update(&mut self.bus.interrupts);

        let t_cycles_to_run =
            (dt_seconds * CLOCK_RATE_HZ as f64 * self.config.clock_speed_scale) as u64;

        let mut result = EmulatorUpdateResult::default();
        let start = self.bus.t_cycles();

        while self.bus.t_cycles() - start < t_cycles_to_run {
            self.trace_next_opcode();
            self.cpu.step(&mut self.bus);

            if self.bus.ppu.take_frame_completed() {
                result.new_frame = true;
            }
        }

        result
    }

    /// Logs the mnemonic of the instruction about to be fetched, when
    /// [`EmulatorConfig::print_opcodes`] is enabled.
    fn trace_next_opcode(&self) {
        if !self.config.print_opcodes {
            return;
        }

        let pc = self.cpu.regs.pc;
        let byte = self.bus.raw_read(pc);
        let (opcode, prefixed) = if byte == 0xcb {
            (self.bus.raw_read(pc.wrapping_add(1)), true)
        }
        else {
            (byte, false)
        };

        log::debug!("{:#06x}: {}", pc, opcode::name(opcode, prefixed));
    }

    /// Total T-cycles elapsed since the machine was created.
    pub fn t_cycles(&self) -> u64 {
        self.bus.t_cycles()
    }

    /// Reads a byte as the CPU would, for debugging/tooling; this does tick
    /// the rest of the system, same as any CPU-originated access.
    pub fn bus_read(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    pub fn bus_write(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_rom() -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        let title = b"TEST";
        rom[0x134..0x134 + title.len()].copy_from_slice(title);
        // an infinite JR -2 loop at the entry point
        rom[0x0100] = 0x18;
        rom[0x0101] = 0xfe;
        let checksum = crate::cartridge::Header::compute_checksum(&rom);
        rom[0x14d] = checksum;
        rom
    }

    #[test]
    fn loading_starts_execution_at_0x0100() {
        let emulator = Emulator::load(make_rom(), EmulatorConfig::default()).unwrap();
        assert_eq!(emulator.cpu.regs.pc, 0x0100);
    }

    #[test]
    fn step_advances_past_the_entry_point() {
        let mut emulator = Emulator::load(make_rom(), EmulatorConfig::default()).unwrap();
        emulator.step();
        assert_eq!(emulator.cpu.regs.pc, 0x0100); // JR -2 loops back to itself
    }

    #[test]
    fn bus_read_write_round_trips_through_wram() {
        let mut emulator = Emulator::load(make_rom(), EmulatorConfig::default()).unwrap();
        emulator.bus_write(0xc000, 0x99);
        assert_eq!(emulator.bus_read(0xc000), 0x99);
    }

    #[test]
    fn update_runs_roughly_dt_seconds_worth_of_t_cycles() {
        let mut emulator = Emulator::load(make_rom(), EmulatorConfig::default()).unwrap();
        emulator.update(1.0);
        // JR -2 takes 3 M-cycles (12 T-cycles) per iteration; allow for the
        // loop overshooting its budget by less than one iteration.
        let expected = CLOCK_RATE_HZ as u64;
        assert!(emulator.t_cycles() >= expected);
        assert!(emulator.t_cycles() < expected + 12);
    }

    #[test]
    fn clock_speed_scale_halves_the_cycles_run() {
        let mut emulator = Emulator::load(
            make_rom(),
            EmulatorConfig { print_opcodes: false, clock_speed_scale: 0.5 },
        )
        .unwrap();
        emulator.update(1.0);
        assert!(emulator.t_cycles() < (CLOCK_RATE_HZ / 2) as u64 + 12);
    }
}
