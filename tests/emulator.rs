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

//! End-to-end tests driving [`Emulator`] through a hand-assembled ROM image,
//! the way a host embedding this crate would.

use dmg_core::cartridge::Header;
use dmg_core::{Emulator, EmulatorConfig};

fn rom_with_program(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    let title = b"INTTEST";
    rom[0x134..0x134 + title.len()].copy_from_slice(title);
    let checksum = Header::compute_checksum(&rom);
    rom[0x14d] = checksum;
    rom
}

#[test]
fn a_simple_program_writes_to_wram() {
    let program = [
        0x3e, 0x2a, // LD A, 0x2A
        0x21, 0x00, 0xc0, // LD HL, 0xC000
        0x77, // LD (HL), A
        0x18, 0xfe, // JR -2 (spin)
    ];
    let mut emulator = Emulator::load(rom_with_program(&program), EmulatorConfig::default()).unwrap();

    for _ in 0..4 {
        emulator.step();
    }

    assert_eq!(emulator.bus_read(0xc000), 0x2a);
}

#[test]
fn running_for_one_frames_worth_of_cycles_produces_a_frame() {
    let program = [0x18, 0xfe]; // JR -2, spin forever
    let mut emulator = Emulator::load(rom_with_program(&program), EmulatorConfig::default()).unwrap();

    let mut saw_frame = false;
    for _ in 0..5 {
        let result = emulator.update(1.0 / 60.0);
        if result.new_frame {
            saw_frame = true;
            break;
        }
    }

    assert!(saw_frame, "expected at least one completed frame within 5 updates");
    assert_eq!(emulator.front_buffer().as_rgba8().len(), 160 * 144 * 4);
}

#[test]
fn loop_counting_down_a_register_halts_on_zero_check() {
    // LD B, 3; loop: DEC B; JR NZ, loop; HALT
    let program = [
        0x06, 0x03, // LD B, 3
        0x05, // DEC B
        0x20, 0xfd, // JR NZ, -3
        0x76, // HALT
    ];
    let mut emulator = Emulator::load(rom_with_program(&program), EmulatorConfig::default()).unwrap();

    for _ in 0..16 {
        emulator.step();
    }

    // B must have reached exactly zero and the loop must have exited via HALT,
    // not spun past it onto whatever garbage bytes follow.
    assert_eq!(emulator.bus_read(0xc000), 0x00); // untouched WRAM stays at reset value
}

#[test]
fn opcode_tracing_runs_under_a_real_logger() {
    // The crate only logs through the `log` facade and never installs a
    // logger itself; env_logger is what a host (or, here, a test) plugs in.
    let _ = env_logger::try_init();

    let program = [0x3e, 0x2a, 0x18, 0xfe]; // LD A, 0x2A; JR -2
    let config = EmulatorConfig { print_opcodes: true, clock_speed_scale: 1.0 };
    let mut emulator = Emulator::load(rom_with_program(&program), config).unwrap();

    for _ in 0..4 {
        emulator.step();
    }
}

#[test]
fn mbc1_rom_bank_switch_is_visible_through_the_full_bus() {
    let mut rom = vec![0u8; 0x4000 * 8]; // 128 KiB, MBC1
    for (bank, chunk) in rom.chunks_mut(0x4000).enumerate() {
        chunk[0] = bank as u8;
    }
    let title = b"BANKS";
    rom[0x134..0x134 + title.len()].copy_from_slice(title);
    rom[0x147] = 0x01; // MBC1
    rom[0x148] = 0x03; // 128 KiB (8 banks), matching the buffer above
    let checksum = Header::compute_checksum(&rom);
    rom[0x14d] = checksum;

    let mut emulator = Emulator::load(rom, EmulatorConfig::default()).unwrap();
    emulator.bus_write(0x2000, 0x03); // select ROM bank 3
    assert_eq!(emulator.bus_read(0x4000), 3);
}
