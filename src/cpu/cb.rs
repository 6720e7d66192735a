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

//! The `CB`-prefixed table: shifts/rotates, `BIT`/`RES`/`SET`, all addressed
//! by the same 3-bit register field as the main table (see `dispatch`).

use super::dispatch::{read_r8, rl, rlc, rr, rrc, write_r8};
use super::{Cpu, CpuBus, FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

pub fn execute(cpu: &mut Cpu, bus: &mut dyn CpuBus, opcode: u8) {
    let reg = opcode & 0x07;

    match opcode {
        0x00..=0x3f => {
            let kind = (opcode >> 3) & 0x07;
            let value = read_r8(cpu, bus, reg);
            let (result, carry) = shift_or_rotate(kind, value, cpu.flag(FLAG_C));
            cpu.set_flag(FLAG_Z, result == 0);
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, false);
            cpu.set_flag(FLAG_C, carry);
            write_r8(cpu, bus, reg, result);
        }

        0x40..=0x7f => {
            let bit = (opcode >> 3) & 0x07;
            let value = read_r8(cpu, bus, reg);
            cpu.set_flag(FLAG_Z, (value & (1 << bit)) == 0);
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, true);
        }

        0x80..=0xbf => {
            let bit = (opcode >> 3) & 0x07;
            let value = read_r8(cpu, bus, reg);
            write_r8(cpu, bus, reg, value & !(1 << bit));
        }

        0xc0..=0xff => {
            let bit = (opcode >> 3) & 0x07;
            let value = read_r8(cpu, bus, reg);
            write_r8(cpu, bus, reg, value | (1 << bit));
        }
    }
}

fn shift_or_rotate(kind: u8, value: u8, carry_in: bool) -> (u8, bool) {
    match kind {
        0 => rlc(value),
        1 => rrc(value),
        2 => rl(value, carry_in),
        3 => rr(value, carry_in),
        4 => {
            let carry = (value & 0x80) != 0;
            (value << 1, carry)
        }
        5 => {
            let carry = (value & 0x01) != 0;
            ((value >> 1) | (value & 0x80), carry)
        }
        6 => (value.rotate_left(4), false),
        7 => {
            let carry = (value & 0x01) != 0;
            (value >> 1, carry)
        }
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Fault;
    use crate::interrupts::InterruptRegisters;

    struct TestBus {
        interrupts: InterruptRegisters,
    }

    impl CpuBus for TestBus {
        fn read(&mut self, _addr: u16) -> u8 { 0 }
        fn write(&mut self, _addr: u16, _value: u8) {}
        fn tick_m_cycle(&mut self) {}
        fn interrupts(&self) -> &InterruptRegisters { &self.interrupts }
        fn interrupts_mut(&mut self) -> &mut InterruptRegisters { &mut self.interrupts }
        fn record_fault(&mut self, _fault: Fault) {}
    }

    #[test]
    fn swap_exchanges_nibbles() {
        let mut cpu = Cpu::new();
        let mut bus = TestBus { interrupts: InterruptRegisters::new() };
        cpu.regs.a = 0x12;
        execute(&mut cpu, &mut bus, 0x37); // SWAP A
        assert_eq!(cpu.regs.a, 0x21);
        assert!(!cpu.flag(FLAG_C));
    }

    #[test]
    fn bit_sets_zero_flag_when_clear() {
        let mut cpu = Cpu::new();
        let mut bus = TestBus { interrupts: InterruptRegisters::new() };
        cpu.regs.b = 0x00;
        execute(&mut cpu, &mut bus, 0x40); // BIT 0, B
        assert!(cpu.flag(FLAG_Z));
        assert!(cpu.flag(FLAG_H));
        assert!(!cpu.flag(FLAG_N));
    }

    #[test]
    fn res_and_set_toggle_only_the_target_bit() {
        let mut cpu = Cpu::new();
        let mut bus = TestBus { interrupts: InterruptRegisters::new() };
        cpu.regs.c = 0xff;
        execute(&mut cpu, &mut bus, 0x88); // RES 1, C
        assert_eq!(cpu.regs.c, 0xfd);
        execute(&mut cpu, &mut bus, 0xc8); // SET 1, C
        assert_eq!(cpu.regs.c, 0xff);
    }

    #[test]
    fn swap_squared_is_identity() {
        let mut cpu = Cpu::new();
        let mut bus = TestBus { interrupts: InterruptRegisters::new() };
        cpu.regs.a = 0xa5;
        execute(&mut cpu, &mut bus, 0x37);
        execute(&mut cpu, &mut bus, 0x37);
        assert_eq!(cpu.regs.a, 0xa5);
    }
}
