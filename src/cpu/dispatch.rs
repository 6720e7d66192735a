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

//! The un-prefixed opcode table, dispatched by a match over the fetched
//! byte. The 3-bit register field used throughout the encoding (0=B, 1=C,
//! 2=D, 3=E, 4=H, 5=L, 6=(HL), 7=A) is shared with the CB table.

use super::cb;
use super::{Cpu, CpuBus, Reg16, Reg8, FLAG_C, FLAG_H, FLAG_N, FLAG_Z};
use crate::utils::{borrowing_sub_u8, carrying_add_u16, carrying_add_u8, get_high, get_low};

pub(super) fn reg8_of(index: u8) -> Reg8 {
    match index {
        0 => Reg8::B,
        1 => Reg8::C,
        2 => Reg8::D,
        3 => Reg8::E,
        4 => Reg8::H,
        5 => Reg8::L,
        7 => Reg8::A,
        _ => unreachable!("index 6 is (HL), handled separately"),
    }
}

pub(super) fn read_r8(cpu: &mut Cpu, bus: &mut dyn CpuBus, index: u8) -> u8 {
    if index == 6 {
        bus.read(cpu.regs.hl())
    }
    else {
        cpu.reg8(reg8_of(index))
    }
}

pub(super) fn write_r8(cpu: &mut Cpu, bus: &mut dyn CpuBus, index: u8, value: u8) {
    if index == 6 {
        bus.write(cpu.regs.hl(), value);
    }
    else {
        cpu.set_reg8(reg8_of(index), value);
    }
}

pub fn execute(cpu: &mut Cpu, bus: &mut dyn CpuBus, opcode: u8) {
    match opcode {
        0x00 => {}
        0x10 => {
            let _ = cpu.fetch_byte(bus);
            cpu.stopped = true;
        }
        0x76 => cpu.halted = true,
        0xf3 => cpu.ime = false,
        0xfb => cpu.request_ei(),

        // 8 bit immediate loads: LD r, d8
        0x06 | 0x0e | 0x16 | 0x1e | 0x26 | 0x2e | 0x36 | 0x3e => {
            let dst = (opcode >> 3) & 0x07;
            let value = cpu.fetch_byte(bus);
            write_r8(cpu, bus, dst, value);
        }

        // LD r, r'  (0x40..=0x7F, minus 0x76 HALT already matched)
        0x40..=0x7f => {
            let dst = (opcode >> 3) & 0x07;
            let src = opcode & 0x07;
            let value = read_r8(cpu, bus, src);
            write_r8(cpu, bus, dst, value);
        }

        // 8 bit ALU: op A, r
        0x80..=0xbf => {
            let src = opcode & 0x07;
            let value = read_r8(cpu, bus, src);
            alu_op((opcode >> 3) & 0x07, cpu, value);
        }

        // 8 bit ALU: op A, d8
        0xc6 | 0xce | 0xd6 | 0xde | 0xe6 | 0xee | 0xf6 | 0xfe => {
            let value = cpu.fetch_byte(bus);
            alu_op((opcode >> 3) & 0x07, cpu, value);
        }

        // INC r / DEC r (8 bit)
        0x04 | 0x0c | 0x14 | 0x1c | 0x24 | 0x2c | 0x34 | 0x3c => {
            let r = (opcode >> 3) & 0x07;
            let value = read_r8(cpu, bus, r);
            let result = value.wrapping_add(1);
            cpu.set_flag(FLAG_Z, result == 0);
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, (value & 0x0f) == 0x0f);
            write_r8(cpu, bus, r, result);
        }
        0x05 | 0x0d | 0x15 | 0x1d | 0x25 | 0x2d | 0x35 | 0x3d => {
            let r = (opcode >> 3) & 0x07;
            let value = read_r8(cpu, bus, r);
            let result = value.wrapping_sub(1);
            cpu.set_flag(FLAG_Z, result == 0);
            cpu.set_flag(FLAG_N, true);
            cpu.set_flag(FLAG_H, (value & 0x0f) == 0x00);
            write_r8(cpu, bus, r, result);
        }

        // 16 bit register loads / arithmetic
        0x01 => { let v = cpu.fetch_word(bus); cpu.set_reg16(Reg16::Bc, v); }
        0x11 => { let v = cpu.fetch_word(bus); cpu.set_reg16(Reg16::De, v); }
        0x21 => { let v = cpu.fetch_word(bus); cpu.set_reg16(Reg16::Hl, v); }
        0x31 => { let v = cpu.fetch_word(bus); cpu.set_reg16(Reg16::Sp, v); }

        0x02 => bus.write(cpu.regs.bc(), cpu.regs.a),
        0x12 => bus.write(cpu.regs.de(), cpu.regs.a),
        0x22 => { let hl = cpu.regs.hl(); bus.write(hl, cpu.regs.a); cpu.regs.set_hl(hl.wrapping_add(1)); }
        0x32 => { let hl = cpu.regs.hl(); bus.write(hl, cpu.regs.a); cpu.regs.set_hl(hl.wrapping_sub(1)); }

        0x0a => cpu.regs.a = bus.read(cpu.regs.bc()),
        0x1a => cpu.regs.a = bus.read(cpu.regs.de()),
        0x2a => { let hl = cpu.regs.hl(); cpu.regs.a = bus.read(hl); cpu.regs.set_hl(hl.wrapping_add(1)); }
        0x3a => { let hl = cpu.regs.hl(); cpu.regs.a = bus.read(hl); cpu.regs.set_hl(hl.wrapping_sub(1)); }

        0x03 => { bus.tick_m_cycle(); cpu.set_reg16(Reg16::Bc, cpu.reg16(Reg16::Bc).wrapping_add(1)); }
        0x13 => { bus.tick_m_cycle(); cpu.set_reg16(Reg16::De, cpu.reg16(Reg16::De).wrapping_add(1)); }
        0x23 => { bus.tick_m_cycle(); cpu.set_reg16(Reg16::Hl, cpu.reg16(Reg16::Hl).wrapping_add(1)); }
        0x33 => { bus.tick_m_cycle(); cpu.regs.sp = cpu.regs.sp.wrapping_add(1); }

        0x0b => { bus.tick_m_cycle(); cpu.set_reg16(Reg16::Bc, cpu.reg16(Reg16::Bc).wrapping_sub(1)); }
        0x1b => { bus.tick_m_cycle(); cpu.set_reg16(Reg16::De, cpu.reg16(Reg16::De).wrapping_sub(1)); }
        0x2b => { bus.tick_m_cycle(); cpu.set_reg16(Reg16::Hl, cpu.reg16(Reg16::Hl).wrapping_sub(1)); }
        0x3b => { bus.tick_m_cycle(); cpu.regs.sp = cpu.regs.sp.wrapping_sub(1); }

        0x09 | 0x19 | 0x29 | 0x39 => {
            let rr = match opcode {
                0x09 => cpu.reg16(Reg16::Bc),
                0x19 => cpu.reg16(Reg16::De),
                0x29 => cpu.reg16(Reg16::Hl),
                _ => cpu.regs.sp,
            };
            let hl = cpu.regs.hl();
            let (result, half, full) = carrying_add_u16(hl, rr);
            bus.tick_m_cycle();
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, half);
            cpu.set_flag(FLAG_C, full);
            cpu.regs.set_hl(result);
        }

        0x08 => {
            let addr = cpu.fetch_word(bus);
            bus.write(addr, get_low(cpu.regs.sp));
            bus.write(addr.wrapping_add(1), get_high(cpu.regs.sp));
        }

        0xe8 => {
            let offset = cpu.fetch_byte(bus) as i8 as i16;
            let sp = cpu.regs.sp;
            let result = sp.wrapping_add(offset as u16);
            let half = (sp & 0x0f) as i16 + (offset & 0x0f) > 0x0f;
            let full = (sp & 0xff) as i16 + (offset & 0xff) > 0xff;
            cpu.set_flag(FLAG_Z, false);
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, half);
            cpu.set_flag(FLAG_C, full);
            bus.tick_m_cycle();
            bus.tick_m_cycle();
            cpu.regs.sp = result;
        }

        0xf8 => {
            let offset = cpu.fetch_byte(bus) as i8 as i16;
            let sp = cpu.regs.sp;
            let result = sp.wrapping_add(offset as u16);
            let half = (sp & 0x0f) as i16 + (offset & 0x0f) > 0x0f;
            let full = (sp & 0xff) as i16 + (offset & 0xff) > 0xff;
            cpu.set_flag(FLAG_Z, false);
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, half);
            cpu.set_flag(FLAG_C, full);
            bus.tick_m_cycle();
            cpu.regs.set_hl(result);
        }

        0xf9 => { bus.tick_m_cycle(); cpu.regs.sp = cpu.regs.hl(); }

        // LDH / high-page and absolute (C)/A and (a16)/A loads
        0xe0 => { let off = cpu.fetch_byte(bus); bus.write(0xff00 + off as u16, cpu.regs.a); }
        0xf0 => { let off = cpu.fetch_byte(bus); cpu.regs.a = bus.read(0xff00 + off as u16); }
        0xe2 => bus.write(0xff00 + cpu.regs.c as u16, cpu.regs.a),
        0xf2 => cpu.regs.a = bus.read(0xff00 + cpu.regs.c as u16),
        0xea => { let addr = cpu.fetch_word(bus); bus.write(addr, cpu.regs.a); }
        0xfa => { let addr = cpu.fetch_word(bus); cpu.regs.a = bus.read(addr); }

        // rotates on A (always clear Z, unlike the CB-prefixed forms)
        0x07 => { let (r, c) = rlc(cpu.regs.a); cpu.regs.a = r; set_rotate_flags(cpu, c); }
        0x0f => { let (r, c) = rrc(cpu.regs.a); cpu.regs.a = r; set_rotate_flags(cpu, c); }
        0x17 => { let (r, c) = rl(cpu.regs.a, cpu.flag(FLAG_C)); cpu.regs.a = r; set_rotate_flags(cpu, c); }
        0x1f => { let (r, c) = rr(cpu.regs.a, cpu.flag(FLAG_C)); cpu.regs.a = r; set_rotate_flags(cpu, c); }

        0x27 => daa(cpu),
        0x2f => { cpu.regs.a = !cpu.regs.a; cpu.set_flag(FLAG_N, true); cpu.set_flag(FLAG_H, true); }
        0x37 => { cpu.set_flag(FLAG_N, false); cpu.set_flag(FLAG_H, false); cpu.set_flag(FLAG_C, true); }
        0x3f => { let c = cpu.flag(FLAG_C); cpu.set_flag(FLAG_N, false); cpu.set_flag(FLAG_H, false); cpu.set_flag(FLAG_C, !c); }

        // relative/absolute jumps and calls
        0x18 => jr(cpu, bus, true),
        0x20 => jr(cpu, bus, !cpu.flag(FLAG_Z)),
        0x28 => jr(cpu, bus, cpu.flag(FLAG_Z)),
        0x30 => jr(cpu, bus, !cpu.flag(FLAG_C)),
        0x38 => jr(cpu, bus, cpu.flag(FLAG_C)),

        0xc3 => jp(cpu, bus, true),
        0xc2 => jp(cpu, bus, !cpu.flag(FLAG_Z)),
        0xca => jp(cpu, bus, cpu.flag(FLAG_Z)),
        0xd2 => jp(cpu, bus, !cpu.flag(FLAG_C)),
        0xda => jp(cpu, bus, cpu.flag(FLAG_C)),
        0xe9 => cpu.regs.pc = cpu.regs.hl(),

        0xcd => call(cpu, bus, true),
        0xc4 => call(cpu, bus, !cpu.flag(FLAG_Z)),
        0xcc => call(cpu, bus, cpu.flag(FLAG_Z)),
        0xd4 => call(cpu, bus, !cpu.flag(FLAG_C)),
        0xdc => call(cpu, bus, cpu.flag(FLAG_C)),

        0xc9 => ret(cpu, bus, true, false),
        0xc0 => ret(cpu, bus, !cpu.flag(FLAG_Z), true),
        0xc8 => ret(cpu, bus, cpu.flag(FLAG_Z), true),
        0xd0 => ret(cpu, bus, !cpu.flag(FLAG_C), true),
        0xd8 => ret(cpu, bus, cpu.flag(FLAG_C), true),
        0xd9 => { ret(cpu, bus, true, false); cpu.ime = true; }

        0xc7 | 0xcf | 0xd7 | 0xdf | 0xe7 | 0xef | 0xf7 | 0xff => {
            bus.tick_m_cycle();
            cpu.push16(bus, cpu.regs.pc);
            cpu.regs.pc = (opcode & 0x38) as u16;
        }

        // push/pop
        0xc5 => { bus.tick_m_cycle(); let v = cpu.reg16(Reg16::Bc); cpu.push16(bus, v); }
        0xd5 => { bus.tick_m_cycle(); let v = cpu.reg16(Reg16::De); cpu.push16(bus, v); }
        0xe5 => { bus.tick_m_cycle(); let v = cpu.reg16(Reg16::Hl); cpu.push16(bus, v); }
        0xf5 => { bus.tick_m_cycle(); let v = cpu.regs.af(); cpu.push16(bus, v); }

        0xc1 => { let v = cpu.pop16(bus); cpu.set_reg16(Reg16::Bc, v); }
        0xd1 => { let v = cpu.pop16(bus); cpu.set_reg16(Reg16::De, v); }
        0xe1 => { let v = cpu.pop16(bus); cpu.set_reg16(Reg16::Hl, v); }
        0xf1 => { let v = cpu.pop16(bus); cpu.regs.set_af(v); }

        0xcb => {
            let cb_opcode = cpu.fetch_byte(bus);
            cb::execute(cpu, bus, cb_opcode);
        }

        // D3 DB DD E3 E4 EB EC ED F4 FC FD: no such opcode on real hardware.
        0xd3 | 0xdb | 0xdd | 0xe3 | 0xe4 | 0xeb | 0xec | 0xed | 0xf4 | 0xfc | 0xfd => {
            let pc = cpu.regs.pc.wrapping_sub(1);
            log::warn!("illegal opcode {:#04x} at {:#06x}, pausing", opcode, pc);
            cpu.paused = true;
            bus.record_fault(super::Fault { opcode, pc });
        }

        _ => unreachable!("opcode {:#04x} not covered by the dispatch table", opcode),
    }
}

fn alu_op(kind: u8, cpu: &mut Cpu, value: u8) {
    let a = cpu.regs.a;
    match kind {
        0 => { let (r, h, c) = carrying_add_u8(a, value, false); finish_add(cpu, r, h, c); }
        1 => { let (r, h, c) = carrying_add_u8(a, value, cpu.flag(FLAG_C)); finish_add(cpu, r, h, c); }
        2 => { let (r, h, c) = borrowing_sub_u8(a, value, false); finish_sub(cpu, r, h, c); }
        3 => { let (r, h, c) = borrowing_sub_u8(a, value, cpu.flag(FLAG_C)); finish_sub(cpu, r, h, c); }
        4 => {
            let r = a & value;
            cpu.regs.a = r;
            cpu.set_flag(FLAG_Z, r == 0);
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, true);
            cpu.set_flag(FLAG_C, false);
        }
        5 => {
            let r = a ^ value;
            cpu.regs.a = r;
            cpu.set_flag(FLAG_Z, r == 0);
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, false);
            cpu.set_flag(FLAG_C, false);
        }
        6 => {
            let r = a | value;
            cpu.regs.a = r;
            cpu.set_flag(FLAG_Z, r == 0);
            cpu.set_flag(FLAG_N, false);
            cpu.set_flag(FLAG_H, false);
            cpu.set_flag(FLAG_C, false);
        }
        7 => {
            let (r, h, c) = borrowing_sub_u8(a, value, false);
            cpu.set_flag(FLAG_Z, r == 0);
            cpu.set_flag(FLAG_N, true);
            cpu.set_flag(FLAG_H, h);
            cpu.set_flag(FLAG_C, c);
        }
        _ => unreachable!(),
    }
}

fn finish_add(cpu: &mut Cpu, result: u8, half: bool, carry: bool) {
    cpu.regs.a = result;
    cpu.set_flag(FLAG_Z, result == 0);
    cpu.set_flag(FLAG_N, false);
    cpu.set_flag(FLAG_H, half);
    cpu.set_flag(FLAG_C, carry);
}

fn finish_sub(cpu: &mut Cpu, result: u8, half: bool, carry: bool) {
    cpu.regs.a = result;
    cpu.set_flag(FLAG_Z, result == 0);
    cpu.set_flag(FLAG_N, true);
    cpu.set_flag(FLAG_H, half);
    cpu.set_flag(FLAG_C, carry);
}

fn set_rotate_flags(cpu: &mut Cpu, carry: bool) {
    cpu.set_flag(FLAG_Z, false);
    cpu.set_flag(FLAG_N, false);
    cpu.set_flag(FLAG_H, false);
    cpu.set_flag(FLAG_C, carry);
}

pub(super) fn rlc(value: u8) -> (u8, bool) {
    let carry = (value & 0x80) != 0;
    (value.rotate_left(1), carry)
}

pub(super) fn rrc(value: u8) -> (u8, bool) {
    let carry = (value & 0x01) != 0;
    (value.rotate_right(1), carry)
}

pub(super) fn rl(value: u8, carry_in: bool) -> (u8, bool) {
    let carry = (value & 0x80) != 0;
    (value << 1 | (carry_in as u8), carry)
}

pub(super) fn rr(value: u8, carry_in: bool) -> (u8, bool) {
    let carry = (value & 0x01) != 0;
    (value >> 1 | ((carry_in as u8) << 7), carry)
}

fn daa(cpu: &mut Cpu) {
    let mut a = cpu.regs.a;
    let mut carry = cpu.flag(FLAG_C);

    if !cpu.flag(FLAG_N) {
        if carry || a > 0x99 {
            a = a.wrapping_add(0x60);
            carry = true;
        }
        if cpu.flag(FLAG_H) || (a & 0x0f) > 0x09 {
            a = a.wrapping_add(0x06);
        }
    }
    else {
        if carry {
            a = a.wrapping_sub(0x60);
        }
        if cpu.flag(FLAG_H) {
            a = a.wrapping_sub(0x06);
        }
    }

    cpu.set_flag(FLAG_Z, a == 0);
    cpu.set_flag(FLAG_H, false);
    cpu.set_flag(FLAG_C, carry);
    cpu.regs.a = a;
}

fn jr(cpu: &mut Cpu, bus: &mut dyn CpuBus, take: bool) {
    let offset = cpu.fetch_byte(bus) as i8;
    if take {
        bus.tick_m_cycle();
        cpu.regs.pc = cpu.regs.pc.wrapping_add(offset as u16);
    }
}

fn jp(cpu: &mut Cpu, bus: &mut dyn CpuBus, take: bool) {
    let addr = cpu.fetch_word(bus);
    if take {
        bus.tick_m_cycle();
        cpu.regs.pc = addr;
    }
}

fn call(cpu: &mut Cpu, bus: &mut dyn CpuBus, take: bool) {
    let addr = cpu.fetch_word(bus);
    if take {
        bus.tick_m_cycle();
        cpu.push16(bus, cpu.regs.pc);
        cpu.regs.pc = addr;
    }
}

fn ret(cpu: &mut Cpu, bus: &mut dyn CpuBus, take: bool, conditional: bool) {
    if conditional {
        bus.tick_m_cycle();
    }
    if take {
        let addr = cpu.pop16(bus);
        bus.tick_m_cycle();
        cpu.regs.pc = addr;
    }
}

