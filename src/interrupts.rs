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

//! The `IF`/`IE` interrupt registers, in priority order VBLANK < LCD_STAT <
//! TIMER < SERIAL < JOYPAD.

use flagset::{flags, FlagSet};

flags! {
    /// A single interrupt source, ordered by hardware priority (lower variants first).
    pub enum Interrupt: u8 {
        VBlank   = 1 << 0,
        LcdStat  = 1 << 1,
        Timer    = 1 << 2,
        Serial   = 1 << 3,
        Joypad   = 1 << 4,
    }
}

pub type InterruptSet = FlagSet<Interrupt>;

/// Interrupt vector addresses, in the same priority order as [`Interrupt`].
const VECTORS: [(Interrupt, u16); 5] = [
    (Interrupt::VBlank, 0x40),
    (Interrupt::LcdStat, 0x48),
    (Interrupt::Timer, 0x50),
    (Interrupt::Serial, 0x58),
    (Interrupt::Joypad, 0x60),
];

/// The pair of registers at `0xFF0F` (IF) and `0xFFFF` (IE). Both only ever
/// carry 5 meaningful bits; the upper 3 read back as 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterruptRegisters {
    iflag: u8,
    ienable: u8,
}

impl InterruptRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_if(&self) -> u8 {
        self.iflag | 0xe0
    }

    pub fn write_if(&mut self, value: u8) {
        self.iflag = value & 0x1f;
    }

    pub fn read_ie(&self) -> u8 {
        self.ienable | 0xe0
    }

    pub fn write_ie(&mut self, value: u8) {
        self.ienable = value & 0x1f;
    }

    /// Raises one or more interrupt requests.
    pub fn request(&mut self, set: impl Into<InterruptSet>) {
        self.iflag |= set.into().bits();
    }

    /// Clears a single interrupt request bit (done by the CPU when it
    /// services that interrupt).
    pub fn clear(&mut self, interrupt: Interrupt) {
        self.iflag &= !(interrupt as u8);
    }

    /// The interrupts that are both requested and enabled, in other words the
    /// set the CPU must act on when `IME` is set.
    pub fn pending(&self) -> u8 {
        self.iflag & self.ienable & 0x1f
    }

    /// Whether any interrupt is pending and enabled, regardless of `IME`
    /// (used to resume from `HALT`).
    pub fn any_pending(&self) -> bool {
        self.pending() != 0
    }

    /// Returns the highest-priority pending interrupt and its vector, if any.
    pub fn highest_priority(&self) -> Option<(Interrupt, u16)> {
        let pending = self.pending();
        VECTORS.into_iter().find(|(interrupt, _)| (pending & (*interrupt as u8)) != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unused_bits_read_as_one() {
        let mut regs = InterruptRegisters::new();
        regs.write_if(0x00);
        assert_eq!(regs.read_if(), 0xe0);
        regs.write_ie(0xff);
        assert_eq!(regs.read_ie(), 0xff);
    }

    #[test]
    fn priority_order_is_vblank_first() {
        let mut regs = InterruptRegisters::new();
        regs.write_ie(0x1f);
        regs.request(Interrupt::Timer | Interrupt::VBlank);
        let (interrupt, vector) = regs.highest_priority().unwrap();
        assert!(matches!(interrupt, Interrupt::VBlank));
        assert_eq!(vector, 0x40);
    }

    #[test]
    fn clearing_removes_only_that_bit() {
        let mut regs = InterruptRegisters::new();
        regs.write_ie(0x1f);
        regs.request(Interrupt::Timer | Interrupt::Serial);
        regs.clear(Interrupt::Timer);
        assert!(!regs.any_pending() || regs.highest_priority().unwrap().0 as u8 == Interrupt::Serial as u8);
    }
}
