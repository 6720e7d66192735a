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

//! The joypad: eight host-writable button booleans, sampled into the `P1`
//! register's selected column once per `update()`, raising JOYPAD on any
//! high-to-low transition.

use crate::interrupts::{Interrupt, InterruptRegisters};

const SELECT_DPAD: u8 = 1 << 4;
const SELECT_BUTTONS: u8 = 1 << 5;

/// The eight buttons, set by the host before calling [`crate::Emulator::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JoypadInput {
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug)]
pub struct Joypad {
    pub input: JoypadInput,
    select_bits: u8,
    column: u8,
}

impl Default for Joypad {
    fn default() -> Self {
        Self::new()
    }
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            input: JoypadInput::default(),
            select_bits: SELECT_DPAD | SELECT_BUTTONS,
            column: 0x0f,
        }
    }

    /// Reads `P1`: the selected column in the low 4 bits (0 = pressed), the
    /// select bits echoed back, and the top two bits fixed to 1.
    pub fn read_p1(&self) -> u8 {
        0xc0 | self.select_bits | self.column
    }

    /// Only bits 4 and 5 (column select) are writable.
    pub fn write_p1(&mut self, value: u8) {
        self.select_bits = value & (SELECT_DPAD | SELECT_BUTTONS);
    }

    fn key_state(&self) -> u8 {
        let dpad_selected = (self.select_bits & SELECT_DPAD) == 0;
        let buttons_selected = (self.select_bits & SELECT_BUTTONS) == 0;

        let mut bits = 0x0f;

        if dpad_selected {
            bits &= !self.pressed_bits(self.input.right, self.input.left, self.input.up, self.input.down);
        }

        if buttons_selected {
            bits &= !self.pressed_bits(self.input.a, self.input.b, self.input.select, self.input.start);
        }

        bits
    }

    fn pressed_bits(&self, bit0: bool, bit1: bool, bit2: bool, bit3: bool) -> u8 {
        (bit0 as u8) | ((bit1 as u8) << 1) | ((bit2 as u8) << 2) | ((bit3 as u8) << 3)
    }

    /// Samples the current button state; any bit transitioning from 1 (not
    /// pressed) to 0 (pressed) raises JOYPAD.
    pub fn update(&mut self, interrupts: &mut InterruptRegisters) {
        let new_state = self.key_state();

        let newly_pressed = (!new_state) & self.column;
        if newly_pressed != 0 {
            interrupts.request(Interrupt::Joypad);
        }

        self.column = new_state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressing_a_button_raises_joypad_irq() {
        let mut joypad = Joypad::new();
        let mut interrupts = InterruptRegisters::new();

        joypad.write_p1(0xdf); // select d-pad column
        joypad.input.down = true;
        joypad.update(&mut interrupts);

        assert!(interrupts.pending() & (Interrupt::Joypad as u8) != 0);
        assert_eq!(joypad.read_p1() & 0x08, 0);
    }

    #[test]
    fn unselected_column_reads_all_ones() {
        let mut joypad = Joypad::new();
        joypad.write_p1(0xff); // neither column selected
        let mut interrupts = InterruptRegisters::new();
        joypad.input.a = true;
        joypad.update(&mut interrupts);
        assert_eq!(joypad.read_p1() & 0x0f, 0x0f);
    }
}
