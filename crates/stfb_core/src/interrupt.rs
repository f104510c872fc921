/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    interrupt.rs

    Level-triggered interrupt output line

*/

//! A device raises and lowers its line; the interrupt fabric samples the level.
//! The line also counts rising edges, which lets a harness tell a held line apart
//! from one that was signalled again.

#[derive(Clone, Debug, Default)]
pub struct IrqLine {
    level: u8,
    asserted: bool,
    edges: u64,
}

impl IrqLine {
    pub fn new(level: u8) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    /// The CPU interrupt priority level this line is wired to.
    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[inline]
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// Number of low-to-high transitions seen since creation.
    #[inline]
    pub fn edges(&self) -> u64 {
        self.edges
    }

    /// Assert the line. Returns true if this was a new edge.
    pub fn raise(&mut self) -> bool {
        if self.asserted {
            return false;
        }
        self.asserted = true;
        self.edges += 1;
        log::trace!("IRQ{}: raised", self.level);
        true
    }

    pub fn lower(&mut self) {
        if self.asserted {
            log::trace!("IRQ{}: lowered", self.level);
        }
        self.asserted = false;
    }

    /// Force the line to a given level without counting an edge. Used when restoring
    /// saved device state.
    pub fn set_asserted(&mut self, asserted: bool) {
        self.asserted = asserted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_is_idempotent() {
        let mut irq = IrqLine::new(3);
        assert!(irq.raise());
        assert!(!irq.raise());
        assert!(irq.is_asserted());
        assert_eq!(irq.edges(), 1);

        irq.lower();
        assert!(!irq.is_asserted());
        assert!(irq.raise());
        assert_eq!(irq.edges(), 2);
    }
}
