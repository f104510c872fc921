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

    devices::stfb::vbl.rs

    Vertical blank interrupt timer

*/

//! The VBL timer is a self-rescheduling virtual-time alarm. Each firing raises the
//! interrupt line and pushes the deadline forward by one period. The line is level
//! triggered, so firings while the guest has not yet acknowledged the previous one
//! are absorbed: they advance the deadline but do not produce a new edge.

use crate::interrupt::IrqLine;

/// Periods at or below this are treated as "disable". A guest that programs a tiny
/// period would otherwise flood the sequencer with timer events.
pub const VBL_MIN_PERIOD_NS: u32 = 100_000;

/// Nominal vertical blank period of the original hardware (60.15Hz).
pub const VBL_DEFAULT_PERIOD_NS: u32 = 16_625_800;

#[derive(Clone, Debug, Default)]
pub struct VblTimer {
    period:   u32,
    deadline: Option<u64>,
}

impl VblTimer {
    /// Program the timer. Returns the period that should be reflected in the
    /// VBL_PERIOD register: `period` if the timer was armed, 0 if it was disarmed.
    pub fn program(&mut self, period: u32, now_ns: u64) -> u32 {
        if period > VBL_MIN_PERIOD_NS {
            self.period = period;
            self.deadline = Some(now_ns + period as u64);
            log::debug!(
                "VBL: armed with period {}ns, next deadline {}ns",
                period,
                now_ns + period as u64
            );
            period
        }
        else {
            if self.deadline.is_some() {
                log::debug!("VBL: disarmed (requested period {}ns)", period);
            }
            self.disarm();
            0
        }
    }

    pub fn disarm(&mut self) {
        self.period = 0;
        self.deadline = None;
    }

    /// Restore a saved period and deadline. The timer ends up idle unless both a valid
    /// period and a deadline were saved.
    pub fn restore(&mut self, period: u32, deadline: Option<u64>) {
        match deadline {
            Some(deadline) if period > VBL_MIN_PERIOD_NS => {
                self.period = period;
                self.deadline = Some(deadline);
            }
            _ => self.disarm(),
        }
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    #[inline]
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Fire every deadline that falls at or before `now_ns`. Returns the number of
    /// firings.
    pub fn run(&mut self, now_ns: u64, irq: &mut IrqLine) -> u32 {
        let mut fired = 0;
        while let Some(deadline) = self.deadline {
            if deadline > now_ns {
                break;
            }
            if !irq.raise() {
                log::trace!("VBL: fired at {}ns with IRQ still pending", deadline);
            }
            self.deadline = Some(deadline + self.period as u64);
            fired += 1;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_periods_disarm() {
        let mut vbl = VblTimer::default();
        assert_eq!(vbl.program(2_000_000, 0), 2_000_000);
        assert!(vbl.is_armed());

        assert_eq!(vbl.program(VBL_MIN_PERIOD_NS, 0), 0);
        assert!(!vbl.is_armed());
        assert_eq!(vbl.period(), 0);

        vbl.program(2_000_000, 0);
        assert_eq!(vbl.program(0, 0), 0);
        assert!(!vbl.is_armed());
    }

    #[test]
    fn reprogramming_moves_deadline() {
        let mut vbl = VblTimer::default();
        vbl.program(2_000_000, 1_000);
        assert_eq!(vbl.deadline(), Some(2_001_000));
        vbl.program(3_000_000, 500_000);
        assert_eq!(vbl.deadline(), Some(3_500_000));
    }

    #[test]
    fn firing_reschedules_and_holds_line() {
        let mut vbl = VblTimer::default();
        let mut irq = IrqLine::new(3);
        vbl.program(1_000_000, 0);

        assert_eq!(vbl.run(999_999, &mut irq), 0);
        assert!(!irq.is_asserted());

        assert_eq!(vbl.run(1_000_000, &mut irq), 1);
        assert!(irq.is_asserted());
        assert_eq!(vbl.deadline(), Some(2_000_000));

        // Three more periods elapse without an acknowledge.
        assert_eq!(vbl.run(4_500_000, &mut irq), 3);
        assert!(irq.is_asserted());
        assert_eq!(irq.edges(), 1);
        assert_eq!(vbl.deadline(), Some(5_000_000));
    }

    #[test]
    fn disarmed_timer_never_fires() {
        let mut vbl = VblTimer::default();
        let mut irq = IrqLine::new(3);
        vbl.program(1_000_000, 0);
        vbl.program(0, 10);
        assert_eq!(vbl.run(u64::MAX / 2, &mut irq), 0);
        assert!(!irq.is_asserted());
    }

    #[test]
    fn restore_without_deadline_is_idle() {
        let mut vbl = VblTimer::default();
        vbl.restore(2_000_000, None);
        assert!(!vbl.is_armed());
        assert_eq!(vbl.period(), 0);

        vbl.restore(2_000_000, Some(3_000_000));
        assert!(vbl.is_armed());
        assert_eq!(vbl.period(), 2_000_000);

        vbl.restore(VBL_MIN_PERIOD_NS, Some(3_000_000));
        assert!(!vbl.is_armed());
        assert_eq!(vbl.period(), 0);
    }
}
