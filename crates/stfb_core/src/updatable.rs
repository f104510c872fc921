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

    updatable.rs

    A value paired with a dirty flag

*/

//! Defines the Updatable type, which holds a value along with a flag recording that
//! the value changed since a consumer last looked at it. Video devices use it for
//! derived state that must be rebuilt (and the screen repainted) when it changes.

use std::ops::Deref;

#[derive(Clone, Debug)]
pub struct Updatable<T> {
    val:   T,
    dirty: bool,
}

impl<T> Updatable<T> {
    /// Wrap a value. New values start dirty so the first consumer always sees them.
    pub fn new(val: T) -> Self {
        Updatable { val, dirty: true }
    }
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
    #[inline]
    pub fn set(&mut self, newval: T) {
        self.val = newval;
        self.dirty = true;
    }
    #[inline]
    pub fn clean(&mut self) {
        self.dirty = false;
    }
    #[inline]
    pub fn get(&self) -> &T {
        &self.val
    }
}

impl<T: PartialEq> Updatable<T> {
    /// Replace the value, only marking dirty if it differs.
    #[inline]
    pub fn update(&mut self, newval: T) {
        if self.val != newval {
            self.val = newval;
            self.dirty = true;
        }
    }
}

impl<T> Deref for Updatable<T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &T {
        &self.val
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_only_dirties_on_change() {
        let mut u = Updatable::new(5u32);
        assert!(u.is_dirty());
        u.clean();

        u.update(5);
        assert!(!u.is_dirty());
        u.update(6);
        assert!(u.is_dirty());
        assert_eq!(*u, 6);
    }
}
