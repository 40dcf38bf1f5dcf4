//! Fixed-delay pacing for sequential request loops.
//!
//! `Paced` sleeps for a fixed delay before handing out every item after the
//! first. Because the caller only asks for the next item once it has finished
//! with the current one, the delay always separates the end of one request
//! from the start of the next. No delay follows the last item.

use std::time::Duration;

/// Iterator adapter that waits `delay` between items.
pub struct Paced<I> {
    inner: I,
    delay: Duration,
    started: bool,
}

impl<I: Iterator> Iterator for Paced<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        if self.started && !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.started = true;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pub trait PacedExt: Iterator + Sized {
    fn paced(self, delay: Duration) -> Paced<Self> {
        Paced {
            inner: self,
            delay,
            started: false,
        }
    }
}

impl<I: Iterator> PacedExt for I {}
