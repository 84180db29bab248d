//! Byte-budgeted reader for message payloads
//!
//! Every message inside an IWA record is read through a [`BudgetedReader`]
//! whose budget is set to the message's declared length. Handlers may read
//! as much or as little of the window as they like (or fail halfway through);
//! [`BudgetedReader::skip_remaining`] then realigns the underlying stream
//! with the next message boundary.

use std::io::{self, Read};

/// A reader that yields at most `budget` bytes before reporting end of stream
#[derive(Debug)]
pub struct BudgetedReader<R> {
    inner: R,
    budget: u64,
}

impl<R: Read> BudgetedReader<R> {
    /// Wrap a reader with an initial budget of zero bytes
    pub fn new(inner: R) -> Self {
        Self { inner, budget: 0 }
    }

    /// Replace the remaining budget
    pub fn set_budget(&mut self, budget: u64) {
        self.budget = budget;
    }

    /// Bytes still readable before the window is exhausted
    pub fn budget(&self) -> u64 {
        self.budget
    }

    /// Advance the inner stream past the rest of the window.
    ///
    /// The budget is zero afterwards, even when the inner stream ends early;
    /// an early end is reported as `UnexpectedEof`.
    pub fn skip_remaining(&mut self) -> io::Result<u64> {
        let budget = std::mem::take(&mut self.budget);
        if budget == 0 {
            return Ok(0);
        }

        let skipped = io::copy(&mut (&mut self.inner).take(budget), &mut io::sink())?;
        if skipped < budget {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("message window ends past end of stream: {} of {} bytes", skipped, budget),
            ));
        }
        Ok(skipped)
    }

    /// Borrow the wrapped reader; reads through it bypass the budget
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the wrapper and return the inner reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for BudgetedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.budget == 0 || buf.is_empty() {
            return Ok(0);
        }

        let max = buf.len().min(usize::try_from(self.budget).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..max])?;
        self.budget -= n as u64;
        Ok(n)
    }
}
