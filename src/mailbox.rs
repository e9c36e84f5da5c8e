//! Single-slot handoff between two pipeline stages.
//!
//! A [`Mailbox`] holds the most recent value published by its producer and
//! a binary release permit.  Publishing overwrites the slot and sets the
//! permit; consuming takes the permit and reads the slot.  There is no
//! queue: a slow consumer only ever observes the latest value.
//!
//! ```text
//!  producer ──publish(v)──▶ ┌───────────────────────────┐
//!                           │ value · permit · closed   │ ──consume()──▶ consumer
//!                           │ (one critical section)    │
//!                           └───────────────────────────┘
//! ```
//!
//! Value, permit and waker live behind one
//! [`blocking_mutex::Mutex`](embassy_sync::blocking_mutex::Mutex), so a
//! consumer can never see the permit before the matching write, and
//! read-then-clear is a single step.

use core::cell::RefCell;
use core::future::poll_fn;
use core::task::{Context, Poll};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::waitqueue::WakerRegistration;

/// Returned by the consume operations once the producer has closed the
/// mailbox and no unconsumed value remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxClosed;

impl core::fmt::Display for MailboxClosed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "mailbox closed")
    }
}

struct Slot<T> {
    value: T,
    /// Release permit; never counts above one.
    pending: bool,
    closed: bool,
    waker: WakerRegistration,
}

/// Latest-value-wins cell with an attached release permit.
pub struct Mailbox<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Slot<T>>>,
}

impl<T: Copy> Mailbox<T> {
    /// Create an open mailbox holding `initial` with no permit set.
    pub const fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Slot {
                value: initial,
                pending: false,
                closed: false,
                waker: WakerRegistration::new(),
            })),
        }
    }

    /// Overwrite the slot and release the consumer.
    ///
    /// An unconsumed previous value is discarded.  Publishing into a closed
    /// mailbox still updates [`latest`](Self::latest) but sets no permit.
    pub fn publish(&self, value: T) {
        self.inner.lock(|cell| {
            let mut slot = cell.borrow_mut();
            slot.value = value;
            if !slot.closed {
                slot.pending = true;
                slot.waker.wake();
            }
        });
    }

    /// Poll for the release permit.  Registers the waker when none is set.
    pub fn poll_consume(&self, cx: &mut Context<'_>) -> Poll<Result<T, MailboxClosed>> {
        self.inner.lock(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.pending {
                slot.pending = false;
                Poll::Ready(Ok(slot.value))
            } else if slot.closed {
                Poll::Ready(Err(MailboxClosed))
            } else {
                slot.waker.register(cx.waker());
                Poll::Pending
            }
        })
    }

    /// Wait for the release permit, take it and return the slot value.
    pub async fn consume(&self) -> Result<T, MailboxClosed> {
        poll_fn(|cx| self.poll_consume(cx)).await
    }

    /// Blocking variant of [`consume`](Self::consume) for thread-backed tasks.
    pub fn consume_blocking(&self) -> Result<T, MailboxClosed> {
        futures_lite::future::block_on(self.consume())
    }

    /// Take the permit if one is set, without waiting.
    pub fn try_consume(&self) -> Option<T> {
        self.inner.lock(|cell| {
            let mut slot = cell.borrow_mut();
            if slot.pending {
                slot.pending = false;
                Some(slot.value)
            } else {
                None
            }
        })
    }

    /// Most recently published value (or the initial one).  Does not touch
    /// the permit.
    pub fn latest(&self) -> T {
        self.inner.lock(|cell| cell.borrow().value)
    }

    pub fn is_pending(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().pending)
    }

    /// Close the mailbox.  A pending value is still delivered; after that
    /// every consume returns [`MailboxClosed`].
    pub fn close(&self) {
        self.inner.lock(|cell| {
            let mut slot = cell.borrow_mut();
            slot.closed = true;
            slot.waker.wake();
        });
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock(|cell| cell.borrow().closed)
    }
}
