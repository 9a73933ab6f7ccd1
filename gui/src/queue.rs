//! Event Queue
//!
//! Bounded FIFO carrying events from interrupt handlers (producers) to the
//! GUI main loop (consumer).
//!
//! The ring has `EVENT_QUEUE_SLOTS` slots and is full when advancing `head`
//! would make it equal `tail`, so at most `EVENT_QUEUE_SLOTS - 1` events are
//! stored at once. A post into a full ring is dropped; the caller gets
//! `false` back and the drop counter is bumped, nothing else happens.
//!
//! ## Concurrency
//!
//! Producers are serialized by a spin lock around the `head` update; the
//! consumer never takes it. `tail` is written only by the consumer. Each
//! side publishes its index with `Release` and observes the other's with
//! `Acquire`, so a slot is never read before it is written nor overwritten
//! before it is read.
//!
//! The consumer must not post into the ring itself: an IRQ arriving while
//! the main loop held the producer lock would spin forever on the same CPU.
//! Events produced by the main loop go through a [`LocalQueue`] instead.

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::Mutex;

use crate::event::{Event, EventKind};

/// Number of ring slots (one is always left free)
pub const EVENT_QUEUE_SLOTS: usize = 256;

/// Event ring shared with IRQ producers
pub struct EventQueue {
    /// Ring entries
    slots: [UnsafeCell<Event>; EVENT_QUEUE_SLOTS],
    /// Serializes producers
    producer: Mutex<()>,
    /// Next slot to write (producer)
    head: AtomicUsize,
    /// Next slot to read (consumer)
    tail: AtomicUsize,
    /// Events dropped because the ring was full
    dropped: AtomicUsize,
}

// Safety: slot access is partitioned by the head/tail protocol described
// in the module docs.
unsafe impl Sync for EventQueue {}
unsafe impl Send for EventQueue {}

#[allow(clippy::declare_interior_mutable_const)]
const EMPTY_SLOT: UnsafeCell<Event> = UnsafeCell::new(Event::new(EventKind::None));

impl EventQueue {
    /// Create an empty queue
    pub const fn new() -> Self {
        Self {
            slots: [EMPTY_SLOT; EVENT_QUEUE_SLOTS],
            producer: Mutex::new(()),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
        }
    }

    /// Append an event (producer side).
    ///
    /// Returns `false` if the ring was full and the event was dropped.
    pub fn post(&self, event: Event) -> bool {
        let _producer = self.producer.lock();
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % EVENT_QUEUE_SLOTS;

        if next == self.tail.load(Ordering::Acquire) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::trace!("[GUI] Event queue full, dropping {:?}", event.kind);
            return false;
        }

        // Safety: we hold the producer lock, and the consumer never reads
        // slot `head` until we publish it
        unsafe { *self.slots[head].get() = event };
        self.head.store(next, Ordering::Release);
        true
    }

    /// Remove the oldest event (consumer side)
    pub fn pop(&self) -> Option<Event> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // Safety: slot `tail` was published by the producer's Release store
        let event = unsafe { *self.slots[tail].get() };
        self.tail
            .store((tail + 1) % EVENT_QUEUE_SLOTS, Ordering::Release);
        Some(event)
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + EVENT_QUEUE_SLOTS - tail) % EVENT_QUEUE_SLOTS
    }

    /// Maximum number of events held at once
    pub const fn capacity(&self) -> usize {
        EVENT_QUEUE_SLOTS - 1
    }

    /// Total events dropped on overflow
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer handle given to input drivers
#[derive(Clone)]
pub struct EventSender {
    queue: Arc<EventQueue>,
}

impl EventSender {
    pub(crate) fn new(queue: Arc<EventQueue>) -> Self {
        Self { queue }
    }

    /// Post an event; `false` means it was dropped
    #[inline]
    pub fn post(&self, event: Event) -> bool {
        self.queue.post(event)
    }

    /// Pending events in the shared queue
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Consumer-side FIFO for events the main loop produces itself
/// (handler follow-ups, loop-side posts). Same bound as the ring.
#[derive(Debug, Default)]
pub struct LocalQueue {
    events: VecDeque<Event>,
    dropped: usize,
}

impl LocalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event; `false` means it was dropped
    pub fn post(&mut self, event: Event) -> bool {
        if self.events.len() >= EVENT_QUEUE_SLOTS - 1 {
            self.dropped += 1;
            log::trace!("[GUI] Local queue full, dropping {:?}", event.kind);
            return false;
        }
        self.events.push_back(event);
        true
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_fifo_order() {
        let q = EventQueue::new();
        assert!(q.post(Event::key_down(1)));
        assert!(q.post(Event::key_down(2)));
        assert!(q.post(Event::key_down(3)));

        assert_eq!(q.len(), 3);
        assert_eq!(q.pop(), Some(Event::key_down(1)));
        assert_eq!(q.pop(), Some(Event::key_down(2)));
        assert_eq!(q.pop(), Some(Event::key_down(3)));
        assert_eq!(q.pop(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_holds_one_less_than_slots() {
        let q = EventQueue::new();
        let accepted = (0..EVENT_QUEUE_SLOTS)
            .filter(|&i| q.post(Event::user(0, i as u32)))
            .count();

        assert_eq!(accepted, EVENT_QUEUE_SLOTS - 1);
        assert_eq!(q.len(), 255);
        assert_eq!(q.dropped(), 1);
        // The dropped one was the last post
        assert_eq!(q.pop(), Some(Event::user(0, 0)));
    }

    #[test]
    fn test_wraparound() {
        let q = EventQueue::new();
        for round in 0..3u32 {
            for i in 0..200u32 {
                assert!(q.post(Event::user(0, round * 1000 + i)));
            }
            for i in 0..200u32 {
                assert_eq!(q.pop(), Some(Event::user(0, round * 1000 + i)));
            }
        }
        assert!(q.is_empty());
        assert_eq!(q.dropped(), 0);
    }

    #[test]
    fn test_post_after_drain_accepts_again() {
        let q = EventQueue::new();
        for _ in 0..EVENT_QUEUE_SLOTS {
            q.post(Event::key_down(0));
        }
        assert!(!q.post(Event::key_down(9)));
        q.pop();
        assert!(q.post(Event::key_down(9)));
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        const TOTAL: u32 = 20_000;
        let queue = Arc::new(EventQueue::new());
        let sender = EventSender::new(queue.clone());

        let producer = std::thread::spawn(move || {
            for i in 0..TOTAL {
                while !sender.post(Event::user(0, i)) {
                    core::hint::spin_loop();
                }
            }
        });

        let mut received = Vec::with_capacity(TOTAL as usize);
        while received.len() < TOTAL as usize {
            match queue.pop() {
                Some(ev) => received.push(ev),
                None => core::hint::spin_loop(),
            }
        }
        producer.join().unwrap();

        for (i, ev) in received.iter().enumerate() {
            assert_eq!(*ev, Event::user(0, i as u32));
        }
    }

    #[test]
    fn test_two_producers_lose_nothing() {
        const PER_PRODUCER: u32 = 50_000;
        let queue = Arc::new(EventQueue::new());

        let producers: Vec<_> = (0..2u32)
            .map(|id| {
                let sender = EventSender::new(queue.clone());
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        while !sender.post(Event::user(id, i)) {
                            core::hint::spin_loop();
                        }
                    }
                })
            })
            .collect();

        // Next expected sequence number per producer
        let mut next = [0u32; 2];
        let mut received = 0;
        while received < 2 * PER_PRODUCER {
            let Some(ev) = queue.pop() else {
                core::hint::spin_loop();
                continue;
            };
            let EventKind::User { code, data } = ev.kind else {
                panic!("unexpected event {:?}", ev);
            };
            let id = (code - crate::event::EVENT_USER_BASE) as usize;
            assert_eq!(data, next[id], "producer {} out of sequence", id);
            next[id] += 1;
            received += 1;
        }
        for p in producers {
            p.join().unwrap();
        }

        assert_eq!(next, [PER_PRODUCER; 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_local_queue_bounded_fifo() {
        let mut local = LocalQueue::new();
        for i in 0..EVENT_QUEUE_SLOTS as u32 {
            local.post(Event::user(0, i));
        }
        assert_eq!(local.len(), EVENT_QUEUE_SLOTS - 1);
        assert_eq!(local.dropped(), 1);
        assert_eq!(local.pop(), Some(Event::user(0, 0)));
        assert!(local.post(Event::key_down(1)));
    }
}
