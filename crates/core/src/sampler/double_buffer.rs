use std::sync::Arc;

use crate::shared::content_size::ContentSize;
use crate::shared::pixels::{CaptureBuffer, OpaqueBuffer};

/// One half of the double buffer: the raw capture target and the opaque
/// buffer it is converted into.
struct BufferSlot {
    raw: CaptureBuffer,
    opaque: Arc<OpaqueBuffer>,
}

/// A slot lent to the capture worker for the duration of one attempt.
pub struct Checkout {
    index: usize,
    size: ContentSize,
    pub raw: CaptureBuffer,
    pub opaque: Arc<OpaqueBuffer>,
}

/// Two capture/opaque buffer pairs sized to the current capture resolution.
///
/// Captures alternate between the pairs so the buffer backing the last
/// published frame is not the next capture target. Buffers are reallocated
/// only when the requested resolution changes.
#[derive(Default)]
pub struct DoubleBuffer {
    size: Option<ContentSize>,
    slots: [Option<BufferSlot>; 2],
    next: usize,
    allocations: u64,
}

impl DoubleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current resolution, `None` when released.
    pub fn size(&self) -> Option<ContentSize> {
        self.size
    }

    /// Number of times the pair has been (re)allocated.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Index of the slot the next capture writes into.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Makes both pairs match `size`. Returns true if memory was reallocated.
    pub fn ensure(&mut self, size: ContentSize) -> bool {
        let complete = self.slots.iter().all(Option::is_some);
        if self.size == Some(size) && complete {
            return false;
        }
        self.slots = [Some(BufferSlot::new(size)), Some(BufferSlot::new(size))];
        self.size = Some(size);
        self.next = 0;
        self.allocations += 1;
        true
    }

    /// Lends out the next capture slot.
    pub fn checkout(&mut self) -> Option<Checkout> {
        let size = self.size?;
        let slot = self.slots[self.next].take()?;
        Some(Checkout {
            index: self.next,
            size,
            raw: slot.raw,
            opaque: slot.opaque,
        })
    }

    /// Returns a lent slot. Dropped instead if the buffers were released or
    /// resized in the meantime.
    pub fn checkin(&mut self, checkout: Checkout) {
        if self.size != Some(checkout.size) || self.slots[checkout.index].is_some() {
            return;
        }
        self.slots[checkout.index] = Some(BufferSlot {
            raw: checkout.raw,
            opaque: checkout.opaque,
        });
    }

    /// Alternates the capture target after a publish.
    pub fn flip(&mut self) {
        self.next ^= 1;
    }

    /// Frees both pairs.
    pub fn release(&mut self) {
        self.slots = [None, None];
        self.size = None;
        self.next = 0;
    }
}

impl BufferSlot {
    fn new(size: ContentSize) -> Self {
        Self {
            raw: CaptureBuffer::new(size.width, size.height),
            opaque: Arc::new(OpaqueBuffer::new(size.width, size.height)),
        }
    }
}
