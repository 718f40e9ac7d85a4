/// Fixed-capacity double-ended queue over a ring of slots.
///
/// Used by the envelope builder to hold monotonic index queues. Capacity is
/// fixed at construction; pushing into a full deque is a caller bug.
#[derive(Debug, Clone)]
pub struct RingDeque<T: Copy + Default> {
    slots: Vec<T>,
    head: usize,
    len: usize,
}

impl<T: Copy + Default> RingDeque<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "RingDeque capacity must be > 0");
        Self {
            slots: vec![T::default(); capacity],
            head: 0,
            len: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    #[inline]
    fn slot(&self, offset: usize) -> usize {
        let idx = self.head + offset;
        if idx >= self.slots.len() {
            idx - self.slots.len()
        } else {
            idx
        }
    }

    #[inline]
    pub fn push_back(&mut self, value: T) {
        assert!(self.len < self.slots.len(), "RingDeque overflow");
        let tail = self.slot(self.len);
        self.slots[tail] = value;
        self.len += 1;
    }

    #[inline]
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let value = self.slots[self.head];
        self.head = self.slot(1);
        self.len -= 1;
        Some(value)
    }

    #[inline]
    pub fn pop_back(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.slots[self.slot(self.len)])
    }

    #[inline]
    pub fn front(&self) -> Option<T> {
        (self.len > 0).then(|| self.slots[self.head])
    }

    #[inline]
    pub fn back(&self) -> Option<T> {
        (self.len > 0).then(|| self.slots[self.slot(self.len - 1)])
    }
}
