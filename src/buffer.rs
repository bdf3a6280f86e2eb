//! Bounded FIFO of raw audio samples shared between producer and consumer.

use std::collections::VecDeque;

/// Bounded sample queue with newest-biased eviction.
///
/// Appends always succeed; once `capacity` would be exceeded the oldest
/// samples are discarded, so a stalled consumer sees the most recent audio
/// rather than an ever-growing backlog. Under-supply on the read side is not
/// an error: [`SampleRingBuffer::peek_into`] reports it and nothing changes.
#[derive(Debug, Clone)]
pub struct SampleRingBuffer {
    data: VecDeque<f32>,
    capacity: usize,
}

impl SampleRingBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity > 0,
            "SampleRingBuffer capacity must be greater than zero"
        );
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current readable sample count.
    #[inline]
    pub fn available(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append samples to the tail, evicting the oldest overflow.
    /// Returns how many samples were evicted.
    pub fn append(&mut self, samples: &[f32]) -> usize {
        if samples.len() >= self.capacity {
            // The incoming batch alone fills the buffer; keep only its tail.
            let dropped = self.data.len() + samples.len() - self.capacity;
            self.data.clear();
            self.data.extend(&samples[samples.len() - self.capacity..]);
            return dropped;
        }

        self.data.extend(samples);
        let overflow = self.data.len().saturating_sub(self.capacity);
        if overflow > 0 {
            self.data.drain(..overflow);
        }
        overflow
    }

    /// Copy the oldest `target.len()` samples into `target` without
    /// consuming them. Returns false when not enough samples are buffered.
    pub fn peek_into(&self, target: &mut [f32]) -> bool {
        let len = target.len();
        if len > self.data.len() {
            return false;
        }

        let (head, tail) = self.data.as_slices();
        if head.len() >= len {
            target.copy_from_slice(&head[..len]);
        } else {
            let split = head.len();
            target[..split].copy_from_slice(head);
            target[split..].copy_from_slice(&tail[..len - split]);
        }
        true
    }

    /// Discard the oldest `count` samples, clamped to what is available.
    pub fn advance(&mut self, count: usize) {
        let count = count.min(self.data.len());
        if count > 0 {
            self.data.drain(..count);
        }
    }

    /// Change the bound, keeping the newest samples when shrinking.
    pub fn set_capacity(&mut self, capacity: usize) {
        assert!(
            capacity > 0,
            "SampleRingBuffer capacity must be greater than zero"
        );
        self.capacity = capacity;
        let overflow = self.data.len().saturating_sub(capacity);
        if overflow > 0 {
            self.data.drain(..overflow);
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(range: std::ops::Range<usize>) -> Vec<f32> {
        range.map(|n| n as f32).collect()
    }

    #[test]
    #[should_panic(expected = "capacity must be greater than zero")]
    fn zero_capacity_panics() {
        let _ = SampleRingBuffer::with_capacity(0);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut buffer = SampleRingBuffer::with_capacity(16);
        for chunk in ramp(0..100).chunks(7) {
            buffer.append(chunk);
            assert!(buffer.available() <= buffer.capacity());
        }
    }

    #[test]
    fn eviction_keeps_the_newest_samples() {
        let mut buffer = SampleRingBuffer::with_capacity(8);
        let dropped = buffer.append(&ramp(0..11));
        assert_eq!(dropped, 3);
        assert_eq!(buffer.available(), 8);

        let mut contents = vec![0.0; 8];
        assert!(buffer.peek_into(&mut contents));
        assert_eq!(contents, ramp(3..11));
    }

    #[test]
    fn eviction_across_multiple_appends() {
        let mut buffer = SampleRingBuffer::with_capacity(8);
        buffer.append(&ramp(0..6));
        let dropped = buffer.append(&ramp(6..12));
        assert_eq!(dropped, 4);

        let mut contents = vec![0.0; 8];
        assert!(buffer.peek_into(&mut contents));
        assert_eq!(contents, ramp(4..12));
    }

    #[test]
    fn peek_reports_starvation_without_mutating() {
        let mut buffer = SampleRingBuffer::with_capacity(16);
        buffer.append(&ramp(0..4));

        let mut frame = vec![0.0; 8];
        assert!(!buffer.peek_into(&mut frame));
        assert_eq!(buffer.available(), 4);
    }

    #[test]
    fn peek_then_advance_walks_overlapping_frames() {
        // frame_size = 8, overlap 0.5 => hop of 4.
        let mut buffer = SampleRingBuffer::with_capacity(64);
        buffer.append(&ramp(0..16));

        let mut frame = vec![0.0; 8];
        assert!(buffer.peek_into(&mut frame));
        assert_eq!(frame, ramp(0..8));
        buffer.advance(4);

        assert!(buffer.peek_into(&mut frame));
        assert_eq!(frame, ramp(4..12));
        buffer.advance(4);

        assert!(buffer.peek_into(&mut frame));
        assert_eq!(frame, ramp(8..16));
        buffer.advance(4);

        assert!(!buffer.peek_into(&mut frame));
    }

    #[test]
    fn advance_clamps_to_available() {
        let mut buffer = SampleRingBuffer::with_capacity(16);
        buffer.append(&ramp(0..5));
        buffer.advance(100);
        assert!(buffer.is_empty());
    }

    #[test]
    fn oversized_append_keeps_the_batch_tail() {
        let mut buffer = SampleRingBuffer::with_capacity(4);
        buffer.append(&ramp(0..2));
        let dropped = buffer.append(&ramp(2..12));
        assert_eq!(dropped, 8);

        let mut contents = vec![0.0; 4];
        assert!(buffer.peek_into(&mut contents));
        assert_eq!(contents, ramp(8..12));
    }

    #[test]
    fn shrinking_capacity_keeps_the_newest_samples() {
        let mut buffer = SampleRingBuffer::with_capacity(16);
        buffer.append(&ramp(0..10));
        buffer.set_capacity(4);

        let mut contents = vec![0.0; 4];
        assert!(buffer.peek_into(&mut contents));
        assert_eq!(contents, ramp(6..10));
    }
}
