//! Fixed-capacity sliding window of processed frames.

use crate::defaults::WINDOW_FRAMES;
use crate::video::ProcessedFrame;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Holds the most recent `capacity` frames, oldest first.
///
/// Shared between the preprocessing thread (writer) and the inference thread
/// (reader). Readers take a [`snapshot`](Self::snapshot) so a concurrent push
/// never changes the window an inference is working on.
#[derive(Debug)]
pub struct FrameBuffer {
    capacity: usize,
    frames: Mutex<VecDeque<Arc<ProcessedFrame>>>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(WINDOW_FRAMES)
    }
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    fn frames(&self) -> MutexGuard<'_, VecDeque<Arc<ProcessedFrame>>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a frame, evicting the oldest when at capacity.
    pub fn push(&self, frame: ProcessedFrame) {
        self.push_shared(Arc::new(frame));
    }

    pub fn push_shared(&self, frame: Arc<ProcessedFrame>) {
        let mut frames = self.frames();
        if frames.len() == self.capacity {
            frames.pop_front();
        }
        frames.push_back(frame);
    }

    /// Ordered copy of the current window, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<ProcessedFrame>> {
        self.frames().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.frames().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// Fill level in `[0.0, 1.0]`.
    pub fn fill_ratio(&self) -> f32 {
        self.len() as f32 / self.capacity as f32
    }

    /// Fill level as a whole percentage, rounded half up.
    pub fn fill_percent(&self) -> u8 {
        let len = self.len();
        ((len * 200 + self.capacity) / (self.capacity * 2)) as u8
    }

    pub fn clear(&self) {
        self.frames().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(value: f32) -> ProcessedFrame {
        ProcessedFrame::filled(value)
    }

    fn first_values(buffer: &FrameBuffer) -> Vec<f32> {
        buffer.snapshot().iter().map(|f| f.as_slice()[0]).collect()
    }

    #[test]
    fn starts_empty() {
        let buffer = FrameBuffer::default();
        assert_eq!(buffer.capacity(), 64);
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
        assert_eq!(buffer.fill_percent(), 0);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let buffer = FrameBuffer::new(3);
        for i in 0..5 {
            buffer.push(frame(i as f32));
        }
        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_full());
        assert_eq!(first_values(&buffer), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn default_window_drops_first_frame_on_65th_push() {
        let buffer = FrameBuffer::default();
        for tag in 0..=64 {
            buffer.push(frame(tag as f32));
        }
        let expected: Vec<f32> = (1..=64).map(|tag| tag as f32).collect();
        assert_eq!(buffer.len(), 64);
        assert_eq!(first_values(&buffer), expected);
    }

    #[test]
    fn fill_percent_rounds() {
        let buffer = FrameBuffer::default();
        for _ in 0..32 {
            buffer.push(frame(0.0));
        }
        assert_eq!(buffer.fill_percent(), 50);
        assert!((buffer.fill_ratio() - 0.5).abs() < f32::EPSILON);

        // 1/64 = 1.5625% -> 2, 33/64 = 51.5625% -> 52
        let buffer = FrameBuffer::default();
        buffer.push(frame(0.0));
        assert_eq!(buffer.fill_percent(), 2);
        for _ in 0..32 {
            buffer.push(frame(0.0));
        }
        assert_eq!(buffer.fill_percent(), 52);
    }

    #[test]
    fn fill_percent_at_capacity_is_100() {
        let buffer = FrameBuffer::new(3);
        for _ in 0..10 {
            buffer.push(frame(0.0));
        }
        assert_eq!(buffer.fill_percent(), 100);
    }

    #[test]
    fn snapshot_is_isolated_from_later_pushes() {
        let buffer = FrameBuffer::new(2);
        buffer.push(frame(1.0));
        buffer.push(frame(2.0));
        let snapshot = buffer.snapshot();
        buffer.push(frame(3.0));

        let values: Vec<f32> = snapshot.iter().map(|f| f.as_slice()[0]).collect();
        assert_eq!(values, vec![1.0, 2.0]);
        assert_eq!(first_values(&buffer), vec![2.0, 3.0]);
    }

    #[test]
    fn clear_empties() {
        let buffer = FrameBuffer::new(4);
        buffer.push(frame(1.0));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.fill_percent(), 0);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let buffer = FrameBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
    }

    #[test]
    fn concurrent_push_and_snapshot() {
        let buffer = Arc::new(FrameBuffer::new(8));
        let writer = {
            let buffer = buffer.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    buffer.push(frame(i as f32));
                }
            })
        };
        for _ in 0..100 {
            let values: Vec<f32> = buffer.snapshot().iter().map(|f| f.as_slice()[0]).collect();
            assert!(values.len() <= 8);
            assert!(values.windows(2).all(|w| w[1] == w[0] + 1.0));
        }
        writer.join().unwrap();
        assert_eq!(first_values(&buffer).last(), Some(&499.0));
    }
}
