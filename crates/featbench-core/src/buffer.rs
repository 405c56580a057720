use std::collections::VecDeque;

use crate::keypoint::{DMatch, KeyPoint};

/// Number of frames held in memory at the same time.
pub const DATA_BUFFER_SIZE: usize = 2;

/// One image of the sequence together with everything computed on it.
#[derive(Debug, Clone)]
pub struct Frame<I, D> {
    pub image: I,
    pub keypoints: Vec<KeyPoint>,
    pub descriptors: Option<D>,
    /// Matches against the previous frame.
    pub matches: Vec<DMatch>,
}

impl<I, D> Frame<I, D> {
    pub fn new(image: I) -> Self {
        Self {
            image,
            keypoints: Vec::new(),
            descriptors: None,
            matches: Vec::new(),
        }
    }
}

/// Fixed-capacity ring buffer of the most recent frames, oldest first.
#[derive(Debug, Clone)]
pub struct FrameBuffer<F> {
    frames: VecDeque<F>,
    capacity: usize,
}

impl<F> FrameBuffer<F> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "frame buffer needs room for one frame");
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a frame, evicting and returning the oldest one when full.
    pub fn push(&mut self, frame: F) -> Option<F> {
        let evicted = if self.frames.len() == self.capacity {
            self.frames.pop_front()
        } else {
            None
        };
        self.frames.push_back(frame);
        evicted
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Newest frame.
    pub fn current(&self) -> Option<&F> {
        self.frames.back()
    }

    pub fn current_mut(&mut self) -> Option<&mut F> {
        self.frames.back_mut()
    }

    /// Frame pushed right before the newest one.
    pub fn previous(&self) -> Option<&F> {
        let len = self.frames.len();
        if len < 2 {
            return None;
        }
        self.frames.get(len - 2)
    }

    /// Borrows the previous frame alongside a mutable newest frame.
    pub fn previous_and_current_mut(&mut self) -> Option<(&F, &mut F)> {
        let len = self.frames.len();
        if len < 2 {
            return None;
        }
        let frames = self.frames.make_contiguous();
        let (head, tail) = frames.split_at_mut(len - 1);
        Some((&head[len - 2], &mut tail[0]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.frames.iter()
    }
}
