//! Latest-frame hand-off from the camera producer to a display consumer.
//!
//! The producer must never wait on the consumer: `publish` gives up when
//! the slot is busy and the frame is simply dropped.

use crate::error::MotionError;
use parking_lot::Mutex;

/// One raw image, rows of `width * channels` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap `data` after checking it matches the dimensions.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, MotionError> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(MotionError::InvalidFrame {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the pixel data.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Single-slot buffer holding the most recent frame.
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Option<Frame>>,
}

impl FrameSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored frame unless the slot is busy.
    ///
    /// Returns whether the frame was stored. Contention is not an error.
    pub fn publish(&self, frame: Frame) -> bool {
        match self.latest.try_lock() {
            Some(mut slot) => {
                *slot = Some(frame);
                true
            }
            None => false,
        }
    }

    /// Owned copy of the latest frame. Blocks while a publish is in progress.
    pub fn latest(&self) -> Option<Frame> {
        self.latest.lock().clone()
    }
}
