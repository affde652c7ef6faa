use circular_queue::CircularQueue;
use std::time::{Duration, Instant};

/// Time between frames when running at `target_fps`.
pub fn frame_period(target_fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / target_fps.max(1) as f64)
}

/// A rolling average of the last few frame times.
pub struct FrameTimer {
    frame_times: CircularQueue<Duration>,
    last_frame: Option<Instant>,
}

impl FrameTimer {
    pub fn new(window: usize) -> Self {
        Self {
            frame_times: CircularQueue::with_capacity(window.max(1)),
            last_frame: None,
        }
    }

    /// Marks the start of a new frame, recording the time since the previous one.
    pub fn tick(&mut self) {
        let now = Instant::now();
        if let Some(last_frame) = self.last_frame {
            self.record(now - last_frame);
        }
        self.last_frame = Some(now);
    }

    pub fn record(&mut self, frame_time: Duration) {
        self.frame_times.push(frame_time);
    }

    /// `None` until a frame with a measurable duration has been recorded.
    pub fn frames_per_second(&self) -> Option<f64> {
        let total: Duration = self.frame_times.iter().sum();
        if total == Duration::from_secs(0) {
            return None;
        }

        Some(self.frame_times.len() as f64 / total.as_secs_f64())
    }
}
