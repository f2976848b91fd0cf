/// Upper bound on emulation frames run for one elapsed interval; a longer stall (window
/// drag, debugger) is dropped instead of replayed
const MAX_CATCH_UP_FRAMES: u32 = 6;

/// Converts wall-clock time between rendered frames into whole emulation frames at a fixed
/// rate, carrying the remainder over to the next call
#[derive(Debug)]
pub struct FrameClock {
    frame_duration: f32,
    accumulated: f32,
}

impl FrameClock {
    pub fn new(hz: u32) -> Self {
        Self {
            frame_duration: 1.0 / hz as f32,
            accumulated: 0.0,
        }
    }

    /// Adds `elapsed` seconds and returns how many emulation frames are now due
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        self.accumulated += elapsed;

        let mut due = 0;
        while self.accumulated >= self.frame_duration {
            self.accumulated -= self.frame_duration;
            due += 1;
            if due == MAX_CATCH_UP_FRAMES {
                self.accumulated = 0.0;
                break;
            }
        }

        due
    }
}
