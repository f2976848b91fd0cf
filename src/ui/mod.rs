pub mod frame_clock;
pub mod keypad;
pub mod renderer;
