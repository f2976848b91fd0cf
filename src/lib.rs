//! A CHIP-8 virtual machine.
//!
//! [`Chip8`] owns a [`Machine`] and drives it one instruction per [`Chip8::tick`]. Rendering,
//! input and ROM loading belong to the caller: read pixels with [`Chip8::get_pixel`], feed
//! keys with [`Chip8::set_key`] and hand program bytes to [`Chip8::load`].

pub mod display;
pub mod engine;
pub mod error;
pub mod opcode;
pub mod state;

pub use display::{FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};
pub use engine::{Chip8, TIMER_HZ};
pub use error::{Chip8Error, Result};
pub use opcode::{disassemble, Instruction, OpCode};
pub use state::{Machine, FONT_START, MAX_ROM_SIZE, MEMORY_SIZE, PROGRAM_START};
