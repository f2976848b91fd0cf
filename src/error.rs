use thiserror::Error;

/// Fatal faults raised while loading or running a program
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Chip8Error {
    /// CALL executed with all 16 stack slots in use
    #[error("Stack overflow at PC {pc:#05X} (opcode {opcode:04X})")]
    StackOverflow { pc: u16, opcode: u16 },

    /// RET executed with an empty stack
    #[error("Stack underflow at PC {pc:#05X} (opcode {opcode:04X})")]
    StackUnderflow { pc: u16, opcode: u16 },

    /// The program counter ran off the end of memory
    #[error("Cannot fetch opcode at PC {pc:#05X}: beyond the end of memory")]
    OutOfBoundsFetch { pc: u16 },

    /// An instruction addressed memory through I past the last cell
    #[error("Memory access at {address:#06X} out of bounds at PC {pc:#05X} (opcode {opcode:04X})")]
    MemoryOutOfBounds { address: usize, pc: u16, opcode: u16 },

    /// The program does not fit between 0x200 and the end of memory
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
