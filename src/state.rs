use crate::display::FrameBuffer;
use crate::error::{Chip8Error, Result};

/// Total addressable memory in bytes
pub const MEMORY_SIZE: usize = 4096;

/// Address programs are loaded at and where execution starts
pub const PROGRAM_START: u16 = 0x200;

/// Address of the first font glyph
pub const FONT_START: u16 = 0x050;

/// Largest ROM accepted by [`Machine::load_rom`]
pub const MAX_ROM_SIZE: usize = 0xFFF - PROGRAM_START as usize;

/// Number of return addresses the stack can hold
pub const STACK_SIZE: usize = 16;

/// Number of keys on the hexadecimal keypad
pub const KEY_COUNT: usize = 16;

/// Bytes per font glyph
pub const FONT_GLYPH_SIZE: u16 = 5;

/// The font sprite data consisting of hexadecimal numbers 0-F
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// All mutable state of the virtual machine
#[derive(Debug, Clone)]
pub struct Machine {
    /// 4096 bytes of memory
    pub(crate) ram: [u8; MEMORY_SIZE],
    /// frame buffer for drawing screen
    pub(crate) frame_buffer: FrameBuffer,
    /// A stack of 16 2-byte addresses
    pub(crate) stack: [u16; STACK_SIZE],
    /// Number of stack entries in use
    pub(crate) stack_pointer: u8,
    /// A delay timer register
    pub(crate) delay_timer: u8,
    /// A sound timer register
    pub(crate) sound_timer: u8,
    /// The program counter
    pub(crate) program_counter: u16,
    /// An index register
    pub(crate) index_register: u16,
    /// 16 8-bit variable registers, VF doubles as the flag register
    pub(crate) variable_registers: [u8; 16],
    /// Pressed state of each keypad key
    pub(crate) keypad: [bool; KEY_COUNT],
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Creates a machine in its power-on state with the font loaded
    pub fn new() -> Self {
        let mut machine = Self {
            ram: [0; MEMORY_SIZE],
            frame_buffer: FrameBuffer::new(),
            stack: [0; STACK_SIZE],
            stack_pointer: 0,
            delay_timer: 0,
            sound_timer: 0,
            program_counter: PROGRAM_START,
            index_register: 0,
            variable_registers: [0; 16],
            keypad: [false; KEY_COUNT],
        };

        machine.load_fonts();

        machine
    }

    /// Writes the hexadecimal font glyphs at [`FONT_START`]
    pub fn load_fonts(&mut self) {
        let start = FONT_START as usize;
        self.ram[start..start + FONT.len()].copy_from_slice(&FONT);
    }

    /// Copies a program into memory at [`PROGRAM_START`]
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            });
        }

        let start = PROGRAM_START as usize;
        self.ram[start..start + rom.len()].copy_from_slice(rom);

        Ok(())
    }

    /// Reads V0-VF; only the low nibble of the index is used
    pub fn register(&self, register_index: u8) -> u8 {
        self.variable_registers[(register_index & 0xF) as usize]
    }

    pub fn register_mut(&mut self, register_index: u8) -> &mut u8 {
        &mut self.variable_registers[(register_index & 0xF) as usize]
    }

    /// Writes VF
    pub fn set_flag(&mut self, flag: bool) {
        *self.register_mut(0xF) = flag as u8;
    }

    /// Pushes a return address, `None` when the stack is full
    pub fn push(&mut self, address: u16) -> Option<()> {
        let slot = self.stack.get_mut(self.stack_pointer as usize)?;
        *slot = address;
        self.stack_pointer += 1;
        Some(())
    }

    /// Pops a return address, `None` when the stack is empty
    pub fn pop(&mut self) -> Option<u16> {
        self.stack_pointer = self.stack_pointer.checked_sub(1)?;
        Some(self.stack[self.stack_pointer as usize])
    }

    pub fn read_byte(&self, address: usize) -> Option<u8> {
        self.ram.get(address).copied()
    }

    pub fn write_byte(&mut self, address: usize, value: u8) -> Option<()> {
        *self.ram.get_mut(address)? = value;
        Some(())
    }

    /// Borrows `len` bytes of memory starting at `address`
    pub fn slice(&self, address: usize, len: usize) -> Option<&[u8]> {
        self.ram.get(address..address.checked_add(len)?)
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn index_register(&self) -> u16 {
        self.index_register
    }

    pub fn stack_pointer(&self) -> u8 {
        self.stack_pointer
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    pub fn is_key_pressed(&self, key: u8) -> bool {
        self.keypad[(key & 0xF) as usize]
    }

    /// Lowest numbered key currently held down
    pub fn first_pressed_key(&self) -> Option<u8> {
        self.keypad.iter().position(|&pressed| pressed).map(|key| key as u8)
    }
}
