use std::fmt;

/// Represents the set of Chip-8 instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 0nnn: legacy machine code routine call, ignored
    Sys(u16),
    /// 00E0: clear the screen (i.e. write all pixels as off)
    ClearScreen,
    /// 00EE: return from a subroutine
    Return,
    /// 1nnn: set program counter to the provided address
    Jump(u16),
    /// 2nnn: push the program counter and jump to the provided address
    Call(u16),
    /// 3xkk: skip the next instruction if Vx == kk
    SkipIfEqual(u8, u8),
    /// 4xkk: skip the next instruction if Vx != kk
    SkipIfNotEqual(u8, u8),
    /// 5xy0: skip the next instruction if Vx == Vy
    SkipIfRegistersEqual(u8, u8),
    /// 6xkk: set the variable register x to kk
    SetVariableRegister(u8, u8),
    /// 7xkk: add kk to variable register x without setting the flag
    AddToVariableRegister(u8, u8),
    /// 8xy0
    Copy(u8, u8),
    /// 8xy1
    Or(u8, u8),
    /// 8xy2
    And(u8, u8),
    /// 8xy3
    Xor(u8, u8),
    /// 8xy4: Vx += Vy, VF = carry
    AddRegisters(u8, u8),
    /// 8xy5: Vx -= Vy, VF = not borrow
    Subtract(u8, u8),
    /// 8xy6: Vx >>= 1, VF = bit shifted out
    ShiftRight(u8, u8),
    /// 8xy7: Vx = Vy - Vx, VF = not borrow
    SubtractReversed(u8, u8),
    /// 8xyE: Vx <<= 1, VF = bit shifted out
    ShiftLeft(u8, u8),
    /// 9xy0: skip the next instruction if Vx != Vy
    SkipIfRegistersNotEqual(u8, u8),
    /// Annn: set the index register to nnn
    SetIndexRegister(u16),
    /// Bnnn: jump to nnn + V0
    JumpWithOffset(u16),
    /// Cxkk: Vx = random byte & kk
    Random(u8, u8),
    /// Dxyn: draw an n pixel tall sprite from the memory location in the index register
    /// with horizontal coordinate in variable register x and vertical screen coordinate in
    /// variable register y
    Draw(u8, u8, u8),
    /// Ex9E
    SkipIfKeyPressed(u8),
    /// ExA1
    SkipIfKeyNotPressed(u8),
    /// Fx07
    LoadDelayTimer(u8),
    /// Fx0A: wait for a key press and store the key in Vx
    WaitForKey(u8),
    /// Fx15
    SetDelayTimer(u8),
    /// Fx18
    SetSoundTimer(u8),
    /// Fx1E
    AddToIndexRegister(u8),
    /// Fx29: point I at the font glyph for the low nibble of Vx
    LoadFontGlyph(u8),
    /// Fx33: store the decimal digits of Vx at I, I+1, I+2
    StoreBcd(u8),
    /// Fx55: store V0..=Vx starting at I
    StoreRegisters(u8),
    /// Fx65: load V0..=Vx starting at I
    LoadRegisters(u8),
    /// Anything else; executed as a no-op
    Unknown(u16),
}

/// Represents a 16-bit opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpCode {
    /// Full 16-bit opcode
    opcode: u16,
}

impl OpCode {
    /// Create a new opcode instance from a u16
    pub fn new(opcode: u16) -> Self {
        Self { opcode }
    }

    /// Combine two big-endian bytes into an opcode
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Self::new(u16::from_be_bytes([high, low]))
    }

    pub fn value(&self) -> u16 {
        self.opcode
    }

    /// second-highest nibble of the opcode as u8
    pub fn x(&self) -> u8 {
        ((self.opcode & 0x0F00) >> 8) as u8
    }

    /// third-highest nibble of the opcode as u8
    pub fn y(&self) -> u8 {
        ((self.opcode & 0x00F0) >> 4) as u8
    }

    /// last (lowest) nibble of the opcode as u8
    pub fn n(&self) -> u8 {
        (self.opcode & 0x000F) as u8
    }

    /// lower byte (last two nibbles) of the opcode as u8
    pub fn kk(&self) -> u8 {
        (self.opcode & 0x00FF) as u8
    }

    /// second, third and fourth nibbles of the opcode as u16
    pub fn nnn(&self) -> u16 {
        self.opcode & 0x0FFF
    }

    /// Decodes the opcode as a CHIP-8 instruction
    pub fn as_instruction(&self) -> Instruction {
        let (x, y, n, kk, nnn) = (self.x(), self.y(), self.n(), self.kk(), self.nnn());

        match self.opcode {
            0x00E0 => return Instruction::ClearScreen,
            0x00EE => return Instruction::Return,
            _ => {}
        }

        match self.opcode & 0xF000 {
            0x0000 => Instruction::Sys(nnn),
            0x1000 => Instruction::Jump(nnn),
            0x2000 => Instruction::Call(nnn),
            0x3000 => Instruction::SkipIfEqual(x, kk),
            0x4000 => Instruction::SkipIfNotEqual(x, kk),
            0x5000 if n == 0 => Instruction::SkipIfRegistersEqual(x, y),
            0x6000 => Instruction::SetVariableRegister(x, kk),
            0x7000 => Instruction::AddToVariableRegister(x, kk),
            0x8000 => match n {
                0x0 => Instruction::Copy(x, y),
                0x1 => Instruction::Or(x, y),
                0x2 => Instruction::And(x, y),
                0x3 => Instruction::Xor(x, y),
                0x4 => Instruction::AddRegisters(x, y),
                0x5 => Instruction::Subtract(x, y),
                0x6 => Instruction::ShiftRight(x, y),
                0x7 => Instruction::SubtractReversed(x, y),
                0xE => Instruction::ShiftLeft(x, y),
                _ => Instruction::Unknown(self.opcode),
            },
            0x9000 if n == 0 => Instruction::SkipIfRegistersNotEqual(x, y),
            0xA000 => Instruction::SetIndexRegister(nnn),
            0xB000 => Instruction::JumpWithOffset(nnn),
            0xC000 => Instruction::Random(x, kk),
            0xD000 => Instruction::Draw(x, y, n),
            0xE000 => match kk {
                0x9E => Instruction::SkipIfKeyPressed(x),
                0xA1 => Instruction::SkipIfKeyNotPressed(x),
                _ => Instruction::Unknown(self.opcode),
            },
            0xF000 => match kk {
                0x07 => Instruction::LoadDelayTimer(x),
                0x0A => Instruction::WaitForKey(x),
                0x15 => Instruction::SetDelayTimer(x),
                0x18 => Instruction::SetSoundTimer(x),
                0x1E => Instruction::AddToIndexRegister(x),
                0x29 => Instruction::LoadFontGlyph(x),
                0x33 => Instruction::StoreBcd(x),
                0x55 => Instruction::StoreRegisters(x),
                0x65 => Instruction::LoadRegisters(x),
                _ => Instruction::Unknown(self.opcode),
            },
            _ => Instruction::Unknown(self.opcode),
        }
    }
}

/// Assembly-style mnemonics
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            Sys(addr) => write!(f, "SYS\t0x{addr:03X}"),
            ClearScreen => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump(addr) => write!(f, "JP\t0x{addr:03X}"),
            Call(addr) => write!(f, "CALL\t0x{addr:03X}"),
            SkipIfEqual(x, kk) => write!(f, "SE\tV{x:X}, 0x{kk:02X}"),
            SkipIfNotEqual(x, kk) => write!(f, "SNE\tV{x:X}, 0x{kk:02X}"),
            SkipIfRegistersEqual(x, y) => write!(f, "SE\tV{x:X}, V{y:X}"),
            SetVariableRegister(x, kk) => write!(f, "LD\tV{x:X}, 0x{kk:02X}"),
            AddToVariableRegister(x, kk) => write!(f, "ADD\tV{x:X}, 0x{kk:02X}"),
            Copy(x, y) => write!(f, "LD\tV{x:X}, V{y:X}"),
            Or(x, y) => write!(f, "OR\tV{x:X}, V{y:X}"),
            And(x, y) => write!(f, "AND\tV{x:X}, V{y:X}"),
            Xor(x, y) => write!(f, "XOR\tV{x:X}, V{y:X}"),
            AddRegisters(x, y) => write!(f, "ADD\tV{x:X}, V{y:X}"),
            Subtract(x, y) => write!(f, "SUB\tV{x:X}, V{y:X}"),
            ShiftRight(x, y) => write!(f, "SHR\tV{x:X}, V{y:X}"),
            SubtractReversed(x, y) => write!(f, "SUBN\tV{x:X}, V{y:X}"),
            ShiftLeft(x, y) => write!(f, "SHL\tV{x:X}, V{y:X}"),
            SkipIfRegistersNotEqual(x, y) => write!(f, "SNE\tV{x:X}, V{y:X}"),
            SetIndexRegister(addr) => write!(f, "LD\tI, 0x{addr:03X}"),
            JumpWithOffset(addr) => write!(f, "JP\tV0, 0x{addr:03X}"),
            Random(x, kk) => write!(f, "RND\tV{x:X}, 0x{kk:02X}"),
            Draw(x, y, n) => write!(f, "DRW\tV{x:X}, V{y:X}, 0x{n:X}"),
            SkipIfKeyPressed(x) => write!(f, "SKP\tV{x:X}"),
            SkipIfKeyNotPressed(x) => write!(f, "SKNP\tV{x:X}"),
            LoadDelayTimer(x) => write!(f, "LD\tV{x:X}, DT"),
            WaitForKey(x) => write!(f, "LD\tV{x:X}, K"),
            SetDelayTimer(x) => write!(f, "LD\tDT, V{x:X}"),
            SetSoundTimer(x) => write!(f, "LD\tST, V{x:X}"),
            AddToIndexRegister(x) => write!(f, "ADD\tI, V{x:X}"),
            LoadFontGlyph(x) => write!(f, "LD\tF, V{x:X}"),
            StoreBcd(x) => write!(f, "LD\tB, V{x:X}"),
            StoreRegisters(x) => write!(f, "LD\t[I], V{x:X}"),
            LoadRegisters(x) => write!(f, "LD\tV{x:X}, [I]"),
            Unknown(opcode) => write!(f, "DW\t0x{opcode:04X}"),
        }
    }
}

/// Produces an address/opcode/mnemonic listing of a ROM loaded at `origin`.
///
/// A trailing odd byte is listed as data.
pub fn disassemble(rom: &[u8], origin: u16) -> String {
    let mut listing = String::new();

    for (i, chunk) in rom.chunks(2).enumerate() {
        let address = origin.wrapping_add(2 * i as u16);
        let line = match *chunk {
            [high, low] => {
                let opcode = OpCode::from_bytes(high, low);
                format!("{address:03X}:\t{:04X}\t{}\n", opcode.value(), opcode.as_instruction())
            }
            [byte] => format!("{address:03X}:\t{byte:02X}\tDB\t0x{byte:02X}\n"),
            _ => unreachable!("chunks(2) yields one or two bytes"),
        };
        listing.push_str(&line);
    }

    listing
}
