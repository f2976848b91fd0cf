use log::{debug, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::display::FrameBuffer;
use crate::error::{Chip8Error, Result};
use crate::opcode::{Instruction, OpCode};
use crate::state::{Machine, FONT_GLYPH_SIZE, FONT_START, KEY_COUNT};

/// Rate at which the delay and sound timers count down
pub const TIMER_HZ: u32 = 60;

/// Represents a Chip8 interpreter
///
/// One call to [`Chip8::tick`] runs a single fetch/decode/execute cycle and then counts the
/// timers down. While an `Fx0A` instruction waits for input the tick makes no progress, so
/// drivers must keep calling it until a key is pressed.
#[derive(Debug)]
pub struct Chip8 {
    machine: Machine,
    rng: StdRng,
}

impl Default for Chip8 {
    /// Creates a default Chip8 instance
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8 {
    /// Creates a new Chip8 instance with the font loaded and PC at the program start
    pub fn new() -> Self {
        Self {
            machine: Machine::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a Chip8 instance whose random number generator is seeded, making `Cxkk`
    /// reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self {
            machine: Machine::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Restores the power-on state. Memory is wiped, so the ROM has to be loaded again.
    pub fn reset(&mut self) {
        self.machine = Machine::new();
    }

    /// Loads a program at 0x200
    pub fn load(&mut self, rom: &[u8]) -> Result<()> {
        self.machine.load_rom(rom)?;
        info!("Loaded ROM [size: {}]", rom.len());
        Ok(())
    }

    /// Writes the font glyphs at 0x050. [`Chip8::new`] already does this.
    pub fn load_fonts(&mut self) {
        self.machine.load_fonts();
    }

    /// Runs one instruction and counts the timers down once
    pub fn tick(&mut self) -> Result<()> {
        self.step()?;
        self.decrement_timers();
        Ok(())
    }

    /// Runs `cycles` instructions followed by a single timer decrement, for drivers that
    /// execute faster than the 60 Hz timer rate
    pub fn run_frame(&mut self, cycles: u32) -> Result<()> {
        for _ in 0..cycles {
            self.step()?;
        }
        self.decrement_timers();
        Ok(())
    }

    /// Runs one fetch/decode/execute cycle without touching the timers
    pub fn step(&mut self) -> Result<()> {
        let pc = self.machine.program_counter;
        let opcode = self.fetch()?;
        let instruction = opcode.as_instruction();

        debug!("{pc:03X}: {:04X} {instruction}", opcode.value());
        self.execute(instruction, pc, opcode.value())?;
        trace!(
            "V: {:02X?} I: {:03X} SP: {}",
            self.machine.variable_registers,
            self.machine.index_register,
            self.machine.stack_pointer
        );

        Ok(())
    }

    /// Counts both timers down by one, stopping at zero
    pub fn decrement_timers(&mut self) {
        self.machine.delay_timer = self.machine.delay_timer.saturating_sub(1);
        self.machine.sound_timer = self.machine.sound_timer.saturating_sub(1);
    }

    /// Fetch the opcode at the address pointed to by the program counter and advance it
    pub fn fetch(&mut self) -> Result<OpCode> {
        let pc = self.machine.program_counter;
        let bytes = self
            .machine
            .slice(pc as usize, 2)
            .ok_or(Chip8Error::OutOfBoundsFetch { pc })?;
        let opcode = OpCode::from_bytes(bytes[0], bytes[1]);

        self.machine.program_counter = pc + 2;

        Ok(opcode)
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.machine.program_counter = self.machine.program_counter.wrapping_add(2);
        }
    }

    /// Address `offset` bytes past I, checked against the end of memory
    fn index_address(&self, offset: usize, pc: u16, opcode: u16) -> Result<usize> {
        let address = self.machine.index_register as usize + offset;
        if self.machine.read_byte(address).is_none() {
            return Err(Chip8Error::MemoryOutOfBounds { address, pc, opcode });
        }
        Ok(address)
    }

    /// Executes a decoded instruction. `pc` and `opcode` identify the instruction for error
    /// reporting; the program counter has already moved past it.
    fn execute(&mut self, instruction: Instruction, pc: u16, opcode: u16) -> Result<()> {
        let m = &mut self.machine;

        match instruction {
            Instruction::Sys(_) => {}
            Instruction::ClearScreen => m.frame_buffer.clear(),
            Instruction::Return => {
                m.program_counter = m.pop().ok_or(Chip8Error::StackUnderflow { pc, opcode })?;
            }
            Instruction::Jump(address) => m.program_counter = address,
            Instruction::Call(address) => {
                let return_address = m.program_counter;
                m.push(return_address)
                    .ok_or(Chip8Error::StackOverflow { pc, opcode })?;
                m.program_counter = address;
            }
            Instruction::SkipIfEqual(x, kk) => {
                let condition = m.register(x) == kk;
                self.skip_if(condition);
            }
            Instruction::SkipIfNotEqual(x, kk) => {
                let condition = m.register(x) != kk;
                self.skip_if(condition);
            }
            Instruction::SkipIfRegistersEqual(x, y) => {
                let condition = m.register(x) == m.register(y);
                self.skip_if(condition);
            }
            Instruction::SetVariableRegister(x, kk) => *m.register_mut(x) = kk,
            Instruction::AddToVariableRegister(x, kk) => {
                *m.register_mut(x) = m.register(x).wrapping_add(kk);
            }
            Instruction::Copy(x, y) => *m.register_mut(x) = m.register(y),
            Instruction::Or(x, y) => *m.register_mut(x) |= m.register(y),
            Instruction::And(x, y) => *m.register_mut(x) &= m.register(y),
            Instruction::Xor(x, y) => *m.register_mut(x) ^= m.register(y),
            Instruction::AddRegisters(x, y) => {
                let (result, carry) = m.register(x).overflowing_add(m.register(y));
                *m.register_mut(x) = result;
                m.set_flag(carry);
            }
            Instruction::Subtract(x, y) => {
                let (vx, vy) = (m.register(x), m.register(y));
                *m.register_mut(x) = vx.wrapping_sub(vy);
                m.set_flag(vx >= vy);
            }
            Instruction::ShiftRight(x, _) => {
                let vx = m.register(x);
                *m.register_mut(x) = vx >> 1;
                m.set_flag(vx & 0x1 != 0);
            }
            Instruction::SubtractReversed(x, y) => {
                let (vx, vy) = (m.register(x), m.register(y));
                *m.register_mut(x) = vy.wrapping_sub(vx);
                m.set_flag(vy >= vx);
            }
            Instruction::ShiftLeft(x, _) => {
                let vx = m.register(x);
                *m.register_mut(x) = vx << 1;
                m.set_flag(vx & 0x80 != 0);
            }
            Instruction::SkipIfRegistersNotEqual(x, y) => {
                let condition = m.register(x) != m.register(y);
                self.skip_if(condition);
            }
            Instruction::SetIndexRegister(address) => m.index_register = address,
            Instruction::JumpWithOffset(address) => {
                m.program_counter = address + m.register(0x0) as u16;
            }
            Instruction::Random(x, kk) => {
                let byte: u8 = self.rng.random();
                *self.machine.register_mut(x) = byte & kk;
            }
            Instruction::Draw(x, y, n) => {
                let start = self.index_address(0, pc, opcode)?;
                let end = self.machine.index_register as usize + n as usize;
                let m = &mut self.machine;
                let sprite = m.ram.get(start..end).ok_or_else(|| Chip8Error::MemoryOutOfBounds {
                    address: end - 1,
                    pc,
                    opcode,
                })?;

                let vx = m.variable_registers[x as usize] as usize;
                let vy = m.variable_registers[y as usize] as usize;
                let collision = m.frame_buffer.draw_sprite(vx, vy, sprite);
                m.set_flag(collision);
            }
            Instruction::SkipIfKeyPressed(x) => {
                let condition = m.is_key_pressed(m.register(x));
                self.skip_if(condition);
            }
            Instruction::SkipIfKeyNotPressed(x) => {
                let condition = !m.is_key_pressed(m.register(x));
                self.skip_if(condition);
            }
            Instruction::LoadDelayTimer(x) => *m.register_mut(x) = m.delay_timer,
            Instruction::WaitForKey(x) => match m.first_pressed_key() {
                Some(key) => *m.register_mut(x) = key,
                // re-run this instruction on the next tick
                None => m.program_counter = pc,
            },
            Instruction::SetDelayTimer(x) => m.delay_timer = m.register(x),
            Instruction::SetSoundTimer(x) => m.sound_timer = m.register(x),
            Instruction::AddToIndexRegister(x) => {
                m.index_register = m.index_register.wrapping_add(m.register(x) as u16);
            }
            Instruction::LoadFontGlyph(x) => {
                m.index_register = FONT_START + FONT_GLYPH_SIZE * (m.register(x) & 0xF) as u16;
            }
            Instruction::StoreBcd(x) => {
                let value = self.machine.register(x);
                let digits = [value / 100, value / 10 % 10, value % 10];
                let start = self.index_address(0, pc, opcode)?;
                self.index_address(2, pc, opcode)?;
                self.machine.ram[start..start + 3].copy_from_slice(&digits);
            }
            Instruction::StoreRegisters(x) => {
                let start = self.index_address(0, pc, opcode)?;
                self.index_address(x as usize, pc, opcode)?;
                let count = x as usize + 1;
                let m = &mut self.machine;
                m.ram[start..start + count].copy_from_slice(&m.variable_registers[..count]);
            }
            Instruction::LoadRegisters(x) => {
                let start = self.index_address(0, pc, opcode)?;
                self.index_address(x as usize, pc, opcode)?;
                let count = x as usize + 1;
                let m = &mut self.machine;
                m.variable_registers[..count].copy_from_slice(&m.ram[start..start + count]);
            }
            Instruction::Unknown(opcode) => {
                warn!("Ignoring unknown opcode {opcode:04X} at {pc:03X}");
            }
        }

        Ok(())
    }

    /// Whether the pixel at (x, y) is lit; coordinates wrap
    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.machine.frame_buffer.get_pixel(x, y)
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.machine.frame_buffer
    }

    /// Records the pressed state of keypad key `index` (0x0-0xF)
    pub fn set_key(&mut self, index: u8, pressed: bool) {
        match self.machine.keypad.get_mut(index as usize) {
            Some(key) => *key = pressed,
            None => warn!("Ignoring key index {index:#X}, keypad has {KEY_COUNT} keys"),
        }
    }

    pub fn is_key_pressed(&self, index: u8) -> bool {
        self.machine.is_key_pressed(index)
    }

    pub fn delay_timer(&self) -> u8 {
        self.machine.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.machine.sound_timer
    }

    /// Read-only view of the whole machine state
    pub fn machine(&self) -> &Machine {
        &self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MAX_ROM_SIZE, PROGRAM_START, STACK_SIZE};

    /// Builds an interpreter with the given opcodes loaded at 0x200
    fn chip8_with_program(program: &[u16]) -> Chip8 {
        let rom: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
        let mut chip8 = Chip8::with_seed(0);
        chip8.load(&rom).unwrap();
        chip8
    }

    fn run(chip8: &mut Chip8, steps: usize) {
        for _ in 0..steps {
            chip8.step().unwrap();
        }
    }

    #[test]
    fn can_create_new_chip_8() {
        let chip8 = Chip8::new();
        Chip8::default();

        assert_eq!(PROGRAM_START, chip8.machine().program_counter());
        assert_eq!(0xF0, chip8.machine().read_byte(0x050).unwrap());
        assert_eq!(0, chip8.delay_timer());
        assert_eq!(0, chip8.sound_timer());
    }

    #[test]
    fn fetch_reads_big_endian_and_advances_pc() {
        let mut chip8 = chip8_with_program(&[0x1234]);

        assert_eq!(OpCode::new(0x1234), chip8.fetch().unwrap());
        assert_eq!(0x202, chip8.machine.program_counter);
    }

    #[test]
    fn fetch_past_end_of_memory_fails() {
        let mut chip8 = Chip8::new();
        chip8.machine.program_counter = 0xFFF;

        assert_eq!(Err(Chip8Error::OutOfBoundsFetch { pc: 0xFFF }), chip8.fetch());
        assert_eq!(0xFFF, chip8.machine.program_counter);

        chip8.machine.program_counter = 0xFFE;
        assert!(chip8.fetch().is_ok());
    }

    #[test]
    fn load_rejects_oversized_rom() {
        let mut chip8 = Chip8::new();
        assert_eq!(
            Err(Chip8Error::RomTooLarge { size: MAX_ROM_SIZE + 1, max_size: MAX_ROM_SIZE }),
            chip8.load(&vec![0; MAX_ROM_SIZE + 1])
        );
    }

    #[test]
    fn sys_is_a_no_op() {
        let mut chip8 = chip8_with_program(&[0x0123]);
        let before = chip8.machine.clone();
        chip8.step().unwrap();

        assert_eq!(before.variable_registers, chip8.machine.variable_registers);
        assert_eq!(before.ram, chip8.machine.ram);
        assert_eq!(0x202, chip8.machine.program_counter);
    }

    #[test]
    fn unknown_opcode_is_skipped() {
        let mut chip8 = chip8_with_program(&[0xFFFF, 0x6007]);
        run(&mut chip8, 2);

        assert_eq!(0x204, chip8.machine.program_counter);
        assert_eq!(7, chip8.machine.register(0));
    }

    #[test]
    fn clear_screen_blanks_frame_buffer() {
        let mut chip8 = chip8_with_program(&[0x00E0]);
        chip8.machine.frame_buffer.draw_sprite(3, 3, &[0xFF, 0x81, 0xFF]);
        chip8.step().unwrap();

        assert_eq!(&FrameBuffer::new(), chip8.frame_buffer());
    }

    #[test]
    fn call_then_return_restores_pc_and_sp() {
        // 200: CALL 206, 202: LD V0 1, 204: JP 204, 206: RET
        let mut chip8 = chip8_with_program(&[0x2206, 0x6001, 0x1204, 0x00EE]);

        chip8.step().unwrap();
        assert_eq!(0x206, chip8.machine.program_counter);
        assert_eq!(1, chip8.machine.stack_pointer);
        assert_eq!(0x202, chip8.machine.stack[0]);

        chip8.step().unwrap();
        assert_eq!(0x202, chip8.machine.program_counter);
        assert_eq!(0, chip8.machine.stack_pointer);
    }

    #[test]
    fn return_with_empty_stack_underflows() {
        let mut chip8 = chip8_with_program(&[0x00EE]);

        assert_eq!(
            Err(Chip8Error::StackUnderflow { pc: 0x200, opcode: 0x00EE }),
            chip8.step()
        );
    }

    #[test]
    fn call_with_full_stack_overflows() {
        // calls itself forever
        let mut chip8 = chip8_with_program(&[0x2200]);
        run(&mut chip8, STACK_SIZE);
        assert_eq!(16, chip8.machine.stack_pointer);

        assert_eq!(
            Err(Chip8Error::StackOverflow { pc: 0x200, opcode: 0x2200 }),
            chip8.step()
        );
        assert_eq!(16, chip8.machine.stack_pointer);
    }

    #[test]
    fn jump_sets_pc() {
        let mut chip8 = chip8_with_program(&[0x1333]);
        chip8.step().unwrap();
        assert_eq!(0x333, chip8.machine.program_counter);
    }

    #[test]
    fn jump_with_offset_adds_v0() {
        let mut chip8 = chip8_with_program(&[0x60F0, 0xB300]);
        run(&mut chip8, 2);
        assert_eq!(0x3F0, chip8.machine.program_counter);
    }

    #[test]
    fn skip_instructions_compare_against_byte() {
        let mut chip8 = chip8_with_program(&[0x3000, 0xFFFF, 0x3001, 0x4001, 0xFFFF, 0x4000]);

        chip8.step().unwrap();
        assert_eq!(0x204, chip8.machine.program_counter);
        chip8.step().unwrap();
        assert_eq!(0x206, chip8.machine.program_counter);
        chip8.step().unwrap();
        assert_eq!(0x20A, chip8.machine.program_counter);
        chip8.step().unwrap();
        assert_eq!(0x20C, chip8.machine.program_counter);
    }

    #[test]
    fn skip_instructions_compare_registers() {
        let mut chip8 = chip8_with_program(&[0x5120, 0xFFFF, 0x6101, 0x9120, 0xFFFF, 0x5120]);

        chip8.step().unwrap();
        assert_eq!(0x204, chip8.machine.program_counter);
        run(&mut chip8, 2);
        assert_eq!(0x20A, chip8.machine.program_counter);
        chip8.step().unwrap();
        assert_eq!(0x20C, chip8.machine.program_counter);
    }

    #[test]
    fn load_immediate_sets_every_register() {
        for x in 0..16u16 {
            for kk in [0x00, 0x01, 0x7F, 0xFF] {
                let mut chip8 = chip8_with_program(&[0x6000 | x << 8 | kk]);
                chip8.step().unwrap();
                assert_eq!(kk as u8, chip8.machine.register(x as u8));
            }
        }
    }

    #[test]
    fn add_immediate_wraps_without_flag() {
        let mut chip8 = chip8_with_program(&[0x60FF, 0x7002]);
        run(&mut chip8, 2);

        assert_eq!(0x01, chip8.machine.register(0));
        assert_eq!(0, chip8.machine.register(0xF));
    }

    #[test]
    fn logic_instructions() {
        let mut chip8 = chip8_with_program(&[0x8120, 0x8131, 0x8142, 0x8153]);
        chip8.machine.variable_registers[2] = 0b1100;
        chip8.machine.variable_registers[3] = 0b0011;
        chip8.machine.variable_registers[4] = 0b1010;
        chip8.machine.variable_registers[5] = 0b0110;

        chip8.step().unwrap();
        assert_eq!(0b1100, chip8.machine.register(1));
        chip8.step().unwrap();
        assert_eq!(0b1111, chip8.machine.register(1));
        chip8.step().unwrap();
        assert_eq!(0b1010, chip8.machine.register(1));
        chip8.step().unwrap();
        assert_eq!(0b1100, chip8.machine.register(1));
    }

    #[test]
    fn add_registers_sets_carry() {
        let mut chip8 = chip8_with_program(&[0x8014, 0x8014]);
        chip8.machine.variable_registers[0] = 0xFF;
        chip8.machine.variable_registers[1] = 0xFF;

        chip8.step().unwrap();
        assert_eq!(0xFE, chip8.machine.register(0));
        assert_eq!(1, chip8.machine.register(0xF));

        chip8.machine.variable_registers[0] = 0x01;
        chip8.step().unwrap();
        assert_eq!(0x00, chip8.machine.register(0));
        assert_eq!(1, chip8.machine.register(0xF));
    }

    #[test]
    fn add_registers_clears_carry_without_overflow() {
        let mut chip8 = chip8_with_program(&[0x8014]);
        chip8.machine.variable_registers[0] = 0x10;
        chip8.machine.variable_registers[1] = 0x20;
        chip8.machine.variable_registers[0xF] = 0x55;
        chip8.step().unwrap();

        assert_eq!(0x30, chip8.machine.register(0));
        assert_eq!(0, chip8.machine.register(0xF));
    }

    #[test]
    fn subtract_sets_no_borrow_flag() {
        let mut chip8 = chip8_with_program(&[0x8015, 0x8015]);
        chip8.machine.variable_registers[0] = 0x01;
        chip8.machine.variable_registers[1] = 0x01;

        chip8.step().unwrap();
        assert_eq!(0x00, chip8.machine.register(0));
        assert_eq!(1, chip8.machine.register(0xF));

        chip8.step().unwrap();
        assert_eq!(0xFF, chip8.machine.register(0));
        assert_eq!(0, chip8.machine.register(0xF));
    }

    #[test]
    fn subtract_reversed_uses_vy_minus_vx() {
        let mut chip8 = chip8_with_program(&[0x8017, 0x8017]);
        chip8.machine.variable_registers[0] = 0x03;
        chip8.machine.variable_registers[1] = 0x05;

        chip8.step().unwrap();
        assert_eq!(0x02, chip8.machine.register(0));
        assert_eq!(1, chip8.machine.register(0xF));

        chip8.machine.variable_registers[0] = 0x06;
        chip8.step().unwrap();
        assert_eq!(0xFF, chip8.machine.register(0));
        assert_eq!(0, chip8.machine.register(0xF));
    }

    #[test]
    fn shifts_operate_on_vx_and_flag_the_lost_bit() {
        let mut chip8 = chip8_with_program(&[0x8016, 0x802E, 0x8016]);
        chip8.machine.variable_registers[0] = 0b1000_0011;
        chip8.machine.variable_registers[1] = 0xAA;

        chip8.step().unwrap();
        assert_eq!(0b0100_0001, chip8.machine.register(0));
        assert_eq!(1, chip8.machine.register(0xF));

        chip8.machine.variable_registers[0] = 0b1000_0010;
        chip8.step().unwrap();
        assert_eq!(0b0000_0100, chip8.machine.register(0));
        assert_eq!(1, chip8.machine.register(0xF));

        chip8.step().unwrap();
        assert_eq!(0b0000_0010, chip8.machine.register(0));
        assert_eq!(0, chip8.machine.register(0xF));
        assert_eq!(0xAA, chip8.machine.register(1));
    }

    #[test]
    fn flag_wins_when_vf_is_the_destination() {
        let mut chip8 = chip8_with_program(&[0x8F14]);
        chip8.machine.variable_registers[0xF] = 0xFF;
        chip8.machine.variable_registers[1] = 0x02;
        chip8.step().unwrap();

        assert_eq!(1, chip8.machine.register(0xF));
    }

    #[test]
    fn set_index_register() {
        let mut chip8 = chip8_with_program(&[0xA234]);
        chip8.step().unwrap();
        assert_eq!(0x234, chip8.machine.index_register);
    }

    #[test]
    fn random_is_masked_by_kk() {
        let mut chip8 = chip8_with_program(&[0xC00F, 0xC100]);
        run(&mut chip8, 2);

        assert_eq!(0, chip8.machine.register(0) & 0xF0);
        assert_eq!(0, chip8.machine.register(1));
    }

    #[test]
    fn random_is_reproducible_with_seed() {
        let mut a = chip8_with_program(&[0xC0FF, 0xC1FF]);
        let mut b = chip8_with_program(&[0xC0FF, 0xC1FF]);
        run(&mut a, 2);
        run(&mut b, 2);

        assert_eq!(a.machine.variable_registers, b.machine.variable_registers);
    }

    #[test]
    fn draw_sprite_twice_erases_and_collides() {
        // I = font glyph 0, draw it twice at (V0, V1)
        let mut chip8 = chip8_with_program(&[0x6002, 0x6103, 0xA050, 0xD015, 0xD015]);
        run(&mut chip8, 4);

        assert_eq!(0, chip8.machine.register(0xF));
        assert!(chip8.get_pixel(2, 3));
        assert!(chip8.get_pixel(5, 3));
        assert!(!chip8.get_pixel(3, 4));

        chip8.step().unwrap();
        assert_eq!(1, chip8.machine.register(0xF));
        assert_eq!(&FrameBuffer::new(), chip8.frame_buffer());
    }

    #[test]
    fn draw_wraps_start_position() {
        let mut chip8 = chip8_with_program(&[0x6042, 0x6121, 0xA300, 0xD011]);
        chip8.machine.ram[0x300] = 0x80;
        run(&mut chip8, 4);

        assert!(chip8.get_pixel(2, 1));
    }

    #[test]
    fn draw_past_end_of_memory_fails() {
        let mut chip8 = chip8_with_program(&[0xAFFE, 0xD013]);
        chip8.step().unwrap();

        assert_eq!(
            Err(Chip8Error::MemoryOutOfBounds { address: 0x1000, pc: 0x202, opcode: 0xD013 }),
            chip8.step()
        );
    }

    #[test]
    fn draw_ending_at_last_memory_cell_succeeds() {
        let mut chip8 = chip8_with_program(&[0xAFFF, 0xD011]);
        chip8.machine.ram[0xFFF] = 0x80;
        run(&mut chip8, 2);

        assert_eq!(0, chip8.machine.register(0xF));
        assert!(chip8.get_pixel(0, 0));
    }

    #[test]
    fn zero_height_draw_clears_flag() {
        let mut chip8 = chip8_with_program(&[0xA300, 0xD010]);
        chip8.machine.variable_registers[0xF] = 1;
        run(&mut chip8, 2);

        assert_eq!(0, chip8.machine.register(0xF));
        assert_eq!(&FrameBuffer::new(), chip8.frame_buffer());
    }

    #[test]
    fn key_skips_follow_keypad() {
        let mut chip8 = chip8_with_program(&[0xE09E, 0xE0A1, 0xFFFF, 0xE09E, 0xFFFF, 0xE0A1]);
        chip8.machine.variable_registers[0] = 0xA;

        chip8.step().unwrap();
        assert_eq!(0x202, chip8.machine.program_counter);
        chip8.step().unwrap();
        assert_eq!(0x206, chip8.machine.program_counter);

        chip8.set_key(0xA, true);
        chip8.step().unwrap();
        assert_eq!(0x20A, chip8.machine.program_counter);
        chip8.step().unwrap();
        assert_eq!(0x20C, chip8.machine.program_counter);
    }

    #[test]
    fn set_key_ignores_out_of_range_index() {
        let mut chip8 = Chip8::new();
        chip8.set_key(0x10, true);
        chip8.set_key(0x3, true);

        assert_eq!([false, false, false, true], chip8.machine.keypad[..4]);
        assert!(chip8.machine.keypad[4..].iter().all(|pressed| !pressed));
        assert!(chip8.is_key_pressed(0x3));
    }

    #[test]
    fn wait_for_key_spins_until_pressed() {
        let mut chip8 = chip8_with_program(&[0xF30A, 0x6001]);

        for _ in 0..3 {
            chip8.tick().unwrap();
            assert_eq!(0x200, chip8.machine.program_counter);
        }

        chip8.set_key(0x7, true);
        chip8.set_key(0xC, true);
        chip8.tick().unwrap();
        assert_eq!(0x202, chip8.machine.program_counter);
        assert_eq!(0x7, chip8.machine.register(3));
        assert!(chip8.is_key_pressed(0x7));
    }

    #[test]
    fn timer_registers() {
        let mut chip8 = chip8_with_program(&[0x6042, 0xF015, 0xF018, 0xF107]);
        run(&mut chip8, 3);
        assert_eq!(0x42, chip8.delay_timer());
        assert_eq!(0x42, chip8.sound_timer());

        chip8.tick().unwrap();
        assert_eq!(0x42, chip8.machine.register(1));
        assert_eq!(0x41, chip8.delay_timer());
        assert_eq!(0x41, chip8.sound_timer());
    }

    #[test]
    fn timers_stop_at_zero() {
        let mut chip8 = Chip8::new();
        chip8.machine.delay_timer = 1;
        chip8.decrement_timers();
        chip8.decrement_timers();

        assert_eq!(0, chip8.delay_timer());
        assert_eq!(0, chip8.sound_timer());
    }

    #[test]
    fn run_frame_decrements_timers_once() {
        let mut chip8 = chip8_with_program(&[0x6000, 0x6000, 0x6000, 0x6000]);
        chip8.machine.delay_timer = 10;
        chip8.run_frame(4).unwrap();

        assert_eq!(0x208, chip8.machine.program_counter);
        assert_eq!(9, chip8.delay_timer());
    }

    #[test]
    fn add_to_index_register_wraps_without_flag() {
        let mut chip8 = chip8_with_program(&[0x60FF, 0xAFFF, 0xF01E]);
        run(&mut chip8, 3);

        assert_eq!(0x10FE, chip8.machine.index_register);
        assert_eq!(0, chip8.machine.register(0xF));
    }

    #[test]
    fn font_glyph_address_uses_low_nibble() {
        let mut chip8 = chip8_with_program(&[0x600A, 0xF029, 0x601B, 0xF029]);

        run(&mut chip8, 2);
        assert_eq!(0x050 + 5 * 0xA, chip8.machine.index_register);
        run(&mut chip8, 2);
        assert_eq!(0x050 + 5 * 0xB, chip8.machine.index_register);
    }

    #[test]
    fn store_bcd_writes_decimal_digits() {
        let mut chip8 = chip8_with_program(&[0x60ED, 0xA300, 0xF033]);
        run(&mut chip8, 3);

        assert_eq!([2, 3, 7], chip8.machine.ram[0x300..0x303]);
    }

    #[test]
    fn store_bcd_past_end_of_memory_fails() {
        let mut chip8 = chip8_with_program(&[0xAFFE, 0xF033]);
        chip8.step().unwrap();

        assert_eq!(
            Err(Chip8Error::MemoryOutOfBounds { address: 0x1000, pc: 0x202, opcode: 0xF033 }),
            chip8.step()
        );
        assert_eq!(0, chip8.machine.ram[0xFFE]);
    }

    #[test]
    fn store_and_load_registers_through_index() {
        let mut chip8 = chip8_with_program(&[0xA300, 0xF255, 0xA400, 0xF165]);
        chip8.machine.variable_registers[..4].copy_from_slice(&[1, 2, 3, 4]);
        chip8.machine.ram[0x400..0x402].copy_from_slice(&[9, 8]);
        run(&mut chip8, 2);

        assert_eq!([1, 2, 3, 0], chip8.machine.ram[0x300..0x304]);
        assert_eq!(0x300, chip8.machine.index_register);

        run(&mut chip8, 2);
        assert_eq!([9, 8, 3, 4], chip8.machine.variable_registers[..4]);
    }

    #[test]
    fn store_registers_past_end_of_memory_fails() {
        let mut chip8 = chip8_with_program(&[0xAFFE, 0xF255]);
        chip8.machine.variable_registers[..3].copy_from_slice(&[7, 8, 9]);
        chip8.step().unwrap();

        assert_eq!(
            Err(Chip8Error::MemoryOutOfBounds { address: 0x1000, pc: 0x202, opcode: 0xF255 }),
            chip8.step()
        );
        assert_eq!([0, 0], chip8.machine.ram[0xFFE..]);
    }

    #[test]
    fn load_registers_past_end_of_memory_fails() {
        let mut chip8 = chip8_with_program(&[0xAFFF, 0xF165]);
        chip8.step().unwrap();

        assert_eq!(
            Err(Chip8Error::MemoryOutOfBounds { address: 0x1000, pc: 0x202, opcode: 0xF165 }),
            chip8.step()
        );
    }

    #[test]
    fn bcd_program_end_to_end() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x60, 0x05, 0xA0, 0x00, 0xF0, 0x33, 0xF2, 0x65]).unwrap();
        for _ in 0..3 {
            chip8.tick().unwrap();
        }
        assert_eq!(0x05, chip8.machine.register(0));
        assert_eq!(Some(&[0, 0, 5][..]), chip8.machine.slice(0, 3));

        // F265 reads the digits back into V0..=V2
        chip8.tick().unwrap();
        assert_eq!([0, 0, 5], chip8.machine.variable_registers[..3]);
        assert_eq!(Some(&[0, 0, 5][..]), chip8.machine.slice(0, 3));
        assert_eq!(0x208, chip8.machine.program_counter);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut chip8 = chip8_with_program(&[0x6005, 0x1200]);
        run(&mut chip8, 2);
        chip8.reset();

        assert_eq!(0x200, chip8.machine.program_counter);
        assert_eq!(0, chip8.machine.register(0));
        assert_eq!(0, chip8.machine.ram[0x200]);
    }
}
