use macroquad::input::{is_key_down, KeyCode};
use chip8_vm::Chip8;

/// QWERTY keys laid out like the hexadecimal keypad, indexed by keypad value
///
/// ```text
/// 1 2 3 C      1 2 3 4
/// 4 5 6 D  <-  Q W E R
/// 7 8 9 E      A S D F
/// A 0 B F      Z X C V
/// ```
const KEY_MAP: [KeyCode; 16] = [
    KeyCode::X,    // 0
    KeyCode::Key1, // 1
    KeyCode::Key2, // 2
    KeyCode::Key3, // 3
    KeyCode::Q,    // 4
    KeyCode::W,    // 5
    KeyCode::E,    // 6
    KeyCode::A,    // 7
    KeyCode::S,    // 8
    KeyCode::D,    // 9
    KeyCode::Z,    // A
    KeyCode::C,    // B
    KeyCode::Key4, // C
    KeyCode::R,    // D
    KeyCode::F,    // E
    KeyCode::V,    // F
];

/// Copies the current keyboard state into the interpreter's keypad
pub fn update_keypad(chip8: &mut Chip8) {
    for (index, key) in KEY_MAP.iter().enumerate() {
        chip8.set_key(index as u8, is_key_down(*key));
    }
}
