use macroquad::color::{BLACK, GREEN};
use macroquad::prelude::{clear_background, draw_rectangle, next_frame, screen_height, screen_width};
use chip8_vm::{FrameBuffer, DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// Draws one rectangle per lit pixel, scaled to the window, and waits for the next frame
pub async fn render_frame(frame_buffer: &FrameBuffer) {
    clear_background(BLACK);

    let pixel_length = screen_width() / DISPLAY_WIDTH as f32;
    let pixel_height = screen_height() / DISPLAY_HEIGHT as f32;

    for y in 0..DISPLAY_HEIGHT {
        for x in 0..DISPLAY_WIDTH {
            if frame_buffer.get_pixel(x, y) {
                draw_rectangle(x as f32 * pixel_length, y as f32 * pixel_height, pixel_length, pixel_height, GREEN);
            }
        }
    }

    next_frame().await;
}
