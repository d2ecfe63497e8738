#![allow(dead_code)]

use capscan::PixelBuffer;

pub const BACKGROUND: [u8; 3] = [200, 200, 200];
pub const CAP: [u8; 3] = [40, 40, 40];

/// 在帧上画一个实心圆盘
pub fn paint_disc(buffer: &mut PixelBuffer, cx: u32, cy: u32, r: u32, rgb: [u8; 3]) {
    let r2 = (r * r) as i64;
    for y in cy.saturating_sub(r)..=(cy + r).min(buffer.height() - 1) {
        for x in cx.saturating_sub(r)..=(cx + r).min(buffer.width() - 1) {
            let dx = x as i64 - cx as i64;
            let dy = y as i64 - cy as i64;
            if dx * dx + dy * dy <= r2 {
                buffer.set_rgb(x, y, rgb);
            }
        }
    }
}

/// 640x480 浅色背景上的一组深色圆盘
pub fn frame_with_discs(discs: &[(u32, u32, u32)]) -> PixelBuffer {
    let mut buffer = PixelBuffer::filled(640, 480, BACKGROUND);
    for &(cx, cy, r) in discs {
        paint_disc(&mut buffer, cx, cy, r, CAP);
    }
    buffer
}
