use crate::types::FaceRect;

pub const FACE_BOX_COLOR: [u8; 4] = [0, 255, 0, 255];
pub const FACE_BOX_THICKNESS: i32 = 2;

/// Largest square centered on the detection, so the drawn box does not
/// wobble with the detector's aspect ratio.
pub fn centered_square(rect: &FaceRect) -> FaceRect {
    let side = rect.width.min(rect.height);
    let cx = rect.x + rect.width / 2;
    let cy = rect.y + rect.height / 2;
    FaceRect::new(cx - side / 2, cy - side / 2, side, side)
}

pub fn draw_face_squares(buffer: &mut [u8], width: u32, height: u32, faces: &[FaceRect]) {
    for face in faces {
        let square = centered_square(face);
        draw_rect_outline(
            buffer,
            width,
            height,
            &square,
            FACE_BOX_COLOR,
            FACE_BOX_THICKNESS,
        );
    }
}

/// Strokes are stacked inwards, so the outline never extends past the
/// square's own corners.
fn draw_rect_outline(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    rect: &FaceRect,
    color: [u8; 4],
    thickness: i32,
) {
    let (x1, y1, x2, y2) = (rect.x, rect.y, rect.right(), rect.bottom());
    for inset in 0..thickness.max(1) {
        let (left, top, right, bottom) = (x1 + inset, y1 + inset, x2 - inset, y2 - inset);
        if left > right || top > bottom {
            break;
        }
        let corners = [(left, top), (right, top), (right, bottom), (left, bottom)];
        for i in 0..corners.len() {
            let from = corners[i];
            let to = corners[(i + 1) % corners.len()];
            draw_line(buffer, width, height, from, to, color);
        }
    }
}

fn draw_line(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    from: (i32, i32),
    to: (i32, i32),
    color: [u8; 4],
) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put_pixel_safe(buffer, width, height, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn put_pixel_safe(buffer: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
        return;
    }
    let idx = (y as usize * width as usize + x as usize) * 4;
    if let Some(px) = buffer.get_mut(idx..idx + 4) {
        px.copy_from_slice(&color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn pixel(buffer: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * width + x) * 4) as usize;
        [buffer[idx], buffer[idx + 1], buffer[idx + 2], buffer[idx + 3]]
    }

    #[test]
    fn wide_rect_becomes_centered_square() {
        let square = centered_square(&FaceRect::new(10, 10, 40, 20));
        assert_eq!(square, FaceRect::new(20, 10, 20, 20));
        assert_eq!((square.right(), square.bottom()), (40, 30));
        assert_eq!(
            (square.x + square.width / 2, square.y + square.height / 2),
            (30, 20)
        );
    }

    #[rstest]
    #[case(FaceRect::new(0, 0, 50, 50), FaceRect::new(0, 0, 50, 50))]
    #[case(FaceRect::new(100, 40, 60, 90), FaceRect::new(100, 55, 60, 60))]
    #[case(FaceRect::new(5, 5, 31, 20), FaceRect::new(10, 5, 20, 20))]
    fn square_side_is_shorter_edge(#[case] rect: FaceRect, #[case] expected: FaceRect) {
        assert_eq!(centered_square(&rect), expected);
    }

    #[test]
    fn outline_is_drawn_without_filling_interior() {
        let (w, h) = (64u32, 48u32);
        let mut buffer = vec![0u8; (w * h * 4) as usize];
        draw_face_squares(&mut buffer, w, h, &[FaceRect::new(10, 10, 40, 20)]);

        assert_eq!(pixel(&buffer, w, 20, 10), FACE_BOX_COLOR);
        assert_eq!(pixel(&buffer, w, 40, 30), FACE_BOX_COLOR);
        assert_eq!(pixel(&buffer, w, 30, 20), [0, 0, 0, 0]);
        assert_eq!(pixel(&buffer, w, 15, 20), [0, 0, 0, 0]);
    }

    #[test]
    fn stroke_stays_inside_the_square() {
        let (w, h) = (64u32, 48u32);
        let mut buffer = vec![0u8; (w * h * 4) as usize];
        draw_face_squares(&mut buffer, w, h, &[FaceRect::new(10, 10, 40, 20)]);

        for (x, y) in [(20, 10), (40, 10), (40, 30), (20, 30), (21, 11), (39, 29)] {
            assert_eq!(pixel(&buffer, w, x, y), FACE_BOX_COLOR, "({x}, {y})");
        }
        for (x, y) in [(19, 10), (41, 30), (40, 31), (41, 31), (19, 9), (22, 12)] {
            assert_eq!(pixel(&buffer, w, x, y), [0, 0, 0, 0], "({x}, {y})");
        }
    }

    #[test]
    fn squares_leaving_the_frame_are_clipped() {
        let (w, h) = (16u32, 16u32);
        let mut buffer = vec![0u8; (w * h * 4) as usize];
        draw_face_squares(&mut buffer, w, h, &[FaceRect::new(-20, -20, 60, 60)]);
        assert_eq!(buffer.len(), (w * h * 4) as usize);
    }
}
