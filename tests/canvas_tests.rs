use std::sync::Arc;

use glam::Vec2;
use tile_hero::core::{Canvas, DrawOp, GradientAxis, QuadFill};
use tile_hero::texture::Texture;

fn square(min: f32, max: f32) -> [Vec2; 4] {
    [
        Vec2::new(min, min),
        Vec2::new(max, min),
        Vec2::new(max, max),
        Vec2::new(min, max),
    ]
}

#[cfg(test)]
mod canvas_tests {
    use super::*;

    #[test]
    fn test_texture_fill_samples_by_uv() {
        let texture = Texture::from_canvas(
            Canvas::new(2, 1)
                .draw(DrawOp::Pixel { x: 0, y: 0, r: 255, g: 0, b: 0, a: 255 })
                .draw(DrawOp::Pixel { x: 1, y: 0, r: 0, g: 0, b: 255, a: 255 })
                .execute_ops(),
        );
        let canvas = Canvas::new(20, 20)
            .draw(DrawOp::Quad {
                corners: square(0.0, 20.0),
                fill: QuadFill::Texture { texture: Arc::new(texture), tint: 1.0, alpha: 255 },
            })
            .execute_ops();

        assert_eq!(canvas.pixel(2, 10), [255, 0, 0, 255]);
        assert_eq!(canvas.pixel(17, 10), [0, 0, 255, 255]);
    }

    #[test]
    fn test_vertical_gradient_runs_top_to_bottom() {
        let canvas = Canvas::new(10, 10)
            .draw(DrawOp::Quad {
                corners: square(0.0, 10.0),
                fill: QuadFill::Gradient {
                    axis: GradientAxis::Vertical,
                    start: [0, 0, 0, 255],
                    end: [200, 200, 200, 255],
                },
            })
            .execute_ops();

        let column: Vec<u8> = (0..10).map(|y| canvas.pixel(5, y)[0]).collect();
        assert!(column.windows(2).all(|w| w[0] <= w[1]), "{:?}", column);
        assert!(column[0] < 20);
        assert!(column[9] > 180);
    }

    #[test]
    fn test_outline_leaves_interior_untouched() {
        let canvas = Canvas::new(20, 20)
            .draw(DrawOp::Outline {
                corners: square(4.0, 16.0),
                width: 2.0,
                color: [9, 9, 9, 255],
            })
            .execute_ops();

        assert_eq!(canvas.pixel(10, 4), [9, 9, 9, 255]);
        assert_eq!(canvas.pixel(4, 10), [9, 9, 9, 255]);
        assert_eq!(canvas.pixel(10, 10), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_translucent_fill_blends_over_opaque() {
        let canvas = Canvas::new(4, 4)
            .draw(DrawOp::Clear(0, 0, 0, 255))
            .draw(DrawOp::Quad {
                corners: [Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(2.0, 4.0), Vec2::new(0.0, 4.0)],
                fill: QuadFill::Solid([200, 100, 0, 128]),
            })
            .execute_ops();

        let [r, g, b, a] = canvas.pixel(1, 1);
        assert!((99..=101).contains(&r), "{}", r);
        assert!((49..=51).contains(&g), "{}", g);
        assert_eq!((b, a), (0, 255));
        assert_eq!(canvas.pixel(3, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_draw_is_deferred_until_executed() {
        let pending = Canvas::new(2, 2).draw(DrawOp::Clear(1, 2, 3, 255));
        assert_eq!(pending.pending_ops(), 1);
        assert_eq!(pending.pixel(0, 0), [0, 0, 0, 0]);

        let done = pending.execute_ops();
        assert_eq!(done.pending_ops(), 0);
        assert_eq!(done.pixel(1, 1), [1, 2, 3, 255]);
        assert_eq!(done.dimensions(), (2, 2));
    }

    #[test]
    fn test_offscreen_ops_are_clipped() {
        let canvas = Canvas::new(8, 8)
            .draw(DrawOp::FilledCircle { center: Vec2::new(-50.0, -50.0), radius: 10.0, color: [255; 4] })
            .draw(DrawOp::Quad { corners: square(20.0, 30.0), fill: QuadFill::Solid([255; 4]) })
            .draw(DrawOp::Curve {
                from: Vec2::new(-5.0, 100.0),
                control: Vec2::new(50.0, 120.0),
                to: Vec2::new(100.0, 100.0),
                width: 3.0,
                color: [255; 4],
            })
            .execute_ops();
        assert!(canvas.pixels().iter().all(|&c| c == 0));
    }
}
