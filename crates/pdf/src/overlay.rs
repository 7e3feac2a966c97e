//! Drawing operations appended on top of a page.

use josamask_core::config::Rgb;
use josamask_core::geometry::Rect;
use lopdf::content::Operation;
use lopdf::Object;

fn color(rgb: Rgb) -> Vec<Object> {
    vec![Object::Real(rgb.0), Object::Real(rgb.1), Object::Real(rgb.2)]
}

fn rect_path(rect: &Rect) -> Operation {
    Operation::new(
        "re",
        vec![
            Object::Real(rect.x0),
            Object::Real(rect.y0),
            Object::Real(rect.width()),
            Object::Real(rect.height()),
        ],
    )
}

/// Opaque fill of one rectangle, in its own graphics state.
pub fn fill_ops(rect: &Rect, fill: Rgb) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", color(fill)),
        rect_path(rect),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Outline of one rectangle.
pub fn stroke_ops(rect: &Rect, stroke: Rgb, width: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("RG", color(stroke)),
        Operation::new("w", vec![Object::Real(width)]),
        rect_path(rect),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_is_isolated() {
        let rect = Rect::new(10.0, 20.0, 30.0, 25.0).unwrap();
        let ops = fill_ops(&rect, Rgb::BLACK);
        assert_eq!(ops.first().map(|o| o.operator.as_str()), Some("q"));
        assert_eq!(ops.last().map(|o| o.operator.as_str()), Some("Q"));
        assert_eq!(
            ops[2].operands,
            vec![Object::Real(10.0), Object::Real(20.0), Object::Real(20.0), Object::Real(5.0)]
        );
    }

    #[test]
    fn test_stroke_uses_color_and_width() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let ops = stroke_ops(&rect, Rgb::RED, 1.8);
        let operators: Vec<&str> = ops.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(operators, vec!["q", "RG", "w", "re", "S", "Q"]);
        assert_eq!(ops[1].operands, vec![Object::Real(1.0), Object::Real(0.0), Object::Real(0.0)]);
    }
}
