//! Joins rectangles that sit next to each other on one visual line.

use crate::config::MergeTolerance;
use crate::geometry::Rect;
use std::cmp::Ordering;

fn rounded_center_y(rect: &Rect) -> f32 {
    (rect.center_y() * 100.0).round() / 100.0
}

/// Reading order: line (rounded vertical centre) first, then left edge.
/// Remaining coordinates break ties so the order is total.
fn reading_order(a: &Rect, b: &Rect) -> Ordering {
    rounded_center_y(a)
        .total_cmp(&rounded_center_y(b))
        .then(a.x0.total_cmp(&b.x0))
        .then(a.x1.total_cmp(&b.x1))
        .then(a.y0.total_cmp(&b.y0))
        .then(a.y1.total_cmp(&b.y1))
}

fn same_line(a: &Rect, b: &Rect, tolerance: &MergeTolerance) -> bool {
    let avg_height = (a.height() + b.height()) / 2.0;
    (a.center_y() - b.center_y()).abs() <= tolerance.y_ratio * avg_height.max(1.0)
}

fn adjacent(left: &Rect, right: &Rect, tolerance: &MergeTolerance) -> bool {
    right.x0 <= left.x1 + tolerance.x_gap
}

/// Merges same-line neighbours into their union.
///
/// The input is sorted into reading order before a single sweep, so the
/// result does not depend on the order rectangles were produced in.
pub fn merge_rects(mut rects: Vec<Rect>, tolerance: &MergeTolerance) -> Vec<Rect> {
    if rects.is_empty() {
        return rects;
    }
    rects.sort_by(reading_order);

    let mut merged = Vec::with_capacity(rects.len());
    let mut current = rects[0];
    for rect in rects.into_iter().skip(1) {
        if same_line(&current, &rect, tolerance) && adjacent(&current, &rect, tolerance) {
            current = current.union(&rect);
        } else {
            merged.push(current);
            current = rect;
        }
    }
    merged.push(current);
    merged
}
