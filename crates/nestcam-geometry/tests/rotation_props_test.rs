use nestcam_core::Point;
use nestcam_geometry::{Polygon, QuarterTurn};
use proptest::prelude::*;

fn l_shape(w: f64, h: f64, notch: f64) -> Polygon {
    Polygon::from_tuples(&[
        (0.0, 0.0),
        (w, 0.0),
        (w, notch),
        (notch, notch),
        (notch, h),
        (0.0, h),
    ])
}

fn normalized(polygon: &Polygon) -> Polygon {
    let b = polygon.bounds().unwrap();
    polygon.translate(-b.min_x, -b.min_y)
}

fn turn_strategy() -> impl Strategy<Value = QuarterTurn> {
    prop::sample::select(QuarterTurn::ALL.to_vec())
}

proptest! {
    #[test]
    fn rotation_preserves_area_and_swaps_extent(
        w in 10.0f64..400.0,
        h in 10.0f64..400.0,
        ox in -500.0f64..500.0,
        oy in -500.0f64..500.0,
        turn in turn_strategy(),
    ) {
        let notch = w.min(h) / 3.0;
        let original = l_shape(w, h, notch).translate(ox, oy);
        let area = original.area();

        let base = normalized(&original);
        let pivot = base.bounds().unwrap().center();
        let rotated = normalized(&base.rotate_about(pivot, turn));

        prop_assert!((rotated.area() - area).abs() < 1e-6 * area.max(1.0));
        let b = rotated.bounds().unwrap();
        prop_assert!(b.min_x.abs() < 1e-9 && b.min_y.abs() < 1e-9);
        let (ew, eh) = if turn.swaps_axes() { (h, w) } else { (w, h) };
        prop_assert!((b.width() - ew).abs() < 1e-9);
        prop_assert!((b.height() - eh).abs() < 1e-9);
    }

    #[test]
    fn four_quarter_turns_are_identity(x in -100.0f64..100.0, y in -100.0f64..100.0) {
        let pivot = Point::new(3.5, -2.25);
        let mut p = Point::new(x, y);
        for _ in 0..4 {
            p = QuarterTurn::Deg90.rotate_point(p, pivot);
        }
        prop_assert!(p.approx_eq(&Point::new(x, y), 1e-9));
    }
}
