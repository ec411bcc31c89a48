/// An integer pixel position in image space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An absolute-pixel rectangle. The default value is the empty rectangle,
/// which downstream stages treat as "no region".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// A rectangle in normalized [0,1] coordinates relative to a detector's
/// input image. Anchors and decoded detections both use this form.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle from center point and size.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    /// Midpoint of top-left and bottom-right corners.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_rect_is_empty() {
        assert!(Rect::default().is_empty());
    }

    #[test]
    fn test_zero_width_rect_is_empty() {
        assert!(Rect::new(10, 10, 0, 50).is_empty());
    }

    #[test]
    fn test_negative_size_rect_is_empty() {
        assert!(Rect::new(10, 10, -5, 50).is_empty());
    }

    #[test]
    fn test_positive_rect_is_not_empty() {
        assert!(!Rect::new(-10, -10, 5, 5).is_empty());
    }

    #[test]
    fn test_rectf_from_center_round_trips() {
        let r = RectF::from_center(0.5, 0.25, 0.2, 0.1);
        let (cx, cy) = r.center();
        assert_relative_eq!(cx, 0.5);
        assert_relative_eq!(cy, 0.25);
        assert_relative_eq!(r.x, 0.4);
        assert_relative_eq!(r.y, 0.2);
    }

    #[test]
    fn test_rectf_center_of_unit_anchor() {
        let r = RectF::new(-0.5, -0.5, 1.0, 1.0);
        let (cx, cy) = r.center();
        assert_relative_eq!(cx, 0.0);
        assert_relative_eq!(cy, 0.0);
    }
}
