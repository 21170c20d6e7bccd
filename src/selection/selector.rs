//! Interactive region-of-interest rectangle.
//!
//! The rectangle lives in display space, relative to the rendered photo. It is
//! moved by dragging its body and resized (height only) by dragging a handle
//! on its bottom edge. Every mutation keeps it inside the photo.

use crate::geometry::{Point, Rectangle};
use crate::selection::state::{ContainerBounds, DragKind, SizeLimits};

/// Pointer gestures understood by the selector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SelectorEvent {
    /// Pointer pressed on the region body.
    BeginMove,
    /// Pointer pressed on the resize handle.
    BeginResize,
    /// Pointer moved to an absolute position (same coordinates as the container origin).
    PointerMoved(Point),
    /// Pointer released or the gesture was cancelled.
    End,
}

/// Region selector state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionSelector {
    rect: Rectangle,
    drag: DragKind,
    container: ContainerBounds,
    limits: SizeLimits,
}

impl RegionSelector {
    /// Creates a selector over `container`, fitting `initial` inside it.
    pub fn new(initial: Rectangle, container: ContainerBounds, limits: SizeLimits) -> Self {
        Self {
            rect: fit_into(initial, &container, &limits),
            drag: DragKind::None,
            container,
            limits,
        }
    }

    pub fn rect(&self) -> Rectangle {
        self.rect
    }

    pub fn drag(&self) -> DragKind {
        self.drag
    }

    pub fn container(&self) -> ContainerBounds {
        self.container
    }

    pub fn limits(&self) -> SizeLimits {
        self.limits
    }

    /// Applies one gesture event and returns the resulting selector.
    pub fn apply(mut self, event: SelectorEvent) -> Self {
        match event {
            SelectorEvent::BeginMove => self.begin_move(),
            SelectorEvent::BeginResize => self.begin_resize(),
            SelectorEvent::PointerMoved(pointer) => match self.drag {
                DragKind::Moving => self.update_move(pointer),
                DragKind::Resizing => self.update_resize(pointer),
                DragKind::None => {}
            },
            SelectorEvent::End => self.end(),
        }
        self
    }

    /// Starts dragging the region body.
    ///
    /// Ignored while the resize handle owns the pointer: the handle sits inside
    /// the body, so its press must not also start a move.
    pub fn begin_move(&mut self) {
        if self.drag != DragKind::Resizing {
            self.drag = DragKind::Moving;
        }
    }

    /// Starts dragging the resize handle.
    pub fn begin_resize(&mut self) {
        self.drag = DragKind::Resizing;
    }

    /// Centers the region on the pointer, clamped to the container.
    pub fn update_move(&mut self, pointer: Point) {
        if self.drag != DragKind::Moving || !pointer.is_finite() {
            return;
        }

        let x = pointer.x - self.container.left - self.rect.width / 2.0;
        let y = pointer.y - self.container.top - self.rect.height / 2.0;
        self.rect.x = clamp_axis(x, self.container.width, self.rect.width);
        self.rect.y = clamp_axis(y, self.container.height, self.rect.height);
    }

    /// Moves the bottom edge to the pointer, within the height limits and the
    /// space left below the region's top edge.
    pub fn update_resize(&mut self, pointer: Point) {
        if self.drag != DragKind::Resizing || !pointer.is_finite() {
            return;
        }

        let requested = pointer.y - self.container.top - self.rect.y;
        let room = self.container.height - self.rect.y;
        self.rect.height = requested
            .min(self.limits.max_height)
            .min(room)
            .max(self.limits.min_height);
    }

    pub fn end(&mut self) {
        self.drag = DragKind::None;
    }

    /// Replaces the container after the photo was re-laid out, re-fitting
    /// the rectangle into the new bounds.
    pub fn set_container(&mut self, container: ContainerBounds) {
        self.container = container;
        self.rect = fit_into(self.rect, &self.container, &self.limits);
    }
}

/// Clamps an origin so that `span` stays within `[0, container_span]`.
///
/// A container smaller than the span pins the origin to 0 and lets the
/// region overhang; the crop step rejects such regions.
fn clamp_axis(origin: f64, container_span: f64, span: f64) -> f64 {
    origin.min(container_span - span).max(0.0)
}

fn fit_into(rect: Rectangle, container: &ContainerBounds, limits: &SizeLimits) -> Rectangle {
    let width = rect.width.min(container.width).max(0.0);
    let height = rect
        .height
        .min(limits.max_height)
        .max(limits.min_height)
        .min(container.height)
        .max(0.0);

    Rectangle {
        x: clamp_axis(rect.x, container.width, width),
        y: clamp_axis(rect.y, container.height, height),
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn selector(rect: Rectangle, width: f64, height: f64) -> RegionSelector {
        RegionSelector::new(rect, ContainerBounds::at_origin(width, height), SizeLimits::default())
    }

    #[test]
    fn test_move_clamps_to_right_edge() {
        let mut sel = selector(Rectangle::new(380.0, 0.0, 40.0, 100.0), 400.0, 600.0);
        // Fitting on creation already pulls x back inside.
        assert_eq!(sel.rect().x, 360.0);

        sel.begin_move();
        // Pointer at 410 centres a 40px wide region at x = 390.
        sel.update_move(Point::new(410.0, 50.0));
        assert_eq!(sel.rect().x, 360.0);
        assert_eq!(sel.rect().y, 0.0);
    }

    #[test]
    fn test_move_is_relative_to_container_origin() {
        let mut sel = RegionSelector::new(
            Rectangle::new(0.0, 0.0, 100.0, 50.0),
            ContainerBounds::new(20.0, 100.0, 400.0, 300.0),
            SizeLimits::default(),
        );
        sel.begin_move();
        sel.update_move(Point::new(220.0, 225.0));
        assert_eq!(sel.rect(), Rectangle::new(150.0, 100.0, 100.0, 50.0));
    }

    #[test]
    fn test_move_clamps_to_top_left() {
        let mut sel = selector(Rectangle::new(100.0, 100.0, 100.0, 50.0), 400.0, 300.0);
        sel.begin_move();
        sel.update_move(Point::new(-500.0, -500.0));
        assert_eq!(sel.rect().x, 0.0);
        assert_eq!(sel.rect().y, 0.0);
    }

    #[test]
    fn test_move_ignored_without_drag() {
        let mut sel = selector(Rectangle::new(0.0, 0.0, 100.0, 50.0), 400.0, 300.0);
        sel.update_move(Point::new(200.0, 200.0));
        assert_eq!(sel.rect().x, 0.0);

        sel.begin_resize();
        sel.update_move(Point::new(200.0, 200.0));
        assert_eq!(sel.rect().x, 0.0);
    }

    #[test]
    fn test_resize_limits() {
        let mut sel = selector(Rectangle::new(0.0, 100.0, 400.0, 120.0), 400.0, 600.0);
        sel.begin_resize();

        sel.update_resize(Point::new(0.0, 110.0));
        assert_eq!(sel.rect().height, 40.0);

        sel.update_resize(Point::new(0.0, 1000.0));
        assert_eq!(sel.rect().height, 200.0);

        sel.update_resize(Point::new(0.0, 250.0));
        assert_eq!(sel.rect().height, 150.0);
        // Width never changes.
        assert_eq!(sel.rect().width, 400.0);
    }

    #[test]
    fn test_resize_stays_inside_container() {
        let mut sel = selector(Rectangle::new(0.0, 250.0, 400.0, 40.0), 400.0, 300.0);
        sel.begin_resize();
        sel.update_resize(Point::new(0.0, 500.0));
        assert_eq!(sel.rect().height, 50.0);
    }

    #[test]
    fn test_resize_wins_over_move() {
        let sel = selector(Rectangle::new(0.0, 0.0, 100.0, 50.0), 400.0, 300.0)
            .apply(SelectorEvent::BeginResize)
            .apply(SelectorEvent::BeginMove);
        assert_eq!(sel.drag(), DragKind::Resizing);

        let sel = sel
            .apply(SelectorEvent::PointerMoved(Point::new(300.0, 90.0)))
            .apply(SelectorEvent::End);
        assert_eq!(sel.drag(), DragKind::None);
        assert_eq!(sel.rect(), Rectangle::new(0.0, 0.0, 100.0, 90.0));
    }

    #[test]
    fn test_non_finite_pointer_ignored() {
        let mut sel = selector(Rectangle::new(10.0, 10.0, 100.0, 50.0), 400.0, 300.0);
        sel.begin_move();
        sel.update_move(Point::new(f64::NAN, 40.0));
        assert_eq!(sel.rect(), Rectangle::new(10.0, 10.0, 100.0, 50.0));
    }

    #[test]
    fn test_default_region_fits_narrow_container() {
        let sel = selector(Rectangle::new(0.0, 0.0, 400.0, 120.0), 320.0, 240.0);
        assert_eq!(sel.rect(), Rectangle::new(0.0, 0.0, 320.0, 120.0));
    }

    #[test]
    fn test_set_container_refits() {
        let mut sel = selector(Rectangle::new(0.0, 400.0, 400.0, 120.0), 400.0, 600.0);
        assert_eq!(sel.rect().y, 400.0);
        sel.set_container(ContainerBounds::at_origin(300.0, 450.0));
        assert_eq!(sel.rect(), Rectangle::new(0.0, 330.0, 300.0, 120.0));
    }

    #[test]
    fn test_tiny_container_degenerates() {
        let sel = selector(Rectangle::new(0.0, 0.0, 400.0, 120.0), 30.0, 20.0);
        assert_eq!(sel.rect().height, 20.0);
        assert!(sel.rect().height < sel.limits().min_height);
    }

    fn event_strategy() -> impl Strategy<Value = SelectorEvent> {
        prop_oneof![
            Just(SelectorEvent::BeginMove),
            Just(SelectorEvent::BeginResize),
            Just(SelectorEvent::End),
            (-500.0f64..2500.0, -500.0f64..2500.0)
                .prop_map(|(x, y)| SelectorEvent::PointerMoved(Point::new(x, y))),
        ]
    }

    proptest! {
        #[test]
        fn prop_region_stays_inside_container(
            width in 50.0f64..1500.0,
            height in 50.0f64..1500.0,
            events in prop::collection::vec(event_strategy(), 0..60),
        ) {
            let mut sel = selector(Rectangle::new(0.0, 0.0, 400.0, 120.0), width, height);
            for event in events {
                sel = sel.apply(event);
                let r = sel.rect();
                prop_assert!(r.x >= 0.0 && r.y >= 0.0);
                prop_assert!(r.right() <= width + EPS);
                prop_assert!(r.bottom() <= height + EPS);
                prop_assert!(r.height >= 40.0 && r.height <= 200.0);
            }
        }
    }
}
