use crate::foundation::core::{CanvasSize, Point, Size};
use crate::foundation::error::{CanvasError, CanvasResult};

/// Maps pointer positions on the displayed (possibly zoomed) canvas to canvas space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    canvas: CanvasSize,
    displayed: Size,
}

impl Viewport {
    /// Viewport showing `canvas` at zoom 1.
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            displayed: canvas.to_size(),
        }
    }

    /// Canvas being displayed.
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// On-screen size of the canvas in viewport pixels.
    pub fn displayed_size(&self) -> Size {
        self.displayed
    }

    /// Screen pixels per canvas unit (horizontal).
    pub fn zoom(&self) -> f64 {
        self.displayed.width / f64::from(self.canvas.width)
    }

    /// Display the canvas at `zoom` screen pixels per canvas unit.
    pub fn set_zoom(&mut self, zoom: f64) -> CanvasResult<()> {
        if !zoom.is_finite() || zoom <= 0.0 {
            return Err(CanvasError::validation("zoom must be finite and > 0"));
        }
        let base = self.canvas.to_size();
        self.displayed = Size::new(base.width * zoom, base.height * zoom);
        Ok(())
    }

    /// Set the on-screen size directly (e.g. from a layout pass).
    pub fn set_displayed_size(&mut self, size: Size) -> CanvasResult<()> {
        if !(size.width.is_finite() && size.height.is_finite())
            || size.width <= 0.0
            || size.height <= 0.0
        {
            return Err(CanvasError::validation(
                "displayed size must be finite and > 0",
            ));
        }
        self.displayed = size;
        Ok(())
    }

    /// Swap the canvas, keeping the current zoom.
    pub fn set_canvas(&mut self, canvas: CanvasSize) {
        let zoom = self.zoom();
        self.canvas = canvas;
        let base = canvas.to_size();
        self.displayed = Size::new(base.width * zoom, base.height * zoom);
    }

    /// Viewport pixels to canvas units.
    pub fn to_canvas(&self, p: Point) -> Point {
        Point::new(
            p.x * f64::from(self.canvas.width) / self.displayed.width,
            p.y * f64::from(self.canvas.height) / self.displayed.height,
        )
    }

    /// Canvas units to viewport pixels.
    pub fn to_viewport(&self, p: Point) -> Point {
        Point::new(
            p.x * self.displayed.width / f64::from(self.canvas.width),
            p.y * self.displayed.height / f64::from(self.canvas.height),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interact/viewport.rs"]
mod tests;
