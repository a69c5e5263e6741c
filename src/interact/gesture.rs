use crate::foundation::core::Point;
use crate::foundation::settings::EngineSettings;
use crate::interact::hit::{hit_handle, topmost_at};
use crate::layer::model::{Layer, LayerId};
use crate::layer::stack::LayerStack;
use crate::render::chrome::Handle;

/// Active pointer gesture. Every variant carries the pre-gesture layer, so each pointer move is
/// computed from the baseline rather than accumulated.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Gesture {
    /// No pointer interaction in progress.
    #[default]
    Idle,
    /// Dragging a layer body.
    Move {
        /// Pointer-down position in canvas units.
        start: Point,
        /// Layer as it was at pointer-down.
        baseline: Layer,
    },
    /// Dragging a corner handle.
    Scale {
        /// Corner that was grabbed.
        handle: Handle,
        /// Pointer-down position in canvas units.
        start: Point,
        /// Layer as it was at pointer-down.
        baseline: Layer,
    },
    /// Dragging the rotation handle.
    Rotate {
        /// Layer as it was at pointer-down.
        baseline: Layer,
    },
}

impl Gesture {
    /// Layer the gesture operates on.
    pub fn layer_id(&self) -> Option<&LayerId> {
        match self {
            Self::Idle => None,
            Self::Move { baseline, .. }
            | Self::Scale { baseline, .. }
            | Self::Rotate { baseline } => Some(baseline.id()),
        }
    }

    fn baseline(&self) -> Option<&Layer> {
        match self {
            Self::Idle => None,
            Self::Move { baseline, .. }
            | Self::Scale { baseline, .. }
            | Self::Rotate { baseline } => Some(baseline),
        }
    }
}

/// Result of a pointer-down.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerDown {
    /// Selection after the press: the grabbed layer, or `None` when the press hit empty canvas.
    pub selection: Option<LayerId>,
}

/// Pointer-driven move / scale / rotate state machine over canvas-space points.
///
/// The controller never mutates the stack itself: moves return the updated layer for the caller
/// to swap in, and pointer-up tells the caller whether to commit a history snapshot.
#[derive(Clone, Debug, Default)]
pub struct TransformController {
    gesture: Gesture,
}

impl TransformController {
    /// Idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current gesture.
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Drop any gesture without committing.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Press at `p`. Handles of the selected layer win; otherwise the topmost hittable layer is
    /// selected and moved; otherwise the selection is cleared.
    pub fn pointer_down(
        &mut self,
        stack: &LayerStack,
        selection: Option<&LayerId>,
        p: Point,
        zoom: f64,
        settings: &EngineSettings,
    ) -> PointerDown {
        if let Some(selected) = selection
            .and_then(|id| stack.get(id))
            .filter(|l| l.is_hittable())
            && let Some(handle) = hit_handle(selected, p, zoom, settings)
        {
            let baseline = selected.clone();
            self.gesture = if handle.is_corner() {
                Gesture::Scale {
                    handle,
                    start: p,
                    baseline,
                }
            } else {
                Gesture::Rotate { baseline }
            };
            return PointerDown {
                selection: Some(selected.id().clone()),
            };
        }

        match topmost_at(stack, p) {
            Some(layer) => {
                self.gesture = Gesture::Move {
                    start: p,
                    baseline: layer.clone(),
                };
                PointerDown {
                    selection: Some(layer.id().clone()),
                }
            }
            None => {
                self.gesture = Gesture::Idle;
                PointerDown { selection: None }
            }
        }
    }

    /// Drag to `p`. Returns the transformed layer, or `None` when idle or when the gestured
    /// layer no longer exists (the gesture is then abandoned).
    pub fn pointer_move(
        &mut self,
        stack: &LayerStack,
        p: Point,
        settings: &EngineSettings,
    ) -> Option<Layer> {
        let id = self.gesture.layer_id()?;
        let Some(current) = stack.get(id) else {
            self.gesture = Gesture::Idle;
            return None;
        };

        let mut next = current.clone();
        match &self.gesture {
            Gesture::Idle => return None,
            Gesture::Move { start, baseline } => {
                let delta = p - *start;
                next.x = baseline.x + delta.x;
                next.y = baseline.y + delta.y;
            }
            Gesture::Rotate { baseline } => {
                let c = baseline.center();
                next.rotation = (p.y - c.y).atan2(p.x - c.x).to_degrees() + 90.0;
            }
            Gesture::Scale {
                start, baseline, ..
            } => {
                let (sx, sy) = scale_for_drag(baseline, *start, p, settings);
                next.scale_x = sx;
                next.scale_y = sy;
            }
        }
        Some(next)
    }

    /// Release. Returns `true` when the gesture left its layer different from the baseline,
    /// i.e. when the caller should commit a history snapshot.
    pub fn pointer_up(&mut self, stack: &LayerStack) -> bool {
        let gesture = std::mem::take(&mut self.gesture);
        let Some(baseline) = gesture.baseline() else {
            return false;
        };
        stack
            .get(baseline.id())
            .is_some_and(|current| current != baseline)
    }
}

/// Uniform scale for a corner drag: the pointer-to-center distance ratio applied to both
/// baseline scales. Signs (flips) are kept and magnitudes never drop below `min_scale`.
pub fn scale_for_drag(
    baseline: &Layer,
    start: Point,
    p: Point,
    settings: &EngineSettings,
) -> (f64, f64) {
    let c = baseline.center();
    let denom = (start - c).hypot().max(settings.scale_pivot_epsilon);
    let mut factor = (p - c).hypot() / denom;

    let smallest = baseline.scale_x.abs().min(baseline.scale_y.abs());
    if smallest > 0.0 {
        factor = factor.max(settings.min_scale / smallest);
    }
    (baseline.scale_x * factor, baseline.scale_y * factor)
}

#[cfg(test)]
#[path = "../../tests/unit/interact/gesture.rs"]
mod tests;
