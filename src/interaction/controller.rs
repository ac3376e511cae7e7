use crate::foundation::core::{Point, Vec2};
use crate::interaction::region::CaptureRegion;
use crate::transform::model::{OverlayTransform, ScaleLimits, TransformDelta};

/// Input event in host coordinates.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Primary button pressed.
    PointerDown {
        /// Pointer location.
        at: Point,
    },
    /// Pointer moved.
    PointerMove {
        /// Pointer location.
        at: Point,
    },
    /// Primary button released.
    PointerUp,
    /// Pointer left the surface.
    PointerLeave,
    /// Wheel turned; negative `delta_y` scrolls up.
    Wheel {
        /// Pointer location.
        at: Point,
        /// Vertical wheel delta.
        delta_y: f64,
    },
}

/// Drag state of the controller. Scaling is per-event and has no state of its own.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// Pointer is held down on the surface.
    Dragging {
        /// Surface-local pointer position at pointer-down.
        anchor_pointer: Point,
        /// Overlay position at pointer-down.
        anchor_position: Vec2,
    },
}

/// What the host should do with the event after the controller saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventDisposition {
    /// Not ours; the host may route it further.
    PassThrough,
    /// Ours; must not reach any ancestor (no page scroll).
    Consumed,
}

/// Result of handling one event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Response {
    /// Event routing decision.
    pub disposition: EventDisposition,
    /// The transform changed and a render should be enqueued.
    pub changed: bool,
}

impl Response {
    const PASS: Response = Response {
        disposition: EventDisposition::PassThrough,
        changed: false,
    };
    const CONSUMED: Response = Response {
        disposition: EventDisposition::Consumed,
        changed: false,
    };

    fn consumed(changed: bool) -> Self {
        Self {
            disposition: EventDisposition::Consumed,
            changed,
        }
    }
}

/// Turns pointer and wheel events into transform updates.
///
/// The controller never renders. A `changed` response tells the owner to enqueue a render.
#[derive(Clone, Debug)]
pub struct InteractionController {
    state: DragState,
    region: CaptureRegion,
    wheel_step: f64,
    limits: ScaleLimits,
}

impl InteractionController {
    /// Create an idle controller.
    pub fn new(region: CaptureRegion, wheel_step: f64, limits: ScaleLimits) -> Self {
        Self {
            state: DragState::Idle,
            region,
            wheel_step,
            limits,
        }
    }

    /// Current drag state.
    pub fn state(&self) -> DragState {
        self.state
    }

    /// Capture geometry.
    pub fn region(&self) -> &CaptureRegion {
        &self.region
    }

    /// Replace the capture geometry, e.g. after the host relaid out. Ends any drag.
    pub fn set_region(&mut self, region: CaptureRegion) {
        self.region = region;
        self.state = DragState::Idle;
    }

    /// Handle one event. `base_ready` gates drags and wheel scaling.
    pub fn handle(
        &mut self,
        event: InputEvent,
        transform: &mut OverlayTransform,
        base_ready: bool,
    ) -> Response {
        match event {
            InputEvent::PointerDown { at } => {
                let Some(local) = self.region.to_surface(at) else {
                    return Response::PASS;
                };
                if base_ready {
                    self.state = DragState::Dragging {
                        anchor_pointer: local,
                        anchor_position: transform.position,
                    };
                    tracing::debug!(x = local.x, y = local.y, "drag started");
                }
                Response::CONSUMED
            }
            InputEvent::PointerMove { at } => {
                let DragState::Dragging {
                    anchor_pointer,
                    anchor_position,
                } = self.state
                else {
                    return Response::PASS;
                };
                let Some(local) = self.region.to_surface(at) else {
                    self.end_drag("pointer left surface");
                    return Response::CONSUMED;
                };
                let to = anchor_position + (local - anchor_pointer);
                Response::consumed(self.update(transform, TransformDelta::SetPosition { to }))
            }
            InputEvent::PointerUp | InputEvent::PointerLeave => {
                if matches!(self.state, DragState::Dragging { .. }) {
                    self.end_drag("pointer released");
                    Response::CONSUMED
                } else {
                    Response::PASS
                }
            }
            InputEvent::Wheel { at, delta_y } => {
                if !self.region.claims(at) {
                    return Response::PASS;
                }
                if !base_ready
                    || self.region.to_surface(at).is_none()
                    || delta_y == 0.0
                    || !delta_y.is_finite()
                {
                    return Response::CONSUMED;
                }
                let step = if delta_y < 0.0 {
                    self.wheel_step
                } else {
                    -self.wheel_step
                };
                Response::consumed(self.update(transform, TransformDelta::ScaleUniform { step }))
            }
        }
    }

    /// Reset the transform to identity without touching the drag state.
    pub fn reset(&self, transform: &mut OverlayTransform) -> bool {
        let changed = *transform != OverlayTransform::IDENTITY;
        *transform = OverlayTransform::reset();
        changed
    }

    fn update(&self, transform: &mut OverlayTransform, delta: TransformDelta) -> bool {
        let next = transform.apply(delta, self.limits);
        let changed = next != *transform;
        *transform = next;
        changed
    }

    fn end_drag(&mut self, reason: &'static str) {
        self.state = DragState::Idle;
        tracing::debug!(reason, "drag ended");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/interaction/controller.rs"]
mod tests;
