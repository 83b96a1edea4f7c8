//! The seam between the engine and whatever embeds it.
//!
//! A host owns the display surface and the event sources: animation frames,
//! timers, container resize notifications and pointer input. Everything the
//! engine subscribes to is identified by a token, so a session can release
//! exactly what it registered. Events come back into the engine as
//! [`HostEvent`] messages through `Viewer::handle_event`.

use std::time::Duration;

use crate::renderer::Renderer;

/// Pending animation frame request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Registered resize observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

pub trait Host {
    /// Current container size in pixels; either side may be 0 while unmeasured.
    fn surface_size(&self) -> (u32, u32);
    /// Create a renderer bound to the display surface.
    fn create_renderer(&mut self, width: u32, height: u32) -> anyhow::Result<Box<dyn Renderer>>;
    /// Remove everything the engine put into the container.
    fn clear_surface(&mut self);
    /// Ask for one [`HostEvent::Frame`] at the next animation opportunity.
    fn request_frame(&mut self) -> FrameToken;
    fn cancel_frame(&mut self, token: FrameToken);
    /// Ask for one [`HostEvent::Timeout`] after `delay`.
    fn set_timeout(&mut self, delay: Duration) -> TimerToken;
    fn clear_timeout(&mut self, token: TimerToken);
    fn observe_resize(&mut self) -> ListenerId;
    fn unobserve_resize(&mut self, listener: ListenerId);
}

/// Messages from the host to the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostEvent {
    Frame(FrameToken),
    Timeout(TimerToken),
    Resized {
        listener: ListenerId,
        width: u32,
        height: u32,
    },
    PointerDown {
        x: f32,
        y: f32,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp,
    /// Positive when scrolling down; zooms out.
    Wheel {
        delta_y: f32,
    },
    /// A press and release without drag movement in between.
    Click {
        x: f32,
        y: f32,
    },
}
