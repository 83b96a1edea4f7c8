//! Native window host.
//!
//! Runs a [`Viewer`] inside a winit window. The window is the container:
//! redraw requests are the animation frames, `WaitUntil` drives the timers and
//! window resizes feed the resize listeners. Mouse drag rotates the scene,
//! the wheel zooms, a click without drag selects.
//!
//! Keyboard: `R` resets the view, `W` toggles wireframe, `+`/`-` zoom,
//! `Esc` clears the selection.

use std::sync::Arc;

use anyhow::anyhow;
use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    data_structures::model::ModelData,
    flow::Viewer,
    gpu::WgpuRenderer,
    host::{FrameToken, Host, HostEvent, ListenerId, TimerToken},
    overlay::Overlay,
    renderer::Renderer,
};

/// Pointer travel in pixels after which a press counts as a drag.
const CLICK_SLOP: f32 = 4.0;

#[derive(Default)]
struct WindowHost {
    window: Option<Arc<Window>>,
    size: (u32, u32),
    next_token: u64,
    pending_frame: Option<FrameToken>,
    timers: Vec<(TimerToken, Instant)>,
    resize_listeners: Vec<ListenerId>,
}

impl WindowHost {
    fn token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn take_due_timers(&mut self, now: Instant) -> Vec<TimerToken> {
        let (due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|(_, at)| *at <= now);
        self.timers = pending;
        due.into_iter().map(|(token, _)| token).collect()
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|(_, at)| *at).min()
    }
}

impl Host for WindowHost {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn create_renderer(&mut self, width: u32, height: u32) -> anyhow::Result<Box<dyn Renderer>> {
        let window = self
            .window
            .clone()
            .ok_or_else(|| anyhow!("window not created yet"))?;
        let renderer = futures::executor::block_on(WgpuRenderer::new(window, width, height))?;
        Ok(Box::new(renderer))
    }

    fn clear_surface(&mut self) {
        // the next redraw presents nothing; the window itself stays
        self.pending_frame = None;
    }

    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.token());
        self.pending_frame = Some(token);
        if let Some(window) = &self.window {
            window.request_redraw();
        }
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending_frame == Some(token) {
            self.pending_frame = None;
        }
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerToken {
        let token = TimerToken(self.token());
        self.timers.push((token, Instant::now() + delay));
        token
    }

    fn clear_timeout(&mut self, token: TimerToken) {
        self.timers.retain(|(t, _)| *t != token);
    }

    fn observe_resize(&mut self) -> ListenerId {
        let id = ListenerId(self.token());
        self.resize_listeners.push(id);
        id
    }

    fn unobserve_resize(&mut self, listener: ListenerId) {
        self.resize_listeners.retain(|l| *l != listener);
    }
}

struct App {
    host: WindowHost,
    viewer: Viewer,
    model: Option<ModelData>,
    cursor: (f32, f32),
    press: Option<(f32, f32)>,
    dragged: bool,
    title: String,
}

impl App {
    fn new(model: ModelData, config: ViewerConfig) -> Self {
        Self {
            host: WindowHost::default(),
            viewer: Viewer::new(config),
            model: Some(model),
            cursor: (0.0, 0.0),
            press: None,
            dragged: false,
            title: String::new(),
        }
    }

    fn dispatch(&mut self, event: HostEvent) {
        self.viewer.handle_event(&mut self.host, event);
    }

    fn update_title(&mut self) {
        let title = Overlay::from_viewer(&self.viewer).title();
        if title != self.title {
            if let Some(window) = &self.host.window {
                window.set_title(&format!("ifc-ngin | {}", title));
            }
            self.title = title;
        }
    }

    fn on_key(&mut self, key: &Key) {
        match key {
            Key::Named(NamedKey::Escape) => self.viewer.clear_highlight(),
            Key::Character(c) => match c.as_str() {
                "r" | "R" => self.viewer.reset_view(),
                "w" | "W" => {
                    let enabled = self.viewer.status().wireframe_enabled;
                    self.viewer.set_wireframe(!enabled);
                }
                "+" | "=" => self.viewer.zoom_in(),
                "-" => self.viewer.zoom_out(),
                _ => (),
            },
            _ => (),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.host.window.is_some() {
            return;
        }
        let attributes = Window::default_attributes().with_title("ifc-ngin");
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Unable to create a window: {}", e);
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();
        self.host.size = (size.width, size.height);
        self.host.window = Some(window);

        if let Some(model) = self.model.take() {
            if let Err(e) = self.viewer.load(&mut self.host, model) {
                log::error!("{}", e);
                event_loop.exit();
                return;
            }
        }
        self.update_title();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.viewer.teardown(&mut self.host);
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.host.size = (size.width, size.height);
                for listener in self.host.resize_listeners.clone() {
                    self.dispatch(HostEvent::Resized {
                        listener,
                        width: size.width,
                        height: size.height,
                    });
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(token) = self.host.pending_frame.take() {
                    self.dispatch(HostEvent::Frame(token));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.cursor = (x, y);
                if let Some((px, py)) = self.press {
                    if (x - px).abs() > CLICK_SLOP || (y - py).abs() > CLICK_SLOP {
                        self.dragged = true;
                    }
                }
                self.dispatch(HostEvent::PointerMove { x, y });
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                match state {
                    ElementState::Pressed => {
                        self.press = Some((x, y));
                        self.dragged = false;
                        self.dispatch(HostEvent::PointerDown { x, y });
                    }
                    ElementState::Released => {
                        self.dispatch(HostEvent::PointerUp);
                        if self.press.take().is_some() && !self.dragged {
                            self.dispatch(HostEvent::Click { x, y });
                        }
                    }
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling up as positive
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                self.dispatch(HostEvent::Wheel { delta_y });
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                self.on_key(&event.logical_key);
            }
            _ => (),
        }
        self.update_title();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        for token in self.host.take_due_timers(Instant::now()) {
            self.dispatch(HostEvent::Timeout(token));
        }
        match self.host.next_deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
        self.update_title();
    }
}

/// Open a window and show `model` until the window is closed.
pub fn run(model: ModelData, config: ViewerConfig) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        eprintln!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(model, config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
