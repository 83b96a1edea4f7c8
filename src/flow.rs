//! Scene lifecycle and the viewer's published state.
//!
//! A [`Viewer`] owns at most one scene session at a time. A session is
//! everything created for one model: camera, renderer, lighting, orientation
//! aids, the resource caches, the placed elements, the render loop and the
//! resize subscription. Sessions are built and torn down as a whole; there is
//! no incremental add or remove of elements.
//!
//! # Lifecycle
//!
//! `load` tears down the current session, then initialises a new one in this
//! order:
//! 1. camera, sized to the container
//! 2. renderer bound to the host surface
//! 3. ambient and directional light
//! 4. ground grid and axes
//! 5. element placement, publishing progress per element
//! 6. render loop start
//! 7. resize subscription
//!
//! If the container has no measurable size yet, initialisation is deferred:
//! a retry timer is armed and the size is checked again when it fires.
//!
//! `teardown` stops the render loop before the renderer is disposed, so a
//! draw never reaches a disposed context. It is idempotent and also valid
//! while initialisation is still deferred.

use std::{fmt::Debug, mem, time::Duration};

use crate::{
    camera::Camera,
    config::ViewerConfig,
    data_structures::{aids, model::ModelData, scene::Scene},
    error::ViewerError,
    host::{Host, HostEvent, ListenerId, TimerToken},
    interaction::{Appearance, InteractionController},
    pick::pick_nearest,
    pipelines::light::Lighting,
    placer::{ElementPlacer, PlacedElement, PlacementProgress, PlacementResult},
    render::compose,
    render_loop::LoopHandle,
    renderer::{GpuId, Renderer},
    resources::{Colour, ResourceCache},
};

/// Snapshot of what a host view needs to render its overlay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewerStatus {
    pub is_ready: bool,
    pub placed_count: usize,
    pub total_available: usize,
    pub progress_percent: u8,
    pub truncated: bool,
    pub selected_element_id: Option<String>,
    pub wireframe_enabled: bool,
    /// Why the last load or deferred retry could not create a renderer.
    pub renderer_error: Option<String>,
}

/// Pushed to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewerUpdate {
    /// One element was placed.
    Progress(PlacementProgress),
    /// State changed after load, teardown, resize, highlight or wireframe.
    Status(ViewerStatus),
}

type Listener = Box<dyn FnMut(&ViewerUpdate)>;

struct Session {
    camera: Camera,
    renderer: Box<dyn Renderer>,
    lighting: Lighting,
    aids: Vec<GpuId>,
    clear_colour: Colour,
    cache: ResourceCache,
    scene: Scene,
    placement: PlacementResult,
    controller: InteractionController,
    render_loop: LoopHandle,
    resize_listener: Option<ListenerId>,
}

enum Phase {
    Idle,
    /// Waiting for the container to become measurable.
    Deferred {
        model: ModelData,
        retry: TimerToken,
    },
    Ready(Box<Session>),
}

pub struct Viewer {
    config: ViewerConfig,
    phase: Phase,
    listeners: Vec<Listener>,
    renderer_error: Option<String>,
}

impl Debug for Viewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewer")
            .field("config", &self.config)
            .field("status", &self.status())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config: config.validated(),
            phase: Phase::Idle,
            listeners: Vec::new(),
            renderer_error: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Register a callback for progress and status updates.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&ViewerUpdate) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Replace the current session with one for `model`.
    ///
    /// Only fails when the host cannot provide a renderer; the viewer is idle
    /// afterwards and [`ViewerStatus::renderer_error`] holds the reason.
    pub fn load(&mut self, host: &mut dyn Host, model: ModelData) -> Result<(), ViewerError> {
        self.teardown(host);
        self.renderer_error = None;
        let (width, height) = host.surface_size();
        if width == 0 || height == 0 {
            self.defer(host, model);
            self.publish_status();
            return Ok(());
        }
        self.initialize(host, model, width, height)
    }

    fn defer(&mut self, host: &mut dyn Host, model: ModelData) {
        log::debug!(
            "container not measurable yet, retrying in {} ms",
            self.config.init_retry_ms
        );
        let retry = host.set_timeout(Duration::from_millis(self.config.init_retry_ms));
        self.phase = Phase::Deferred { model, retry };
    }

    fn initialize(
        &mut self,
        host: &mut dyn Host,
        model: ModelData,
        width: u32,
        height: u32,
    ) -> Result<(), ViewerError> {
        let camera = Camera::new(&self.config, width, height);

        let mut renderer = match host.create_renderer(width, height) {
            Ok(renderer) => renderer,
            Err(e) => {
                let reason = format!("{:#}", e);
                self.phase = Phase::Idle;
                self.renderer_error = Some(reason.clone());
                self.publish_status();
                return Err(ViewerError::RendererUnavailable(reason));
            }
        };

        let lighting = Lighting::default();
        let aids = vec![
            renderer.upload_lines(&aids::ground_grid(
                self.config.grid_size,
                self.config.grid_divisions,
            )),
            renderer.upload_lines(&aids::axes(self.config.axes_length)),
        ];

        let mut cache = ResourceCache::new();
        let mut scene = Scene::new();
        let listeners = &mut self.listeners;
        let placement = ElementPlacer::new(&self.config).place(
            &model,
            &mut cache,
            renderer.as_mut(),
            &mut scene,
            &mut |progress| notify(listeners, &ViewerUpdate::Progress(progress)),
        );
        log::info!(
            "scene ready: {} of {} elements placed in {} categories",
            placement.placed_count(),
            placement.total_available,
            cache.geometry_count()
        );

        let render_loop = LoopHandle::start(host);
        let resize_listener = Some(host.observe_resize());

        self.phase = Phase::Ready(Box::new(Session {
            camera,
            renderer,
            lighting,
            aids,
            clear_colour: self.config.clear_colour,
            cache,
            scene,
            placement,
            controller: InteractionController::new(&self.config),
            render_loop,
            resize_listener,
        }));
        self.publish_status();
        Ok(())
    }

    /// Release everything the current session registered. Safe to call at any time.
    pub fn teardown(&mut self, host: &mut dyn Host) {
        match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => return,
            Phase::Deferred { retry, .. } => {
                host.clear_timeout(retry);
                log::debug!("deferred initialisation cancelled");
            }
            Phase::Ready(mut session) => {
                session.render_loop.stop(host);
                if let Some(listener) = session.resize_listener.take() {
                    host.unobserve_resize(listener);
                }
                session.controller.forget();
                session.scene.clear();
                session.cache.clear();
                session.renderer.dispose();
                host.clear_surface();
                log::info!(
                    "scene torn down after {} frames",
                    session.render_loop.frames_drawn()
                );
            }
        }
        self.publish_status();
    }

    /// Route one host message to the lifecycle, render loop or interaction.
    pub fn handle_event(&mut self, host: &mut dyn Host, event: HostEvent) {
        match event {
            HostEvent::Frame(token) => {
                if let Phase::Ready(session) = &mut self.phase {
                    if session.render_loop.accept(token, host).is_some() {
                        session.draw();
                    }
                }
            }
            HostEvent::Timeout(token) => self.retry_initialize(host, token),
            HostEvent::Resized {
                listener,
                width,
                height,
            } => {
                let Phase::Ready(session) = &mut self.phase else {
                    return;
                };
                if session.resize_listener != Some(listener) || width == 0 || height == 0 {
                    return;
                }
                session.camera.resize(width, height);
                session.renderer.resize(width, height);
                self.publish_status();
            }
            HostEvent::PointerDown { x, y } => self.begin_drag(x, y),
            HostEvent::PointerMove { x, y } => {
                self.continue_drag(x, y);
            }
            HostEvent::PointerUp => self.end_drag(),
            HostEvent::Wheel { delta_y } => self.zoom(delta_y),
            HostEvent::Click { x, y } => {
                self.select_at(x, y);
            }
        }
    }

    fn retry_initialize(&mut self, host: &mut dyn Host, token: TimerToken) {
        match &self.phase {
            Phase::Deferred { retry, .. } if *retry == token => (),
            _ => return,
        }
        let Phase::Deferred { model, .. } = mem::replace(&mut self.phase, Phase::Idle) else {
            return;
        };
        let (width, height) = host.surface_size();
        if width == 0 || height == 0 {
            self.defer(host, model);
            return;
        }
        if let Err(e) = self.initialize(host, model, width, height) {
            log::error!("deferred initialisation failed: {}", e);
        }
    }

    pub fn status(&self) -> ViewerStatus {
        match &self.phase {
            Phase::Ready(session) => ViewerStatus {
                is_ready: true,
                placed_count: session.placement.placed_count(),
                total_available: session.placement.total_available,
                progress_percent: session.placement.progress_percent(),
                truncated: session.placement.truncated,
                selected_element_id: session.controller.selected_id().map(str::to_string),
                wireframe_enabled: session.controller.wireframe(),
                renderer_error: None,
            },
            Phase::Idle | Phase::Deferred { .. } => ViewerStatus {
                renderer_error: self.renderer_error.clone(),
                ..Default::default()
            },
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready(_))
    }

    /// No session and no pending initialisation.
    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    pub fn is_initializing(&self) -> bool {
        matches!(self.phase, Phase::Deferred { .. })
    }

    pub fn placed_elements(&self) -> &[PlacedElement] {
        match &self.phase {
            Phase::Ready(session) => &session.placement.placed,
            _ => &[],
        }
    }

    pub fn appearance(&self, id: &str) -> Option<Appearance> {
        let session = self.session()?;
        let element = session.placement.placed.iter().find(|e| e.id == id)?;
        session.controller.appearance(&session.scene, element)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.session().map(|s| &s.camera)
    }

    /// Frames drawn by the current session.
    pub fn frames_drawn(&self) -> u64 {
        self.session()
            .map(|s| s.render_loop.frames_drawn())
            .unwrap_or(0)
    }

    pub fn begin_drag(&mut self, x: f32, y: f32) {
        if let Some(session) = self.session_mut() {
            session.controller.begin_drag(x, y);
        }
    }

    pub fn continue_drag(&mut self, x: f32, y: f32) -> bool {
        self.session_mut()
            .map(|s| s.controller.continue_drag(&mut s.camera, x, y))
            .unwrap_or(false)
    }

    pub fn end_drag(&mut self) {
        if let Some(session) = self.session_mut() {
            session.controller.end_drag();
        }
    }

    pub fn zoom(&mut self, delta: f32) {
        if let Some(s) = self.session_mut() {
            s.controller.zoom(&mut s.camera, delta);
        }
    }

    pub fn zoom_in(&mut self) {
        if let Some(s) = self.session_mut() {
            s.controller.zoom_in(&mut s.camera);
        }
    }

    pub fn zoom_out(&mut self) {
        if let Some(s) = self.session_mut() {
            s.controller.zoom_out(&mut s.camera);
        }
    }

    pub fn reset_view(&mut self) {
        if let Some(s) = self.session_mut() {
            s.controller.reset_view(&mut s.camera);
        }
    }

    /// Emphasise one element. `false` when it is not placed; nothing is emphasised then.
    pub fn highlight(&mut self, id: &str) -> bool {
        let Some(s) = self.session_mut() else {
            return false;
        };
        let found = s
            .controller
            .highlight(&mut s.scene, &s.placement.placed, id);
        self.publish_status();
        found
    }

    pub fn clear_highlight(&mut self) {
        if let Some(s) = self.session_mut() {
            s.controller.clear_highlight(&mut s.scene);
            self.publish_status();
        }
    }

    pub fn set_wireframe(&mut self, enabled: bool) {
        if let Some(s) = self.session_mut() {
            s.controller.set_wireframe(enabled);
            self.publish_status();
        }
    }

    /// Id of the element under a container pixel.
    pub fn pick(&self, x: f32, y: f32) -> Option<String> {
        let session = self.session()?;
        let (width, height) = session.renderer.size();
        let ray = session.camera.screen_ray(x, y, width, height)?;
        pick_nearest(
            &ray,
            &session.scene,
            &session.placement.placed,
            &session.camera.scene_transform(),
        )
    }

    /// Highlight the element under a pixel, or clear the highlight on a miss.
    pub fn select_at(&mut self, x: f32, y: f32) -> Option<String> {
        match self.pick(x, y) {
            Some(id) => {
                self.highlight(&id);
                Some(id)
            }
            None => {
                self.clear_highlight();
                None
            }
        }
    }

    fn session(&self) -> Option<&Session> {
        match &self.phase {
            Phase::Ready(session) => Some(session),
            _ => None,
        }
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.phase {
            Phase::Ready(session) => Some(session),
            _ => None,
        }
    }

    fn publish_status(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let status = ViewerUpdate::Status(self.status());
        notify(&mut self.listeners, &status);
    }
}

impl Session {
    fn draw(&mut self) {
        let frame = compose(
            &self.scene,
            &self.camera,
            &self.lighting,
            &self.aids,
            self.controller.wireframe(),
            self.clear_colour,
        );
        if let Err(e) = self.renderer.draw(&frame) {
            log::error!("Unable to render {}", e);
        }
    }
}

impl Drop for Viewer {
    fn drop(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            log::warn!("viewer dropped without teardown; host subscriptions were not released");
        }
    }
}

fn notify(listeners: &mut [Listener], update: &ViewerUpdate) {
    for listener in listeners.iter_mut() {
        listener(update);
    }
}
