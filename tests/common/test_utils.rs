#![allow(dead_code)]

use std::{cell::RefCell, mem, rc::Rc, time::Duration};

use anyhow::bail;
use ifc_ngin::{
    FrameToken, HeadlessRenderer, Host, HostEvent, ListenerId, ModelData, Renderer, TimerToken,
    Viewer, renderer::RenderStats,
};
use serde_json::{Value, json};

/// A host whose frames, timers and resizes only happen when a test says so.
pub struct ManualHost {
    pub width: u32,
    pub height: u32,
    next_token: u64,
    pending_frames: Vec<FrameToken>,
    pub cancelled_frames: Vec<FrameToken>,
    timers: Vec<(TimerToken, Duration)>,
    pub cleared_timers: Vec<TimerToken>,
    pub resize_listeners: Vec<ListenerId>,
    pub renderers: Vec<Rc<RefCell<RenderStats>>>,
    pub surface_clears: usize,
    pub fail_renderer: bool,
    /// Host calls made during teardown-relevant operations, in order.
    pub calls: Vec<&'static str>,
    /// Whether the newest renderer was still live each time a frame was cancelled.
    pub renderer_live_at_cancel: Vec<bool>,
}

impl ManualHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_token: 0,
            pending_frames: Vec::new(),
            cancelled_frames: Vec::new(),
            timers: Vec::new(),
            cleared_timers: Vec::new(),
            resize_listeners: Vec::new(),
            renderers: Vec::new(),
            surface_clears: 0,
            fail_renderer: false,
            calls: Vec::new(),
            renderer_live_at_cancel: Vec::new(),
        }
    }

    /// A container that has not been laid out yet.
    pub fn r#unsized() -> Self {
        Self::new(0, 0)
    }

    fn token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Statistics of the most recently created renderer.
    pub fn stats(&self) -> Rc<RefCell<RenderStats>> {
        self.renderers
            .last()
            .cloned()
            .expect("no renderer was created")
    }

    pub fn pending_frames(&self) -> &[FrameToken] {
        &self.pending_frames
    }

    pub fn pending_timers(&self) -> Vec<TimerToken> {
        self.timers.iter().map(|(token, _)| *token).collect()
    }

    /// One display refresh: deliver every pending frame.
    pub fn pump_frame(&mut self, viewer: &mut Viewer) -> usize {
        let frames = mem::take(&mut self.pending_frames);
        for token in &frames {
            viewer.handle_event(self, HostEvent::Frame(*token));
        }
        frames.len()
    }

    pub fn pump_frames(&mut self, viewer: &mut Viewer, n: usize) {
        for _ in 0..n {
            self.pump_frame(viewer);
        }
    }

    /// Deliver a frame token regardless of whether it is still pending.
    pub fn deliver_frame(&mut self, viewer: &mut Viewer, token: FrameToken) {
        self.pending_frames.retain(|t| *t != token);
        viewer.handle_event(self, HostEvent::Frame(token));
    }

    /// Fire every armed timer.
    pub fn fire_timers(&mut self, viewer: &mut Viewer) -> usize {
        let timers = mem::take(&mut self.timers);
        for (token, _) in &timers {
            viewer.handle_event(self, HostEvent::Timeout(*token));
        }
        timers.len()
    }

    /// Change the container size and notify every registered listener.
    pub fn resize(&mut self, viewer: &mut Viewer, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        for listener in self.resize_listeners.clone() {
            viewer.handle_event(
                self,
                HostEvent::Resized {
                    listener,
                    width,
                    height,
                },
            );
        }
    }
}

impl Host for ManualHost {
    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn create_renderer(&mut self, width: u32, height: u32) -> anyhow::Result<Box<dyn Renderer>> {
        if self.fail_renderer {
            bail!("no graphics adapter");
        }
        self.calls.push("create_renderer");
        let renderer = HeadlessRenderer::new(width, height);
        self.renderers.push(renderer.stats());
        Ok(Box::new(renderer))
    }

    fn clear_surface(&mut self) {
        self.calls.push("clear_surface");
        self.surface_clears += 1;
    }

    fn request_frame(&mut self) -> FrameToken {
        let token = FrameToken(self.token());
        self.pending_frames.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.calls.push("cancel_frame");
        let live = self
            .renderers
            .last()
            .map(|stats| !stats.borrow().disposed)
            .unwrap_or(false);
        self.renderer_live_at_cancel.push(live);
        self.pending_frames.retain(|t| *t != token);
        self.cancelled_frames.push(token);
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerToken {
        self.calls.push("set_timeout");
        let token = TimerToken(self.token());
        self.timers.push((token, delay));
        token
    }

    fn clear_timeout(&mut self, token: TimerToken) {
        self.calls.push("clear_timeout");
        self.timers.retain(|(t, _)| *t != token);
        self.cleared_timers.push(token);
    }

    fn observe_resize(&mut self) -> ListenerId {
        self.calls.push("observe_resize");
        let id = ListenerId(self.token());
        self.resize_listeners.push(id);
        id
    }

    fn unobserve_resize(&mut self, listener: ListenerId) {
        self.calls.push("unobserve_resize");
        self.resize_listeners.retain(|l| *l != listener);
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `n` records of one category with ids `<prefix>-<i>`.
pub fn records(prefix: &str, n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({ "GlobalId": format!("{}-{}", prefix, i), "Name": format!("{} {}", prefix, i) }))
        .collect()
}

pub fn model(categories: &[(&str, usize)]) -> ModelData {
    categories
        .iter()
        .fold(ModelData::empty(), |model, (category, n)| {
            model.with_category(category, records(category, *n))
        })
}
