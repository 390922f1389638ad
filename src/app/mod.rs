use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use eframe::egui::{self, Context, vec2};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::engine::{Engine, Event};
use crate::feed::{FeedEvent, spawn_feed};

mod render_utils;
mod ui;

pub struct AppOptions {
    pub feed_url: String,
    pub reconnect_delay: Duration,
    /// A pause between frames longer than this is treated as the view having
    /// been hidden.
    pub hidden_gap_secs: f64,
}

pub struct TangleApp {
    engine: Engine,
    feed_url: String,
    feed_rx: Option<Receiver<FeedEvent>>,
    connected: bool,
    filter: String,
    hidden: bool,
    hidden_gap_secs: f64,
    last_frame_secs: Option<f64>,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

impl TangleApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: EngineConfig, options: AppOptions) -> Self {
        let mut engine = Engine::new(config);
        engine.initialize(vec2(1440.0, 860.0));

        Self {
            engine,
            feed_rx: Some(spawn_feed(options.feed_url.clone(), options.reconnect_delay)),
            feed_url: options.feed_url,
            connected: false,
            filter: String::new(),
            hidden: false,
            hidden_gap_secs: options.hidden_gap_secs,
            last_frame_secs: None,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    fn drain_feed(&mut self, now: f64) {
        let Some(rx) = self.feed_rx.as_ref() else {
            return;
        };

        let mut worker_gone = false;
        loop {
            match rx.try_recv() {
                Ok(FeedEvent::Connected) => self.connected = true,
                Ok(FeedEvent::Disconnected) => self.connected = false,
                Ok(FeedEvent::Message(message)) => self.engine.dispatch(Event::Feed(message), now),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    worker_gone = true;
                    break;
                }
            }
        }

        if worker_gone {
            warn!("feed worker stopped");
            self.connected = false;
            self.feed_rx = None;
        }
    }

    fn track_visibility(&mut self, ctx: &Context, now: f64) {
        let minimized = ctx
            .input(|input| input.viewport().minimized)
            .unwrap_or(false);
        let stalled = self
            .last_frame_secs
            .is_some_and(|last| now - last > self.hidden_gap_secs);
        self.last_frame_secs = Some(now);

        if stalled && !self.hidden && !minimized {
            info!("frames were suspended, replaying the backlog");
            self.engine.dispatch(Event::VisibilityChanged(false), now);
            self.drain_feed(now);
            self.engine.dispatch(Event::VisibilityChanged(true), now);
        }

        if minimized != self.hidden {
            self.hidden = minimized;
            self.engine.dispatch(Event::VisibilityChanged(!minimized), now);
        }
    }
}

impl eframe::App for TangleApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|input| input.time);

        self.update_fps_counter(ctx);
        self.track_visibility(ctx, now);
        self.drain_feed(now);

        self.draw_top_bar(ctx, now);

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_details(ui, now));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_canvas(ui, now));

        ctx.request_repaint();
    }
}
