use crate::config::{self, DisplayConfig};
use crate::events::AppEvent;
use crate::gui::gmeter::{self, Point, Scene};
use crate::gui::theme::{self, ThemeColors};
use crate::gui::window::{self, DragTracker};
use crate::hotkeys::Hotkey;
use crate::pipeline::Pipeline;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use simtelem::TelemetrySource;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

type SharedPipeline = Rc<RefCell<Pipeline<Box<dyn TelemetrySource>>>>;

pub struct AppModel {
    pub pipeline: SharedPipeline,
    pub config: Rc<RefCell<DisplayConfig>>,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
    drag: DragTracker,
    timers: Vec<glib::SourceId>,
}

#[derive(Debug)]
pub enum AppMsg {
    Poll,
    Redraw,
    Hotkey(Hotkey),
    DragBegin,
    Drag(Point),
    DragEnd,
    Quit,
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (
        DisplayConfig,
        Box<dyn TelemetrySource>,
        async_channel::Receiver<AppEvent>,
    );
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("G-Ball"),
            add_css_class: "gball-window",
            set_decorated: false,

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    match key.to_unicode().and_then(Hotkey::from_char) {
                        Some(hotkey) => {
                            sender.input(AppMsg::Hotkey(hotkey));
                            glib::Propagation::Stop
                        }
                        None => glib::Propagation::Proceed,
                    }
                }
            },

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                set_vexpand: true,
                add_css_class: "gball-drawing-area",

                add_controller = gtk::GestureDrag {
                    set_button: 1,
                    connect_drag_begin[sender] => move |_, _, _| {
                        sender.input(AppMsg::DragBegin);
                    },
                    connect_drag_update[sender] => move |_, dx, dy| {
                        sender.input(AppMsg::Drag(Point::new(dx, dy)));
                    },
                    connect_drag_end[sender] => move |_, _, _| {
                        sender.input(AppMsg::DragEnd);
                    }
                },

                add_controller = gtk::GestureClick {
                    set_button: 3,
                    connect_released[sender] => move |_, _, _, _| {
                        sender.input(AppMsg::Quit);
                    }
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (config, source, rx) = init;

        theme::load_css();
        window::init_layer_shell(&root, &config);

        let model = AppModel {
            pipeline: Rc::new(RefCell::new(Pipeline::new(source))),
            config: Rc::new(RefCell::new(config)),
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
            drag: DragTracker::default(),
            timers: Vec::new(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();
        model.apply_config();

        let (pipeline_draw, config_draw) = (model.pipeline.clone(), model.config.clone());
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, width, height| {
                let colors = ThemeColors::from_context(&drawing_area.style_context());
                let pipeline = pipeline_draw.borrow();
                let scene = Scene::new(
                    &pipeline.render_state(),
                    &config_draw.borrow(),
                    width as f64,
                    height as f64,
                );
                if let Err(e) = gmeter::draw(cr, &scene, &colors) {
                    log::error!("Drawing error: {}", e);
                }
            });

        model.start_timers(&sender);

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Poll => {
                let config = self.config.borrow();
                self.pipeline.borrow_mut().tick(&config);
            }
            AppMsg::Redraw => self.drawing_area.queue_draw(),
            AppMsg::Hotkey(hotkey) => {
                {
                    let mut config = self.config.borrow_mut();
                    if !config.hotkeys_enabled {
                        return;
                    }
                    hotkey.apply(&mut config);
                }
                log::debug!("Hotkey {}", hotkey);
                self.drawing_area.queue_draw();
            }
            AppMsg::DragBegin => self.drag.begin(self.config.borrow().window_position),
            AppMsg::Drag(offset) => {
                if let Some(position) = self.drag.update(offset) {
                    self.config.borrow_mut().window_position = position;
                    window::move_to(&self.root, position);
                }
            }
            AppMsg::DragEnd => self.drag.end(),
            AppMsg::Quit => {
                match config::save_config(&self.config.borrow()) {
                    Ok(path) => log::info!("Saved settings to {}", path.display()),
                    Err(e) => log::error!("Failed to save settings: {}", e),
                }
                relm4::main_application().quit();
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    let old = self.config.replace(new_config);
                    let intervals_changed = {
                        let config = self.config.borrow();
                        old.poll_interval_ms != config.poll_interval_ms
                            || old.render_interval_ms != config.render_interval_ms
                    };
                    self.apply_config();
                    if intervals_changed {
                        self.start_timers(&sender);
                    }
                    self.drawing_area.queue_draw();
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
    }
}

impl AppModel {
    fn apply_config(&self) {
        let config = self.config.borrow();
        window::apply_config(&self.root, &config);
        self.drawing_area.set_content_width(config.window_size.width);
        self.drawing_area.set_content_height(config.window_size.height);
    }

    /// (Re)starts the poll and render timers on the main loop.
    fn start_timers(&mut self, sender: &ComponentSender<Self>) {
        for timer in self.timers.drain(..) {
            timer.remove();
        }

        let (poll, render) = {
            let config = self.config.borrow();
            (config.poll_interval(), config.render_interval())
        };
        self.timers = vec![
            schedule(sender, poll, || AppMsg::Poll),
            schedule(sender, render, || AppMsg::Redraw),
        ];
    }
}

fn schedule(
    sender: &ComponentSender<AppModel>,
    interval: Duration,
    msg: fn() -> AppMsg,
) -> glib::SourceId {
    let sender = sender.clone();
    glib::timeout_add_local(interval, move || {
        sender.input(msg());
        glib::ControlFlow::Continue
    })
}
