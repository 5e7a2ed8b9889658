//! Portfolio Sandbox entry point
//!
//! Handles platform-specific initialization and runs the frame loops.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlElement, MouseEvent, PointerEvent};

    use portfolio_sandbox::consts::SIM_DT;
    use portfolio_sandbox::cursor::{CursorFollower, HoverTracker};
    use portfolio_sandbox::disclosure::Disclosure;
    use portfolio_sandbox::platform::{self, DomCursor, DomDisclosure, DomLabels, SetupError};
    use portfolio_sandbox::projects::{self, ProjectRecord};
    use portfolio_sandbox::renderer::CanvasRenderer;
    use portfolio_sandbox::sim::{RapierWorld, Viewport};
    use portfolio_sandbox::{RunState, SandboxConfig, Scene};

    const PROJECTS_ELEMENT_ID: &str = "sandbox-projects";
    const CANVAS_CONTAINER_ID: &str = "canvas-container";

    /// Everything driven by the physics frame loop
    struct Sandbox {
        scene: Scene<RapierWorld>,
        labels: DomLabels,
        renderer: CanvasRenderer,
        disclosure: DomDisclosure,
        last_time: f64,
    }

    impl Sandbox {
        /// Step physics, sync labels, draw. Returns false once halted.
        fn frame(&mut self, time: f64) -> bool {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;

            if let Err(e) = self.scene.advance(dt, &mut self.labels) {
                log::error!("Physics step failed, animation stopped: {e}");
                return false;
            }
            self.renderer.render(&self.scene);
            self.scene.run_state() == RunState::Running
        }
    }

    /// Cursor ring state, driven by its own animation loop
    struct CursorRig {
        follower: CursorFollower,
        hover: HoverTracker,
        dom: DomCursor,
    }

    fn viewport() -> Viewport {
        let window = web_sys::window();
        let size = |v: Option<Result<JsValue, JsValue>>| {
            v.and_then(|r| r.ok()).and_then(|v| v.as_f64()).unwrap_or(1.0) as f32
        };
        Viewport::new(
            size(window.as_ref().map(|w| w.inner_width())),
            size(window.as_ref().map(|w| w.inner_height())),
        )
    }

    fn device_pixel_ratio() -> f64 {
        web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0)
    }

    fn load_projects(document: &web_sys::Document) -> Vec<Rc<ProjectRecord>> {
        if let Some(json) = document
            .get_element_by_id(PROJECTS_ELEMENT_ID)
            .and_then(|el| el.text_content())
        {
            match projects::parse_projects(&json) {
                Ok(list) => {
                    log::info!("Loaded {} projects from #{}", list.len(), PROJECTS_ELEMENT_ID);
                    return list;
                }
                Err(e) => log::warn!("Ignoring #{}: {e}", PROJECTS_ELEMENT_ID),
            }
        }
        projects::default_projects()
    }

    /// Canvas inside `#canvas-container`, created if the page has none
    fn render_surface(document: &web_sys::Document) -> Result<HtmlCanvasElement, SetupError> {
        let container: HtmlElement =
            platform::element_by_id(document, CANVAS_CONTAINER_ID, "HtmlElement")?;
        if let Some(existing) = container.query_selector("canvas")? {
            return existing
                .dyn_into::<HtmlCanvasElement>()
                .map_err(|_| SetupError::WrongElementType {
                    id: CANVAS_CONTAINER_ID.to_string(),
                    expected: "HtmlCanvasElement",
                });
        }
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")?
            .dyn_into()
            .map_err(|_| SetupError::NoContext)?;
        container.append_child(&canvas)?;
        Ok(canvas)
    }

    pub fn run() -> Result<(), SetupError> {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            // Logger already set (hot reload)
        }

        log::info!("Portfolio sandbox starting...");

        let document = platform::document()?;
        let config = SandboxConfig::load();
        let projects = load_projects(&document);

        let viewport = viewport();
        let mut renderer = CanvasRenderer::new(render_surface(&document)?)?;
        renderer.resize(viewport, device_pixel_ratio());

        let world = RapierWorld::new(config.gravity);
        let scene = Scene::new(world, config.clone(), &projects, viewport);
        let labels = DomLabels::create(&document, &projects)?;
        let disclosure = DomDisclosure::find(&document)?;

        let sandbox = Rc::new(RefCell::new(Sandbox {
            scene,
            labels,
            renderer,
            disclosure,
            last_time: 0.0,
        }));

        setup_pointer_handlers(sandbox.clone())?;
        setup_modal_dismiss(sandbox.clone())?;
        setup_scatter_buttons(sandbox.clone())?;
        setup_resize(sandbox.clone())?;

        match DomCursor::find(&document) {
            Ok(dom) => {
                dom.apply_style(Default::default());
                let rig = Rc::new(RefCell::new(CursorRig {
                    follower: CursorFollower::new(config.cursor_smoothing),
                    hover: HoverTracker::default(),
                    dom,
                }));
                setup_cursor(rig.clone())?;
                request_cursor_frame(rig);
            }
            Err(e) => log::info!("Custom cursor disabled: {e}"),
        }

        request_physics_frame(sandbox);

        log::info!("Portfolio sandbox running with {} blocks", projects.len());
        Ok(())
    }

    fn event_pos(canvas: &HtmlCanvasElement, event: &MouseEvent) -> Vec2 {
        let rect = canvas.get_bounding_client_rect();
        Vec2::new(
            event.client_x() as f32 - rect.left() as f32,
            event.client_y() as f32 - rect.top() as f32,
        )
    }

    fn setup_pointer_handlers(sandbox: Rc<RefCell<Sandbox>>) -> Result<(), SetupError> {
        let canvas = sandbox.borrow().renderer.canvas().clone();

        // Pointer down - latch the block under the pointer
        {
            let sandbox = sandbox.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let pos = event_pos(&canvas_clone, &event);
                let _ = canvas_clone.set_pointer_capture(event.pointer_id());
                sandbox.borrow_mut().scene.pointer_down(pos);
            });
            canvas.add_event_listener_with_callback(
                "pointerdown",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Pointer move - drag threshold and spring target
        {
            let sandbox = sandbox.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let pos = event_pos(&canvas_clone, &event);
                sandbox.borrow_mut().scene.pointer_move(pos);
            });
            canvas.add_event_listener_with_callback(
                "pointermove",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Pointer up - pick or release
        {
            let sandbox = sandbox.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let pos = event_pos(&canvas_clone, &event);
                let _ = canvas_clone.release_pointer_capture(event.pointer_id());
                let mut guard = sandbox.borrow_mut();
                let Sandbox {
                    scene, disclosure, ..
                } = &mut *guard;
                scene.pointer_up(pos, disclosure);
            });
            canvas.add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Cancellation sources
        for name in ["pointercancel", "lostpointercapture"] {
            let sandbox = sandbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                sandbox.borrow_mut().scene.pointer_cancel();
            });
            canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                sandbox.borrow_mut().scene.pointer_cancel();
            });
            platform::window()?
                .add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_modal_dismiss(sandbox: Rc<RefCell<Sandbox>>) -> Result<(), SetupError> {
        let document = platform::document()?;

        if let Some(btn) = document.get_element_by_id(DomDisclosure::CLOSE_ID) {
            let sandbox = sandbox.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                sandbox.borrow_mut().disclosure.hide();
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Backdrop click (the modal itself, not its content)
        let modal = sandbox.borrow().disclosure.modal().clone();
        let modal_clone = modal.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let on_backdrop = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Node>().ok())
                .is_some_and(|node| modal_clone.is_same_node(Some(&node)));
            if on_backdrop {
                sandbox.borrow_mut().disclosure.hide();
            }
        });
        modal.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    /// Elements marked `data-scatter` kick all blocks into the air
    fn setup_scatter_buttons(sandbox: Rc<RefCell<Sandbox>>) -> Result<(), SetupError> {
        let document = platform::document()?;
        let rng = Rc::new(RefCell::new(Pcg32::seed_from_u64(js_sys::Date::now() as u64)));
        let buttons = document.query_selector_all("[data-scatter]")?;

        for i in 0..buttons.length() {
            let Some(node) = buttons.item(i) else {
                continue;
            };
            let sandbox = sandbox.clone();
            let rng = rng.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                sandbox.borrow_mut().scene.scatter(&mut *rng.borrow_mut());
            });
            node.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_resize(sandbox: Rc<RefCell<Sandbox>>) -> Result<(), SetupError> {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let viewport = viewport();
            let mut s = sandbox.borrow_mut();
            s.renderer.resize(viewport, device_pixel_ratio());
            s.scene.resize(viewport);
        });
        platform::window()?
            .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_cursor(rig: Rc<RefCell<CursorRig>>) -> Result<(), SetupError> {
        let document = platform::document()?;

        // Raw position: dot follows immediately, ring gets a new target
        {
            let rig = rig.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let pos = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                let mut r = rig.borrow_mut();
                r.follower.set_target(pos);
                r.dom.place_dot(pos);
            });
            document.add_event_listener_with_callback(
                "mousemove",
                closure.as_ref().unchecked_ref(),
            )?;
            closure.forget();
        }

        // Hover styling on page chrome
        let chrome = document.query_selector_all("button, a, .close")?;
        for i in 0..chrome.length() {
            let Some(node) = chrome.item(i) else {
                continue;
            };
            {
                let rig = rig.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    let mut r = rig.borrow_mut();
                    if let Some(style) = r.hover.enter() {
                        r.dom.apply_style(style);
                    }
                });
                node.add_event_listener_with_callback(
                    "mouseenter",
                    closure.as_ref().unchecked_ref(),
                )?;
                closure.forget();
            }
            {
                let rig = rig.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    let mut r = rig.borrow_mut();
                    if let Some(style) = r.hover.leave() {
                        r.dom.apply_style(style);
                    }
                });
                node.add_event_listener_with_callback(
                    "mouseleave",
                    closure.as_ref().unchecked_ref(),
                )?;
                closure.forget();
            }
        }
        Ok(())
    }

    fn request_physics_frame(sandbox: Rc<RefCell<Sandbox>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            let running = sandbox.borrow_mut().frame(time);
            if running {
                request_physics_frame(sandbox);
            }
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_cursor_frame(rig: Rc<RefCell<CursorRig>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            {
                let mut r = rig.borrow_mut();
                let pos = r.follower.tick();
                r.dom.place_ring(pos);
            }
            request_cursor_frame(rig);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_game::run() {
        log::error!("Portfolio sandbox failed to start: {e}");
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Portfolio sandbox (native) starting...");
    log::info!("The interactive page is web-only - build for wasm32 to run it in a browser");

    println!("\nRunning headless drop test...");
    headless_drop();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drop the blocks onto the floor, click one, and print where they landed
#[cfg(not(target_arch = "wasm32"))]
fn headless_drop() {
    use portfolio_sandbox::consts::SIM_DT;
    use portfolio_sandbox::disclosure::{Disclosure, LogDisclosure};
    use portfolio_sandbox::overlay::{LabelSink, LabelTransform};
    use portfolio_sandbox::projects::default_projects;
    use portfolio_sandbox::sim::{RapierWorld, Viewport};
    use portfolio_sandbox::{SandboxConfig, Scene};

    struct Labels(Vec<Option<LabelTransform>>);

    impl LabelSink for Labels {
        fn apply(&mut self, index: usize, transform: &LabelTransform) -> bool {
            match self.0.get_mut(index) {
                Some(slot) => {
                    *slot = Some(*transform);
                    true
                }
                None => false,
            }
        }
    }

    let config = SandboxConfig::load();
    let projects = default_projects();
    let world = RapierWorld::new(config.gravity);
    let mut scene = Scene::new(world, config, &projects, Viewport::new(1280.0, 720.0));
    let mut labels = Labels(vec![None; projects.len()]);

    for _ in 0..180 {
        if let Err(e) = scene.advance(SIM_DT, &mut labels) {
            log::error!("Physics step failed: {e}");
            return;
        }
    }

    for (block, label) in scene.blocks().iter().zip(&labels.0) {
        if let Some(label) = label {
            println!(
                "  {:<14} at ({:7.1}, {:7.1})  {:6.1}°",
                block.project.name, label.position.x, label.position.y, label.rotation_deg
            );
        }
    }

    let mut disclosure = LogDisclosure::default();
    if let Some(pos) = scene.block_transform(0).map(|t| t.position) {
        scene.pointer_down(pos);
        scene.pointer_up(pos, &mut disclosure);
    }
    match disclosure.current() {
        Some(record) => println!("✓ Click on first block opened '{}'", record.name),
        None => println!("✗ Click on first block opened nothing"),
    }
    disclosure.hide();
}
