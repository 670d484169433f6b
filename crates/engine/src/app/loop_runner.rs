use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::host::ProxyStore;
use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::rendering::{screen_to_world, Camera2D, Renderer};
use super::{InputAction, InputSnapshot, Simulation, SimulationCommand, SimulationRunner, Vec2};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
    pub camera_zoom: f32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "City Quest".to_string(),
            window_width: 1280,
            window_height: 720,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(5),
            max_render_fps: Some(120),
            camera_zoom: 1.5,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, simulation: Box<dyn Simulation>) -> Result<(), AppError> {
    let mut runner = SimulationRunner::new(simulation);
    let mut store = ProxyStore::default();

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window: &'static winit::window::Window = Box::leak(Box::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    ));
    let mut renderer = Renderer::new(window).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let render_frame_target = target_frame_duration(config.max_render_fps.filter(|fps| *fps > 0));
    let mut camera = Camera2D {
        position: Vec2::ZERO,
        zoom: config.camera_zoom,
    };

    runner.init(&mut store);
    info!(
        proxy_count = store.proxies().len(),
        target_tps,
        max_ticks_per_frame,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        "simulation_initialized"
    );

    let mut input_collector = InputCollector::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input_collector.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => {
                    input_collector.clear_cursor_position();
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    if let Some(cursor_px) = input_collector.handle_mouse_input(button, state) {
                        let click_world = screen_to_world(cursor_px, &camera, renderer.viewport());
                        input_collector.set_pending_click_world(click_world);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_keyboard_input(&event);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    accumulator = accumulator.saturating_add(raw_frame_dt.min(max_frame_delta));
                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        let input_snapshot = input_collector.snapshot_for_tick();
                        let tick_started = Instant::now();
                        let command = runner.tick(fixed_dt_seconds, &input_snapshot, &mut store);
                        metrics_accumulator.record_tick(tick_started.elapsed());
                        if command == SimulationCommand::Quit || input_snapshot.quit_requested() {
                            info!(reason = "simulation_quit", "shutdown_requested");
                            window_target.exit();
                            break;
                        }
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    if let Some(target) = store.follow_position() {
                        camera.position = target;
                    }
                    if let Some(ground) = store.ground() {
                        camera.clamp_to_world(renderer.viewport(), ground.world_size());
                    }

                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep = compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    if let Err(error) = renderer.render_store(&store, &camera) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present_instant = Instant::now();

                    let next_title = runner.status_line();
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(&format!("{} | {}", config.window_title, title)),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }

                    metrics_accumulator.record_frame(raw_frame_dt);
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            slowest_tick_ms = snapshot.slowest_tick_ms,
                            proxy_count = store.proxies().len(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                runner.shutdown(&mut store);
                info!(ticks = runner.tick_count(), "shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    activate_is_down: bool,
    activate_pressed_edge: bool,
    submit_pressed_edge: bool,
    cancel_pressed_edge: bool,
    backspace_presses: u32,
    text_input: String,
    cursor_position_px: Option<Vec2>,
    left_mouse_is_down: bool,
    pending_click_world: Option<Vec2>,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
        if !is_pressed {
            return;
        }
        self.handle_key_press(key_event.physical_key, key_event.repeat);
        if let Some(text) = key_event.text.as_ref() {
            self.push_text(text);
        }
    }

    fn handle_key_press(&mut self, key: PhysicalKey, is_repeat: bool) {
        match key {
            PhysicalKey::Code(KeyCode::Enter) | PhysicalKey::Code(KeyCode::NumpadEnter) => {
                if !is_repeat {
                    self.submit_pressed_edge = true;
                }
            }
            PhysicalKey::Code(KeyCode::Escape) => {
                if !is_repeat {
                    self.cancel_pressed_edge = true;
                }
            }
            PhysicalKey::Code(KeyCode::Backspace) => {
                self.backspace_presses = self.backspace_presses.saturating_add(1);
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text_input
            .extend(text.chars().filter(|ch| !ch.is_control()));
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let action = match key {
            PhysicalKey::Code(KeyCode::KeyW) | PhysicalKey::Code(KeyCode::ArrowUp) => {
                InputAction::MoveUp
            }
            PhysicalKey::Code(KeyCode::KeyS) | PhysicalKey::Code(KeyCode::ArrowDown) => {
                InputAction::MoveDown
            }
            PhysicalKey::Code(KeyCode::KeyA) | PhysicalKey::Code(KeyCode::ArrowLeft) => {
                InputAction::MoveLeft
            }
            PhysicalKey::Code(KeyCode::KeyD) | PhysicalKey::Code(KeyCode::ArrowRight) => {
                InputAction::MoveRight
            }
            PhysicalKey::Code(KeyCode::Numpad7) | PhysicalKey::Code(KeyCode::Home) => {
                InputAction::MoveUpLeft
            }
            PhysicalKey::Code(KeyCode::Numpad9) | PhysicalKey::Code(KeyCode::PageUp) => {
                InputAction::MoveUpRight
            }
            PhysicalKey::Code(KeyCode::Numpad1) | PhysicalKey::Code(KeyCode::End) => {
                InputAction::MoveDownLeft
            }
            PhysicalKey::Code(KeyCode::Numpad3) | PhysicalKey::Code(KeyCode::PageDown) => {
                InputAction::MoveDownRight
            }
            PhysicalKey::Code(KeyCode::KeyE) | PhysicalKey::Code(KeyCode::Space) => {
                if is_pressed && !self.activate_is_down {
                    self.activate_pressed_edge = true;
                }
                self.activate_is_down = is_pressed;
                InputAction::Activate
            }
            _ => return,
        };
        self.action_states.set(action, is_pressed);
    }

    fn set_cursor_position_px(&mut self, x: f32, y: f32) {
        self.cursor_position_px = Some(Vec2 { x, y });
    }

    fn clear_cursor_position(&mut self) {
        self.cursor_position_px = None;
    }

    /// Returns the cursor position on a fresh left press so the caller can
    /// resolve it against the camera of that frame.
    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) -> Option<Vec2> {
        if button != MouseButton::Left {
            return None;
        }
        match state {
            ElementState::Pressed => {
                let fresh_press = !self.left_mouse_is_down;
                self.left_mouse_is_down = true;
                if fresh_press {
                    self.cursor_position_px
                } else {
                    None
                }
            }
            ElementState::Released => {
                self.left_mouse_is_down = false;
                None
            }
        }
    }

    fn set_pending_click_world(&mut self, click_world: Vec2) {
        self.pending_click_world = Some(click_world);
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.action_states,
            self.activate_pressed_edge,
            self.submit_pressed_edge,
            self.cancel_pressed_edge,
            self.backspace_presses,
            std::mem::take(&mut self.text_input),
            self.pending_click_world.take(),
        );
        self.activate_pressed_edge = false;
        self.submit_pressed_edge = false;
        self.cancel_pressed_edge = false;
        self.backspace_presses = 0;
        snapshot
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);
        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_keeps_partial_remainder() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(40), fixed_dt, 5);
        assert_eq!(result.ticks_to_run, 2);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(8));
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);
        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn cap_sleep_only_when_under_target() {
        let target = Some(Duration::from_millis(10));
        assert_eq!(
            compute_cap_sleep(Duration::from_millis(4), target),
            Duration::from_millis(6)
        );
        assert_eq!(compute_cap_sleep(Duration::from_millis(12), target), Duration::ZERO);
        assert_eq!(compute_cap_sleep(Duration::from_millis(1), None), Duration::ZERO);
    }

    #[test]
    fn wasd_and_arrow_keys_map_to_actions() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyW), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::ArrowLeft), true);
        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveUp));
        assert!(snapshot.is_down(InputAction::MoveLeft));
    }

    #[test]
    fn numpad_keys_map_to_diagonals() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Numpad9), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::End), true);
        let snapshot = input.snapshot_for_tick();
        assert!(snapshot.is_down(InputAction::MoveUpRight));
        assert!(snapshot.is_down(InputAction::MoveDownLeft));
    }

    #[test]
    fn key_release_clears_action_state() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), true);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyD), false);
        let snapshot = input.snapshot_for_tick();
        assert!(!snapshot.is_down(InputAction::MoveRight));
    }

    #[test]
    fn held_activate_does_not_repeat_pressed_edge() {
        let mut input = InputCollector::default();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyE), true);
        let first = input.snapshot_for_tick();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyE), true);
        let second = input.snapshot_for_tick();
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::KeyE), false);
        input.update_action_state_from_physical_key(PhysicalKey::Code(KeyCode::Space), true);
        let third = input.snapshot_for_tick();

        assert!(first.activate_pressed());
        assert!(!second.activate_pressed());
        assert!(second.is_down(InputAction::Activate));
        assert!(third.activate_pressed());
    }

    #[test]
    fn submit_and_cancel_are_edge_triggered_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_key_press(PhysicalKey::Code(KeyCode::Enter), false);
        input.handle_key_press(PhysicalKey::Code(KeyCode::Escape), false);
        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        assert!(first.submit_pressed());
        assert!(first.cancel_pressed());
        assert!(!second.submit_pressed());
        assert!(!second.cancel_pressed());
    }

    #[test]
    fn repeated_enter_does_not_submit_again() {
        let mut input = InputCollector::default();
        input.handle_key_press(PhysicalKey::Code(KeyCode::Enter), true);
        assert!(!input.snapshot_for_tick().submit_pressed());
    }

    #[test]
    fn text_is_drained_once_and_control_chars_dropped() {
        let mut input = InputCollector::default();
        input.push_text("Pa");
        input.push_text("\r");
        input.push_text("ris");
        input.handle_key_press(PhysicalKey::Code(KeyCode::Backspace), false);
        input.handle_key_press(PhysicalKey::Code(KeyCode::Backspace), true);
        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        assert_eq!(first.text_input(), "Paris");
        assert_eq!(first.backspace_presses(), 2);
        assert_eq!(second.text_input(), "");
        assert_eq!(second.backspace_presses(), 0);
    }

    #[test]
    fn left_click_reports_cursor_only_on_fresh_press() {
        let mut input = InputCollector::default();
        assert_eq!(
            input.handle_mouse_input(MouseButton::Left, ElementState::Pressed),
            None
        );
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        input.set_cursor_position_px(100.0, 200.0);
        let first = input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let held = input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert_eq!(first, Some(Vec2::new(100.0, 200.0)));
        assert_eq!(held, None);
        assert_eq!(
            input.handle_mouse_input(MouseButton::Right, ElementState::Pressed),
            None
        );
    }

    #[test]
    fn pending_click_is_delivered_to_one_tick() {
        let mut input = InputCollector::default();
        input.set_pending_click_world(Vec2::new(64.0, 96.0));
        assert_eq!(
            input.snapshot_for_tick().click_world(),
            Some(Vec2::new(64.0, 96.0))
        );
        assert_eq!(input.snapshot_for_tick().click_world(), None);
    }

    #[test]
    fn quit_request_persists_across_snapshots() {
        let mut input = InputCollector::default();
        input.mark_quit_requested();
        assert!(input.snapshot_for_tick().quit_requested());
        assert!(input.snapshot_for_tick().quit_requested());
    }
}
