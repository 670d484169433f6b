use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use super::host::ProxyHost;
use super::input::InputSnapshot;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a (near) zero vector.
    pub fn normalized_or_zero(self) -> Vec2 {
        let len = self.length();
        if len <= f32::EPSILON || !len.is_finite() {
            return Vec2::ZERO;
        }
        Vec2 {
            x: self.x / len,
            y: self.y / len,
        }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2 {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2 {
            x: -self.x,
            y: -self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationCommand {
    Continue,
    Quit,
}

/// Lifecycle driven by the host runtime. `tick` runs to completion once per
/// fixed step; nothing inside may block.
pub trait Simulation {
    fn init(&mut self, host: &mut dyn ProxyHost);
    fn tick(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        host: &mut dyn ProxyHost,
    ) -> SimulationCommand;
    fn shutdown(&mut self, host: &mut dyn ProxyHost);
    fn status_line(&self) -> Option<String> {
        None
    }
}

/// Owns one simulation and guards its init/shutdown pairing.
pub struct SimulationRunner {
    simulation: Box<dyn Simulation>,
    is_initialized: bool,
    tick_count: u64,
}

impl SimulationRunner {
    pub fn new(simulation: Box<dyn Simulation>) -> Self {
        Self {
            simulation,
            is_initialized: false,
            tick_count: 0,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.is_initialized
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn init(&mut self, host: &mut dyn ProxyHost) {
        if self.is_initialized {
            return;
        }
        self.simulation.init(host);
        self.is_initialized = true;
    }

    pub fn tick(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        host: &mut dyn ProxyHost,
    ) -> SimulationCommand {
        if !self.is_initialized {
            return SimulationCommand::Continue;
        }
        self.tick_count = self.tick_count.saturating_add(1);
        self.simulation.tick(fixed_dt_seconds, input, host)
    }

    pub fn shutdown(&mut self, host: &mut dyn ProxyHost) {
        if !self.is_initialized {
            return;
        }
        self.simulation.shutdown(host);
        self.is_initialized = false;
    }

    pub fn status_line(&self) -> Option<String> {
        self.simulation.status_line()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::host::{ProxyDesc, ProxyLayer, ProxyShape, ProxyStore, ProxyUpdate};

    struct SteppingSimulation {
        step_x: f32,
        proxy: Option<crate::app::host::ProxyId>,
        position: Vec2,
    }

    impl SteppingSimulation {
        fn new(step_x: f32) -> Self {
            Self {
                step_x,
                proxy: None,
                position: Vec2::ZERO,
            }
        }
    }

    impl Simulation for SteppingSimulation {
        fn init(&mut self, host: &mut dyn ProxyHost) {
            self.proxy = Some(host.spawn_proxy(ProxyDesc {
                debug_name: "step",
                layer: ProxyLayer::Actor,
                shape: ProxyShape::Rect,
                position: self.position,
                size: Vec2::new(4.0, 4.0),
                color: [255, 255, 255, 255],
                depth: 0.0,
                collidable: false,
            }));
        }

        fn tick(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            host: &mut dyn ProxyHost,
        ) -> SimulationCommand {
            self.position.x += self.step_x;
            if let Some(proxy) = self.proxy {
                host.update_proxy(
                    proxy,
                    ProxyUpdate {
                        position: self.position,
                        depth: self.position.y,
                        color: None,
                    },
                );
            }
            SimulationCommand::Continue
        }

        fn shutdown(&mut self, host: &mut dyn ProxyHost) {
            host.clear();
        }
    }

    #[test]
    fn vec2_normalized_or_zero_handles_zero_vector() {
        assert_eq!(Vec2::ZERO.normalized_or_zero(), Vec2::ZERO);
        let unit = Vec2::new(3.0, 4.0).normalized_or_zero();
        assert!((unit.length() - 1.0).abs() < 0.0001);
        assert!((unit.x - 0.6).abs() < 0.0001);
    }

    #[test]
    fn vec2_operators_compose() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(0.5, -1.0);
        assert_eq!(a + b, Vec2::new(1.5, 1.0));
        assert_eq!(a - b, Vec2::new(0.5, 3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(-a, Vec2::new(-1.0, -2.0));
        assert!((Vec2::new(0.0, 0.0).distance(Vec2::new(3.0, 4.0)) - 5.0).abs() < 0.0001);
    }

    #[test]
    fn runner_ignores_ticks_before_init() {
        let mut host = ProxyStore::default();
        let mut runner = SimulationRunner::new(Box::new(SteppingSimulation::new(1.0)));
        let command = runner.tick(1.0 / 60.0, &InputSnapshot::empty(), &mut host);
        assert_eq!(command, SimulationCommand::Continue);
        assert_eq!(runner.tick_count(), 0);
        assert!(host.proxies().is_empty());
    }

    #[test]
    fn runner_init_is_idempotent() {
        let mut host = ProxyStore::default();
        let mut runner = SimulationRunner::new(Box::new(SteppingSimulation::new(1.0)));
        runner.init(&mut host);
        runner.init(&mut host);
        assert!(runner.is_initialized());
        assert_eq!(host.proxies().len(), 1);
    }

    #[test]
    fn runner_ticks_forward_proxy_updates() {
        let mut host = ProxyStore::default();
        let mut runner = SimulationRunner::new(Box::new(SteppingSimulation::new(2.0)));
        runner.init(&mut host);
        for _ in 0..3 {
            runner.tick(1.0 / 60.0, &InputSnapshot::empty(), &mut host);
        }
        assert_eq!(runner.tick_count(), 3);
        assert_eq!(host.proxies()[0].position, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn runner_shutdown_clears_host_and_only_runs_once() {
        let mut host = ProxyStore::default();
        let mut runner = SimulationRunner::new(Box::new(SteppingSimulation::new(1.0)));
        runner.init(&mut host);
        runner.shutdown(&mut host);
        runner.shutdown(&mut host);
        assert!(!runner.is_initialized());
        assert!(host.proxies().is_empty());
    }
}
