//! Marble physics
//!
//! Arcade-tuned rigid ball on a ribbon: velocities are expressed in world
//! units per frame at the 60 Hz reference rate and scaled by the actual
//! frame delta at integration time. The marble never queries the path
//! itself; the orchestrator feeds it a surface height (or none, over a gap)
//! before each update.

use glam::{Quat, Vec3};

use super::tick::TickInput;
use crate::DEFAULT_FORWARD;
use crate::consts::*;

/// How player input maps onto marble motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// Marble rolls forward along the path by itself; input only steers
    #[default]
    AutoForward,
    /// Player drives throttle and steering directly
    Direct,
}

#[derive(Debug, Clone)]
pub struct Marble {
    pub position: Vec3,
    /// World units per frame at 60 Hz
    pub velocity: Vec3,
    /// Rolling orientation, integrated from horizontal motion
    pub rotation: Quat,
    pub radius: f32,
    pub control: ControlMode,
    /// Ground height under the marble, None while over a gap (or falling)
    surface: Option<f32>,
    /// Path forward direction at the marble, drives steering frames
    surface_direction: Vec3,
    falling: bool,
    fall_timer: f32,
    jump_cooldown: f32,
    checkpoint_timer: f32,
    last_safe_position: Vec3,
}

impl Marble {
    pub fn new(position: Vec3, control: ControlMode) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            radius: MARBLE_RADIUS,
            control,
            surface: Some(position.y - MARBLE_RADIUS),
            surface_direction: DEFAULT_FORWARD,
            falling: false,
            fall_timer: 0.0,
            jump_cooldown: 0.0,
            checkpoint_timer: 0.0,
            last_safe_position: position,
        }
    }

    /// Feed the ground situation for this tick. `height` is None over a gap:
    /// gravity keeps pulling and nothing stops the marble.
    pub fn set_surface(&mut self, height: Option<f32>, direction: Vec3) {
        self.surface = height;
        if direction.length_squared() > 1e-8 {
            self.surface_direction = direction;
        }
    }

    /// Enter the falling state (called when the marble has dropped below the
    /// deck with no segment under it). Idempotent.
    pub fn start_falling(&mut self) {
        if self.falling {
            return;
        }
        self.falling = true;
        self.fall_timer = 0.0;
        self.surface = None;
        log::debug!("marble falling at {:?}", self.position);
    }

    pub fn is_falling(&self) -> bool {
        self.falling
    }

    /// Resting on (or within epsilon of) the current surface
    pub fn is_grounded(&self) -> bool {
        !self.falling
            && self
                .surface
                .is_some_and(|h| self.position.y - self.radius <= h + GROUND_EPS)
    }

    pub fn last_safe_position(&self) -> Vec3 {
        self.last_safe_position
    }

    pub fn speed(&self) -> f32 {
        crate::horizontal(self.velocity).length()
    }

    /// Advance one tick. `dt` is in seconds, already clamped by the caller.
    pub fn update(&mut self, dt: f32, input: &TickInput) {
        let s = dt * TICK_HZ;
        self.jump_cooldown = (self.jump_cooldown - dt).max(0.0);

        if self.falling {
            self.update_falling(dt, s);
            return;
        }

        let forward = crate::horizontal(self.surface_direction)
            .try_normalize()
            .unwrap_or(DEFAULT_FORWARD);
        let right = Vec3::Y.cross(forward);
        let grounded = self.is_grounded();

        if input.jump && grounded && self.jump_cooldown <= 0.0 {
            self.velocity.y = JUMP_FORCE;
            self.velocity += forward * JUMP_FORWARD_BOOST;
            self.jump_cooldown = JUMP_COOLDOWN_SECS;
        }

        // Input forces apply whether grounded or mid-jump; a jump arc must
        // not strip steering or bleed the imposed forward speed.
        self.apply_control(input, forward, right, grounded, s);
        if grounded {
            self.velocity.y *= VERTICAL_DAMPING.powf(s);
        } else {
            self.velocity.y *= AIR_RESISTANCE.powf(s);
        }

        self.velocity.y -= GRAVITY * s;
        self.velocity.y = self.velocity.y.clamp(-TERMINAL_VELOCITY, TERMINAL_VELOCITY);

        self.position += self.velocity * s;
        self.resolve_ground();
        self.integrate_rolling(s);
        self.update_checkpoint(dt);
    }

    fn update_falling(&mut self, dt: f32, s: f32) {
        self.fall_timer += dt;
        self.velocity.y -= GRAVITY * FALL_GRAVITY_SCALE * s;
        self.velocity.y = self.velocity.y.max(-TERMINAL_VELOCITY);
        self.position += self.velocity * s;
        // Keep tumbling on the way down.
        self.integrate_rolling(s);

        if self.fall_timer >= FALL_TIMEOUT_SECS || self.position.y < FALL_FLOOR_Y {
            self.reset_to_checkpoint();
        }
    }

    fn apply_control(&mut self, input: &TickInput, forward: Vec3, right: Vec3, grounded: bool, s: f32) {
        let steer = input.lateral.clamp(-1.0, 1.0);
        let drag = if grounded { GROUND_FRICTION } else { AIR_RESISTANCE };
        let mut horiz = match self.control {
            ControlMode::AutoForward => {
                // Forward speed is imposed every tick (overwritten, not
                // added); only the lateral component carries over and
                // accumulates the steering force.
                let v = crate::horizontal(self.velocity);
                let lateral = v - forward * v.dot(forward);
                let lateral = (lateral + right * (steer * STEER_ACCELERATION * s)) * drag.powf(s);
                forward * AUTO_FORWARD_SPEED + lateral
            }
            ControlMode::Direct => {
                let mut horiz = crate::horizontal(self.velocity);
                if input.active {
                    horiz += forward * (ACCELERATION * s);
                }
                horiz += right * (steer * ACCELERATION * s);
                horiz * drag.powf(s)
            }
        };
        let speed = horiz.length();
        if speed > MAX_SPEED {
            horiz *= MAX_SPEED / speed;
        }
        self.velocity.x = horiz.x;
        self.velocity.z = horiz.z;
    }

    /// Snap out of surface penetration with a damped bounce. Tiny rebounds
    /// are zeroed so the marble settles instead of micro-bouncing forever.
    fn resolve_ground(&mut self) {
        let Some(height) = self.surface else { return };
        let bottom = self.position.y - self.radius;
        if bottom < height {
            self.position.y = height + self.radius;
            if self.velocity.y < 0.0 {
                let rebound = -self.velocity.y * BOUNCE_FACTOR;
                self.velocity.y = if rebound < MIN_BOUNCE_SPEED { 0.0 } else { rebound };
            }
        }
    }

    /// Roll the visual orientation to match horizontal travel: axis is the
    /// horizontal velocity rotated a quarter turn, angle is arc length over
    /// radius.
    fn integrate_rolling(&mut self, s: f32) {
        let horiz = crate::horizontal(self.velocity);
        let speed = horiz.length();
        if speed < 1e-5 {
            return;
        }
        let axis = Vec3::new(horiz.z, 0.0, -horiz.x) / speed;
        let angle = speed * s / self.radius;
        self.rotation = (Quat::from_axis_angle(axis, angle) * self.rotation).normalize();
    }

    /// Record a respawn point after sustained grounded contact, so a fall
    /// never returns the marble to a gap edge it just slid off.
    fn update_checkpoint(&mut self, dt: f32) {
        if self.is_grounded() {
            self.checkpoint_timer += dt;
            if self.checkpoint_timer >= CHECKPOINT_INTERVAL_SECS {
                self.checkpoint_timer = 0.0;
                self.last_safe_position = self.position;
            }
        } else {
            self.checkpoint_timer = 0.0;
        }
    }

    /// Respawn at the last checkpoint, at rest
    pub fn reset_to_checkpoint(&mut self) {
        log::debug!(
            "marble reset to checkpoint {:?} after {:.2}s fall",
            self.last_safe_position,
            self.fall_timer
        );
        self.position = self.last_safe_position;
        self.velocity = Vec3::ZERO;
        self.falling = false;
        self.fall_timer = 0.0;
        self.jump_cooldown = 0.0;
        self.checkpoint_timer = 0.0;
        self.surface = Some(self.position.y - self.radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn resting_marble(control: ControlMode) -> Marble {
        let mut marble = Marble::new(Vec3::new(0.0, MARBLE_RADIUS, 0.0), control);
        marble.set_surface(Some(0.0), DEFAULT_FORWARD);
        marble
    }

    #[test]
    fn test_rest_on_surface() {
        let mut marble = resting_marble(ControlMode::Direct);
        for _ in 0..120 {
            marble.update(DT, &TickInput::default());
        }
        // Gravity pulls, the ground resolves: the bottom sits on the surface
        // with no residual vertical velocity or creep.
        assert!((marble.position.y - MARBLE_RADIUS).abs() < 1e-5);
        assert_eq!(marble.velocity.y, 0.0);
        assert!(marble.is_grounded());
    }

    #[test]
    fn test_jump_and_cooldown() {
        let mut marble = resting_marble(ControlMode::Direct);
        let jump = TickInput {
            jump: true,
            ..TickInput::default()
        };
        marble.update(DT, &jump);
        assert!(marble.velocity.y > JUMP_FORCE * 0.5);
        assert!(!marble.is_grounded());

        // Holding jump mid-air (or immediately after landing, inside the
        // cooldown window) must not re-trigger.
        let rising = marble.velocity.y;
        marble.update(DT, &jump);
        assert!(marble.velocity.y < rising);
    }

    #[test]
    fn test_jump_lands_back() {
        let mut marble = resting_marble(ControlMode::Direct);
        let jump = TickInput {
            jump: true,
            ..TickInput::default()
        };
        marble.update(DT, &jump);
        for _ in 0..600 {
            marble.update(DT, &TickInput::default());
        }
        assert!(marble.is_grounded());
        assert!((marble.position.y - MARBLE_RADIUS).abs() < 1e-4);
    }

    #[test]
    fn test_fall_times_out_to_checkpoint() {
        let mut marble = resting_marble(ControlMode::Direct);
        // Sit still long enough to bank a checkpoint at the origin.
        for _ in 0..120 {
            marble.update(DT, &TickInput::default());
        }
        let checkpoint = marble.last_safe_position();

        marble.position = Vec3::new(5.0, -3.0, 40.0);
        marble.start_falling();
        assert!(marble.is_falling());
        for _ in 0..30 {
            marble.update(DT, &TickInput::default());
        }
        // No checkpoint updates while falling.
        assert_eq!(marble.last_safe_position(), checkpoint);
        for _ in 0..((FALL_TIMEOUT_SECS / DT) as usize + 2) {
            marble.update(DT, &TickInput::default());
        }
        assert!(!marble.is_falling());
        assert_eq!(marble.position, checkpoint);
        assert_eq!(marble.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_reset_clears_jump_cooldown() {
        let mut marble = resting_marble(ControlMode::Direct);
        for _ in 0..120 {
            marble.update(DT, &TickInput::default());
        }
        let jump = TickInput {
            jump: true,
            ..TickInput::default()
        };
        marble.update(DT, &jump);

        // Hit the safety floor while the cooldown is still running; the
        // respawned marble must be able to jump right away.
        marble.position = Vec3::new(0.0, FALL_FLOOR_Y + 0.1, 0.0);
        marble.velocity = Vec3::ZERO;
        marble.start_falling();
        for _ in 0..10 {
            marble.update(DT, &TickInput::default());
        }
        assert!(!marble.is_falling());

        marble.update(DT, &jump);
        assert!(marble.velocity.y > 0.1, "cooldown survived the reset");
    }

    #[test]
    fn test_fall_floor_resets_early() {
        let mut marble = resting_marble(ControlMode::Direct);
        marble.position = Vec3::new(0.0, FALL_FLOOR_Y + 0.5, 0.0);
        marble.velocity = Vec3::new(0.0, -TERMINAL_VELOCITY, 0.0);
        marble.start_falling();
        marble.update(DT, &TickInput::default());
        marble.update(DT, &TickInput::default());
        assert!(!marble.is_falling(), "floor should cut the fall short");
    }

    #[test]
    fn test_auto_forward_never_stalls() {
        let mut marble = resting_marble(ControlMode::AutoForward);
        for _ in 0..300 {
            marble.update(DT, &TickInput::default());
        }
        assert!((marble.speed() - AUTO_FORWARD_SPEED).abs() < 0.01);
        assert!(marble.position.z > 0.0);
    }

    #[test]
    fn test_auto_forward_steering_releases() {
        let mut marble = resting_marble(ControlMode::AutoForward);
        let left = TickInput {
            lateral: -1.0,
            ..TickInput::default()
        };
        for _ in 0..60 {
            marble.update(DT, &left);
        }
        let steered = marble.velocity.x;
        assert!(steered < -0.05, "left steer should build lateral speed");
        // Forward speed stays imposed regardless of steering.
        assert!((marble.velocity.z - AUTO_FORWARD_SPEED).abs() < 1e-4);

        // Released steering bleeds off under ground friction.
        for _ in 0..120 {
            marble.update(DT, &TickInput::default());
        }
        assert!(marble.velocity.x.abs() < steered.abs() * 0.05);
    }

    #[test]
    fn test_auto_forward_keeps_control_mid_jump() {
        let mut marble = resting_marble(ControlMode::AutoForward);
        marble.update(
            DT,
            &TickInput {
                jump: true,
                ..TickInput::default()
            },
        );
        assert!(!marble.is_grounded());

        // Through the whole jump arc the forward speed is still imposed and
        // steering still has authority.
        let steer = TickInput {
            lateral: 1.0,
            ..TickInput::default()
        };
        for _ in 0..20 {
            marble.update(DT, &steer);
            assert!(!marble.is_grounded());
            assert!((marble.velocity.z - AUTO_FORWARD_SPEED).abs() < 1e-4);
        }
        assert!(marble.velocity.x > 0.05, "airborne steering had no effect");
    }

    #[test]
    fn test_direct_throttle_and_friction() {
        let mut marble = resting_marble(ControlMode::Direct);
        let throttle = TickInput {
            active: true,
            ..TickInput::default()
        };
        for _ in 0..120 {
            marble.update(DT, &throttle);
        }
        let cruising = marble.speed();
        assert!(cruising > 0.1);
        assert!(cruising <= MAX_SPEED + 1e-4);

        for _ in 0..240 {
            marble.update(DT, &TickInput::default());
        }
        assert!(marble.speed() < cruising * 0.1, "friction should bleed speed");
    }

    #[test]
    fn test_gap_surface_lets_marble_drop() {
        let mut marble = resting_marble(ControlMode::Direct);
        marble.set_surface(None, DEFAULT_FORWARD);
        for _ in 0..30 {
            marble.update(DT, &TickInput::default());
        }
        assert!(marble.position.y < 0.0, "nothing should hold the marble up");
    }

    #[test]
    fn test_rolling_rotation_tracks_motion() {
        let mut marble = resting_marble(ControlMode::AutoForward);
        let start = marble.rotation;
        for _ in 0..30 {
            marble.update(DT, &TickInput::default());
        }
        assert!(marble.rotation.angle_between(start) > 0.1);
    }

    proptest! {
        #[test]
        fn prop_speed_stays_bounded(
            inputs in prop::collection::vec((-1.0f32..1.0, any::<bool>(), any::<bool>()), 1..400)
        ) {
            let mut marble = resting_marble(ControlMode::Direct);
            for (lateral, active, jump) in inputs {
                marble.update(DT, &TickInput { lateral, active, jump });
                prop_assert!(marble.speed() <= MAX_SPEED + 1e-3);
                prop_assert!(marble.velocity.y >= -TERMINAL_VELOCITY - 1e-3);
            }
        }
    }
}
