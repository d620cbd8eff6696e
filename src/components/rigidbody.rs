//! Simulated body driving an entity's world-space pose.
//!
//! The [`RigidBody`] is the position authority for its entity: the physics
//! step integrates the body's own pose and then writes it back into the scene
//! graph with `set_global_transform`. Acceleration comes from world gravity
//! (dynamic bodies only) plus any number of named forces that can be toggled
//! individually.

use bevy_ecs::prelude::Component;
use glam::Vec2;
use rustc_hash::FxHashMap;

/// Speeds below this are treated as resting.
const SLEEP_EPSILON: f32 = 1e-4;

/// How a body takes part in the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BodyKind {
    /// Affected by gravity and forces.
    #[default]
    Dynamic,
    /// Moves only by its own velocities and forces, ignores gravity.
    Kinematic,
    /// Never moves; used for map colliders.
    Static,
}

/// A named acceleration that can be toggled on/off.
#[derive(Clone, Copy, Debug)]
pub struct AccelerationForce {
    /// World units per second squared.
    pub value: Vec2,
    pub enabled: bool,
}

impl AccelerationForce {
    pub fn new(value: Vec2) -> Self {
        Self {
            value,
            enabled: true,
        }
    }
}

/// World pose held by the body.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyPose {
    pub position: Vec2,
    /// Radians, counter-clockwise.
    pub rotation: f32,
}

#[derive(Component, Clone, Debug)]
pub struct RigidBody {
    pub kind: BodyKind,
    pub pose: BodyPose,
    /// World units per second.
    pub velocity: Vec2,
    /// Radians per second.
    pub angular_velocity: f32,
    pub forces: FxHashMap<String, AccelerationForce>,
    /// Multiplier on world gravity for dynamic bodies.
    pub gravity_scale: f32,
    /// Velocity damping. Applied as `velocity *= 1 - friction * dt`.
    pub friction: f32,
    pub max_speed: Option<f32>,
    /// Frozen bodies are skipped by the step but can still be teleported.
    pub frozen: bool,
    /// Only awake bodies are written back to the scene graph.
    pub awake: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new(BodyKind::Dynamic)
    }
}

impl RigidBody {
    pub fn new(kind: BodyKind) -> Self {
        Self {
            kind,
            pose: BodyPose::default(),
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            forces: FxHashMap::default(),
            gravity_scale: 1.0,
            friction: 0.0,
            max_speed: None,
            frozen: false,
            awake: kind != BodyKind::Static,
        }
    }

    pub fn dynamic() -> Self {
        Self::new(BodyKind::Dynamic)
    }

    pub fn kinematic() -> Self {
        Self::new(BodyKind::Kinematic)
    }

    pub fn fixed() -> Self {
        Self::new(BodyKind::Static)
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_friction(mut self, friction: f32, max_speed: Option<f32>) -> Self {
        self.friction = friction;
        self.max_speed = max_speed;
        self
    }

    /// Add or replace a named force (enabled).
    pub fn add_force(&mut self, name: &str, value: Vec2) {
        self.forces
            .insert(name.to_string(), AccelerationForce::new(value));
    }

    pub fn remove_force(&mut self, name: &str) {
        self.forces.remove(name);
    }

    /// Returns false if the force doesn't exist.
    pub fn set_force_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.forces.get_mut(name) {
            Some(force) => {
                force.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_force_enabled(&self, name: &str) -> bool {
        self.forces.get(name).is_some_and(|f| f.enabled)
    }

    /// Sum of all enabled named forces (gravity excluded).
    pub fn total_acceleration(&self) -> Vec2 {
        self.forces
            .values()
            .filter(|f| f.enabled)
            .map(|f| f.value)
            .sum()
    }

    /// Teleport the body and wake it up.
    pub fn set_pose(&mut self, position: Vec2, rotation: f32) {
        self.pose = BodyPose { position, rotation };
        self.awake = true;
    }

    /// Advance the body by `dt` seconds.
    ///
    /// Returns whether the pose has to be written back to the scene graph:
    /// true when the body was awake before or after the step. Static and
    /// frozen bodies do not move. A body falls asleep when it ends the step
    /// without motion and without acceleration.
    pub fn integrate(&mut self, dt: f32, gravity: Vec2) -> bool {
        let was_awake = self.awake;
        if self.kind == BodyKind::Static || self.frozen {
            self.awake = false;
            return was_awake;
        }

        let mut acceleration = self.total_acceleration();
        if self.kind == BodyKind::Dynamic {
            acceleration += gravity * self.gravity_scale;
        }

        self.velocity += acceleration * dt;
        if self.friction > 0.0 {
            self.velocity *= (1.0 - self.friction * dt).max(0.0);
        }
        if let Some(max_speed) = self.max_speed {
            self.velocity = self.velocity.clamp_length_max(max_speed);
        }

        self.pose.position += self.velocity * dt;
        self.pose.rotation += self.angular_velocity * dt;

        let moving = self.velocity.length_squared() > SLEEP_EPSILON * SLEEP_EPSILON
            || self.angular_velocity.abs() > SLEEP_EPSILON;
        let accelerated = acceleration.length_squared() > SLEEP_EPSILON * SLEEP_EPSILON;
        self.awake = moving || accelerated;
        was_awake || self.awake
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn test_new_static_body_starts_asleep() {
        assert!(!RigidBody::fixed().awake);
        assert!(RigidBody::dynamic().awake);
        assert!(RigidBody::kinematic().awake);
    }

    #[test]
    fn test_force_toggles() {
        let mut rb = RigidBody::dynamic();
        rb.add_force("wind", Vec2::new(5.0, 0.0));
        rb.add_force("thrust", Vec2::new(0.0, 2.0));
        assert!(vec_approx_eq(rb.total_acceleration(), Vec2::new(5.0, 2.0)));

        assert!(rb.set_force_enabled("wind", false));
        assert!(!rb.is_force_enabled("wind"));
        assert!(vec_approx_eq(rb.total_acceleration(), Vec2::new(0.0, 2.0)));

        assert!(!rb.set_force_enabled("missing", true));
        rb.remove_force("thrust");
        assert!(vec_approx_eq(rb.total_acceleration(), Vec2::ZERO));
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut rb = RigidBody::dynamic();
        assert!(rb.integrate(0.5, Vec2::new(0.0, -10.0)));
        assert!(vec_approx_eq(rb.velocity, Vec2::new(0.0, -5.0)));
        assert!(vec_approx_eq(rb.pose.position, Vec2::new(0.0, -2.5)));
        assert!(rb.awake);
    }

    #[test]
    fn test_kinematic_body_ignores_gravity() {
        let mut rb = RigidBody::kinematic().with_velocity(Vec2::new(2.0, 0.0));
        rb.integrate(1.0, Vec2::new(0.0, -10.0));
        assert!(vec_approx_eq(rb.pose.position, Vec2::new(2.0, 0.0)));
    }

    #[test]
    fn test_static_and_frozen_bodies_do_not_move() {
        let mut fixed = RigidBody::fixed().with_velocity(Vec2::ONE);
        assert!(!fixed.integrate(1.0, Vec2::new(0.0, -10.0)));
        assert!(vec_approx_eq(fixed.pose.position, Vec2::ZERO));

        let mut frozen = RigidBody::dynamic().with_velocity(Vec2::ONE);
        frozen.frozen = true;
        let _ = frozen.integrate(1.0, Vec2::new(0.0, -10.0));
        assert!(vec_approx_eq(frozen.pose.position, Vec2::ZERO));
    }

    #[test]
    fn test_max_speed_clamps_velocity() {
        let mut rb = RigidBody::kinematic()
            .with_velocity(Vec2::new(30.0, 40.0))
            .with_friction(0.0, Some(10.0));
        rb.integrate(0.1, Vec2::ZERO);
        assert!((rb.velocity.length() - 10.0).abs() < EPSILON);
    }

    #[test]
    fn test_resting_body_falls_asleep_after_one_step() {
        let mut rb = RigidBody::kinematic();
        assert!(rb.awake);
        // the step that puts the body to sleep still reports a write-back
        assert!(rb.integrate(0.1, Vec2::ZERO));
        assert!(!rb.awake);
        assert!(!rb.integrate(0.1, Vec2::ZERO));

        rb.set_pose(Vec2::new(1.0, 1.0), 0.5);
        assert!(rb.awake);
    }
}
