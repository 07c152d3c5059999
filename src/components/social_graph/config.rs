/// Tuning for the force simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationConfig {
	/// Multiplied with an edge's strength to get its spring coefficient.
	pub link_strength_scale: f64,
	pub link_distance: f64,
	/// Negative values repel.
	pub charge: f64,
	/// Barnes-Hut opening angle; 0 evaluates every pair exactly.
	pub theta: f64,
	pub distance_min: f64,
	pub collision_radius: f64,
	pub collision_strength: f64,
	pub collision_iterations: usize,
	pub center_strength: f64,
	pub velocity_decay: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	/// Alpha the simulation heats towards while a node is dragged.
	pub drag_alpha_target: f64,
	/// Alpha floor applied when a dragged node is released.
	pub release_alpha: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			link_strength_scale: 0.1,
			link_distance: 30.0,
			charge: -300.0,
			theta: 0.9,
			distance_min: 1.0,
			collision_radius: 15.0,
			collision_strength: 1.0,
			collision_iterations: 1,
			center_strength: 1.0,
			velocity_decay: 0.4,
			alpha_min: 0.001,
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			drag_alpha_target: 0.3,
			release_alpha: 0.3,
		}
	}
}

impl SimulationConfig {
	/// Clamp every field into a range the integrator can't blow up on.
	pub fn sanitized(self) -> Self {
		let defaults = Self::default();
		let finite_or = |value: f64, fallback: f64| {
			if value.is_finite() { value } else { fallback }
		};
		Self {
			link_strength_scale: finite_or(self.link_strength_scale, defaults.link_strength_scale)
				.clamp(0.0, 1.0),
			link_distance: finite_or(self.link_distance, defaults.link_distance).max(0.0),
			charge: finite_or(self.charge, defaults.charge),
			theta: finite_or(self.theta, defaults.theta).max(0.0),
			distance_min: finite_or(self.distance_min, defaults.distance_min).max(0.01),
			collision_radius: finite_or(self.collision_radius, defaults.collision_radius).max(0.0),
			collision_strength: finite_or(self.collision_strength, defaults.collision_strength)
				.clamp(0.0, 1.0),
			collision_iterations: self.collision_iterations.clamp(1, 8),
			center_strength: finite_or(self.center_strength, defaults.center_strength)
				.clamp(0.0, 1.0),
			velocity_decay: finite_or(self.velocity_decay, defaults.velocity_decay).clamp(0.0, 1.0),
			alpha_min: finite_or(self.alpha_min, defaults.alpha_min).clamp(0.0, 1.0),
			alpha_decay: finite_or(self.alpha_decay, defaults.alpha_decay).clamp(0.0, 1.0),
			drag_alpha_target: finite_or(self.drag_alpha_target, defaults.drag_alpha_target)
				.clamp(0.0, 1.0),
			release_alpha: finite_or(self.release_alpha, defaults.release_alpha).clamp(0.0, 1.0),
		}
	}
}
