//! Point quadtree used for Barnes-Hut repulsion and collision candidate lookup.

const LEAF_CAPACITY: usize = 8;
const MAX_DEPTH: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadBounds {
	pub cx: f64,
	pub cy: f64,
	pub half_extent: f64,
}

impl QuadBounds {
	fn from_points(points: &[(f64, f64)]) -> Option<Self> {
		let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
		let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
		for &(x, y) in points {
			min_x = min_x.min(x);
			min_y = min_y.min(y);
			max_x = max_x.max(x);
			max_y = max_y.max(y);
		}
		if !min_x.is_finite() || !min_y.is_finite() || !max_x.is_finite() || !max_y.is_finite() {
			return None;
		}

		let span = (max_x - min_x).max(max_y - min_y).max(1.0);
		Some(Self {
			cx: (min_x + max_x) * 0.5,
			cy: (min_y + max_y) * 0.5,
			half_extent: span * 0.5 + 1.0,
		})
	}

	pub fn contains(self, x: f64, y: f64) -> bool {
		(x - self.cx).abs() <= self.half_extent && (y - self.cy).abs() <= self.half_extent
	}

	pub fn side_length(self) -> f64 {
		self.half_extent * 2.0
	}

	/// Squared distance from a point to the nearest point of the cell.
	pub fn distance_sq_to(self, x: f64, y: f64) -> f64 {
		let dx = ((x - self.cx).abs() - self.half_extent).max(0.0);
		let dy = ((y - self.cy).abs() - self.half_extent).max(0.0);
		dx * dx + dy * dy
	}

	fn child(self, quadrant: usize) -> Self {
		let quarter = self.half_extent * 0.5;
		let (ox, oy) = match quadrant {
			0 => (-quarter, -quarter),
			1 => (quarter, -quarter),
			2 => (-quarter, quarter),
			_ => (quarter, quarter),
		};
		Self {
			cx: self.cx + ox,
			cy: self.cy + oy,
			half_extent: quarter,
		}
	}

	fn quadrant_for(self, x: f64, y: f64) -> usize {
		match (x >= self.cx, y >= self.cy) {
			(false, false) => 0,
			(true, false) => 1,
			(false, true) => 2,
			(true, true) => 3,
		}
	}
}

pub struct QuadNode {
	pub bounds: QuadBounds,
	pub com_x: f64,
	pub com_y: f64,
	/// Number of points below this cell.
	pub count: usize,
	pub indices: Vec<usize>,
	pub children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
	pub fn build(points: &[(f64, f64)]) -> Option<Self> {
		let bounds = QuadBounds::from_points(points)?;
		let indices = (0..points.len()).collect();
		Some(Self::build_node(bounds, indices, points, 0))
	}

	fn build_node(bounds: QuadBounds, indices: Vec<usize>, points: &[(f64, f64)], depth: usize) -> Self {
		let (mut sx, mut sy) = (0.0, 0.0);
		for &i in &indices {
			sx += points[i].0;
			sy += points[i].1;
		}
		let count = indices.len();
		let (com_x, com_y) = if count > 0 {
			(sx / count as f64, sy / count as f64)
		} else {
			(bounds.cx, bounds.cy)
		};

		let mut node = Self {
			bounds,
			com_x,
			com_y,
			count,
			indices,
			children: std::array::from_fn(|_| None),
		};
		if depth >= MAX_DEPTH || node.indices.len() <= LEAF_CAPACITY {
			return node;
		}

		let mut buckets: [Vec<usize>; 4] = std::array::from_fn(|_| Vec::new());
		for &i in &node.indices {
			buckets[bounds.quadrant_for(points[i].0, points[i].1)].push(i);
		}
		// coincident points can't be split any further
		if buckets.iter().filter(|b| !b.is_empty()).count() <= 1 {
			return node;
		}

		for (quadrant, bucket) in buckets.into_iter().enumerate() {
			if bucket.is_empty() {
				continue;
			}
			node.children[quadrant] = Some(Box::new(Self::build_node(
				bounds.child(quadrant),
				bucket,
				points,
				depth + 1,
			)));
		}
		node.indices.clear();
		node
	}

	pub fn is_leaf(&self) -> bool {
		self.children.iter().all(Option::is_none)
	}

	/// Visit every point index in a leaf whose cell lies within `radius` of (x, y).
	pub fn visit_near(&self, x: f64, y: f64, radius: f64, visit: &mut impl FnMut(usize)) {
		if self.bounds.distance_sq_to(x, y) > radius * radius {
			return;
		}
		if self.is_leaf() {
			self.indices.iter().copied().for_each(&mut *visit);
			return;
		}
		for child in self.children.iter().flatten() {
			child.visit_near(x, y, radius, visit);
		}
	}
}
