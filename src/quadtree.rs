use bevy::log::debug;
use bevy::prelude::*;

use crate::body::Body;
use crate::forces::{ForceParams, pairwise_attraction};

/// Half-extents of the root region used when there are no bodies to enclose.
pub const DEFAULT_ROOT_HALF_SIZE: Vec2 = Vec2::new(400.0, 300.0);
/// Growth applied to the bodies' bounding box so none sit on the root edge.
pub const ROOT_MARGIN: f32 = 1.1;
/// Nodes this deep stop subdividing and hold any number of bodies.
pub const MAX_DEPTH: usize = 32;

/// Axis-aligned box described by its center and half-extents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
    pub center: Vec2,
    pub half_size: Vec2,
}

impl Region {
    pub fn new(center: Vec2, half_size: Vec2) -> Self {
        Self { center, half_size }
    }

    pub fn square(center: Vec2, half_width: f32) -> Self {
        Self::new(center, Vec2::splat(half_width))
    }

    /// Smallest margin-padded square covering every body, or a default box when empty.
    pub fn enclosing(bodies: &[Body]) -> Self {
        if bodies.is_empty() {
            return Self::new(Vec2::ZERO, DEFAULT_ROOT_HALF_SIZE);
        }

        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for body in bodies {
            min = min.min(body.position);
            max = max.max(body.position);
        }

        let size = (max - min).max(Vec2::splat(1.0));
        let max_dim = size.x.max(size.y) * ROOT_MARGIN;
        Self::square((min + max) / 2.0, max_dim / 2.0)
    }

    pub fn size(&self) -> Vec2 {
        self.half_size * 2.0
    }

    pub fn width(&self) -> f32 {
        self.half_size.x * 2.0
    }

    /// Closed-bounds containment: points on the edge are inside.
    pub fn contains(&self, point: Vec2) -> bool {
        let offset = (point - self.center).abs();
        offset.x <= self.half_size.x && offset.y <= self.half_size.y
    }

    pub fn intersects(&self, other: &Region) -> bool {
        let gap = (other.center - self.center).abs();
        let reach = self.half_size + other.half_size;
        gap.x <= reach.x && gap.y <= reach.y
    }

    /// Index of the quadrant holding `point`, in [`Region::sub_quadrant`] order.
    pub fn quadrant_index(&self, point: Vec2) -> usize {
        let right = point.x > self.center.x;
        let top = point.y > self.center.y;
        match (right, top) {
            (false, true) => 0,
            (true, true) => 1,
            (false, false) => 2,
            (true, false) => 3,
        }
    }

    /// Quadrant `index` in NW, NE, SW, SE order (y grows upward).
    pub fn sub_quadrant(&self, index: usize) -> Region {
        let half_size = self.half_size / 2.0;
        let center = match index {
            0 => self.center + vec2(-half_size.x, half_size.y),
            1 => self.center + vec2(half_size.x, half_size.y),
            2 => self.center + vec2(-half_size.x, -half_size.y),
            3 => self.center + vec2(half_size.x, -half_size.y),
            _ => self.center,
        };
        Region { center, half_size }
    }
}

/// How node aggregates are maintained and expanded during force evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Aggregation {
    /// Every node's mass and center cover its whole subtree. Leaves and
    /// directly-held bodies are summed body by body, skipping the probe.
    #[default]
    Subtree,
    /// Only bodies accepted directly by a node feed its aggregate, and a
    /// subdivided node that is too close recurses into its children alone.
    /// Bodies held by that node are then left out of the sum.
    DirectOnly,
}

/// A body's index in the caller's collection, with the state the tree needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeEntry {
    pub index: usize,
    pub position: Vec2,
    pub mass: f32,
}

impl TreeEntry {
    pub fn from_body(index: usize, body: &Body) -> Self {
        Self {
            index,
            position: body.position,
            mass: body.mass,
        }
    }
}

/// Quadtree node. Children are created once, on the first overflow, and never merged back.
#[derive(Debug)]
pub struct QuadTree {
    region: Region,
    capacity: usize,
    aggregation: Aggregation,
    depth: usize,
    entries: Vec<TreeEntry>,
    children: Option<Box<[QuadTree; 4]>>,
    total_mass: f32,
    center_of_mass: Vec2,
}

impl QuadTree {
    pub fn new(region: Region, capacity: usize, aggregation: Aggregation) -> Self {
        Self::with_depth(region, capacity, aggregation, 0)
    }

    fn with_depth(region: Region, capacity: usize, aggregation: Aggregation, depth: usize) -> Self {
        Self {
            region,
            capacity: capacity.max(1),
            aggregation,
            depth,
            entries: Vec::with_capacity(capacity),
            children: None,
            total_mass: 0.0,
            center_of_mass: Vec2::ZERO,
        }
    }

    /// Builds a tree over `bodies`, rooted at [`Region::enclosing`].
    pub fn build(bodies: &[Body], capacity: usize, aggregation: Aggregation) -> Self {
        let mut tree = Self::new(Region::enclosing(bodies), capacity, aggregation);
        let rejected = bodies
            .iter()
            .enumerate()
            .filter(|(index, body)| !tree.insert(TreeEntry::from_body(*index, body)))
            .count();
        if rejected > 0 {
            debug!(rejected, "bodies fell outside the quadtree root");
        }
        tree
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn children(&self) -> Option<&[QuadTree; 4]> {
        self.children.as_deref()
    }

    pub fn is_subdivided(&self) -> bool {
        self.children.is_some()
    }

    pub fn total_mass(&self) -> f32 {
        self.total_mass
    }

    pub fn center_of_mass(&self) -> Vec2 {
        self.center_of_mass
    }

    /// Returns false when the entry lies outside this node's region.
    pub fn insert(&mut self, entry: TreeEntry) -> bool {
        if !self.region.contains(entry.position) {
            return false;
        }
        self.insert_within(entry)
    }

    fn insert_within(&mut self, entry: TreeEntry) -> bool {
        if self.entries.len() < self.capacity || self.depth >= MAX_DEPTH {
            self.entries.push(entry);
            self.accumulate(&entry);
            return true;
        }

        let (region, capacity, aggregation, depth) =
            (self.region, self.capacity, self.aggregation, self.depth);
        let children = self.children.get_or_insert_with(|| {
            Box::new(std::array::from_fn(|quadrant| {
                QuadTree::with_depth(region.sub_quadrant(quadrant), capacity, aggregation, depth + 1)
            }))
        });

        // Child bounds are rebuilt from center and half-size, so a point on a
        // shared edge can miss all four by rounding.
        let accepted = children.iter_mut().any(|child| child.insert(entry))
            || children[region.quadrant_index(entry.position)].insert_within(entry);
        if accepted && self.aggregation == Aggregation::Subtree {
            self.accumulate(&entry);
        }
        accepted
    }

    fn accumulate(&mut self, entry: &TreeEntry) {
        let old_mass = self.total_mass;
        self.total_mass += entry.mass;
        self.center_of_mass =
            (self.center_of_mass * old_mass + entry.position * entry.mass) / self.total_mass;
    }

    /// Collects entries inside `range` from every node whose region meets it.
    pub fn query(&self, range: &Region) -> Vec<TreeEntry> {
        let mut found = Vec::new();
        self.query_into(range, &mut found);
        found
    }

    fn query_into(&self, range: &Region, found: &mut Vec<TreeEntry>) {
        if !self.region.intersects(range) {
            return;
        }
        found.extend(
            self.entries
                .iter()
                .filter(|entry| range.contains(entry.position)),
        );
        for child in self.children.iter().flat_map(|children| children.iter()) {
            child.query_into(range, found);
        }
    }

    /// Barnes-Hut force on `probe` from everything stored below this node.
    pub fn compute_force(&self, probe: &TreeEntry, params: &ForceParams) -> Vec2 {
        if self.total_mass == 0.0 {
            return Vec2::ZERO;
        }
        match self.aggregation {
            Aggregation::Subtree => self.subtree_force(probe, params),
            Aggregation::DirectOnly => self.direct_only_force(probe, params),
        }
    }

    fn subtree_force(&self, probe: &TreeEntry, params: &ForceParams) -> Vec2 {
        let Some(children) = &self.children else {
            return self.held_force(probe, params);
        };

        let distance = self.center_of_mass.distance(probe.position);
        if distance > 0.0 && self.region.width() / distance < params.theta {
            return self.point_mass_force(probe, params);
        }

        self.held_force(probe, params)
            + children
                .iter()
                .map(|child| child.compute_force(probe, params))
                .sum::<Vec2>()
    }

    fn direct_only_force(&self, probe: &TreeEntry, params: &ForceParams) -> Vec2 {
        let distance = self.center_of_mass.distance(probe.position);
        if distance == 0.0 {
            return Vec2::ZERO;
        }

        match &self.children {
            Some(children) if self.region.width() / distance >= params.theta => children
                .iter()
                .map(|child| child.compute_force(probe, params))
                .sum(),
            _ => self.point_mass_force(probe, params),
        }
    }

    fn point_mass_force(&self, probe: &TreeEntry, params: &ForceParams) -> Vec2 {
        pairwise_attraction(
            probe.position,
            probe.mass,
            self.center_of_mass,
            self.total_mass,
            params,
        )
    }

    fn held_force(&self, probe: &TreeEntry, params: &ForceParams) -> Vec2 {
        self.entries
            .iter()
            .filter(|entry| entry.index != probe.index)
            .map(|entry| {
                pairwise_attraction(probe.position, probe.mass, entry.position, entry.mass, params)
            })
            .sum()
    }
}
