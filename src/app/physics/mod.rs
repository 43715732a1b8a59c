mod quadtree;

use eframe::egui::{Vec2, vec2};

use super::graph::GraphScene;
use quadtree::Cell;

const BARNES_HUT_THETA: f32 = 0.72;
const REPULSION: f32 = 52_000.0;
const SOFTENING: f32 = 480.0;
const SPRING: f32 = 0.018;
const SPRING_DAMPING: f32 = 0.2;
const PREFERRED_EDGE_LENGTH: f32 = 150.0;
const COLLISION: f32 = 1.6;
const CENTER_PULL: f32 = 0.0012;
const DAMPING: f32 = 0.86;
const MAX_FORCE: f32 = 240.0;
const MAX_SPEED: f32 = 24.0;

#[derive(Default)]
pub(in crate::app) struct PhysicsScratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
}

// Antisymmetric so coincident pairs are pushed in opposite directions.
fn fallback_direction(a: usize, b: usize) -> Vec2 {
    let (low, high) = (a.min(b), a.max(b));
    let angle = ((low as f32) * 0.618_034 + (high as f32) * 0.414_214) * std::f32::consts::TAU;
    let direction = vec2(angle.cos(), angle.sin());
    if a < b { direction } else { -direction }
}

/// Repulsion from every other node, approximated per cell once it is far
/// enough away. Exact leaf visits also push apart overlapping pairs.
fn accumulate_repulsion(cell: &Cell, index: usize, positions: &[Vec2], min_gap: f32) -> Vec2 {
    if cell.mass <= 0.0 {
        return Vec2::ZERO;
    }
    let point = positions[index];

    if cell.is_leaf() {
        let mut force = Vec2::ZERO;
        for &other in &cell.points {
            if other == index {
                continue;
            }
            let delta = point - positions[other];
            let distance = delta.length();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                fallback_direction(index, other)
            };
            force += direction * (REPULSION / (distance * distance + SOFTENING));
            if distance < min_gap {
                force += direction * (min_gap - distance) * COLLISION;
            }
        }
        return force;
    }

    let delta = point - cell.center_of_mass;
    let distance_sq = delta.length_sq().max(0.0001);
    let distance = distance_sq.sqrt();
    if !cell.square.contains(point) && cell.square.side() / distance < BARNES_HUT_THETA {
        return (delta / distance) * (REPULSION * cell.mass / (distance_sq + SOFTENING));
    }

    cell.children
        .iter()
        .map(|child| accumulate_repulsion(child, index, positions, min_gap))
        .fold(Vec2::ZERO, |sum, force| sum + force)
}

/// Advances the force-directed simulation by one frame. Pinned nodes exert
/// forces but never move. Returns whether anything is still moving.
pub(in crate::app) fn step_physics(scene: &mut GraphScene, delta_seconds: f32) -> bool {
    let node_count = scene.nodes.len();
    if node_count < 2 {
        return false;
    }

    let scratch = &mut scene.physics_scratch;
    scratch.positions.clear();
    scratch
        .positions
        .extend(scene.nodes.iter().map(|node| node.world_pos));
    scratch.forces.clear();
    scratch.forces.resize(node_count, Vec2::ZERO);

    let min_gap = super::graph::NODE_RADIUS * 3.2;
    if let Some(tree) = Cell::build(&scratch.positions) {
        for (index, force) in scratch.forces.iter_mut().enumerate() {
            *force += accumulate_repulsion(&tree, index, &scratch.positions, min_gap);
        }
    }

    for edge in &scene.edges {
        let (from, to) = (edge.from, edge.to);
        if from == to || from >= node_count || to >= node_count {
            continue;
        }
        let delta = scene.nodes[from].world_pos - scene.nodes[to].world_pos;
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }
        let direction = delta / distance;
        let stretch = (distance - PREFERRED_EDGE_LENGTH) * SPRING;
        let closing = (scene.nodes[from].velocity - scene.nodes[to].velocity).dot(direction)
            * SPRING_DAMPING;
        let correction = direction * (stretch + closing);
        scratch.forces[from] -= correction;
        scratch.forces[to] += correction;
    }

    let step = (delta_seconds * 60.0).clamp(0.25, 3.0);
    let damping = DAMPING.powf(step);
    let mut any_motion = false;
    let mut any_pinned = false;

    for (node, force) in scene.nodes.iter_mut().zip(scratch.forces.iter().copied()) {
        if node.pinned {
            node.velocity = Vec2::ZERO;
            any_pinned = true;
            continue;
        }

        let mut force = force - node.world_pos * CENTER_PULL;
        if force.length() > MAX_FORCE {
            force = force.normalized() * MAX_FORCE;
        }

        let mut velocity = (node.velocity + force * (0.055 * step)) * damping;
        if velocity.length() > MAX_SPEED {
            velocity = velocity.normalized() * MAX_SPEED;
        }
        if velocity.length_sq() < 0.02 * 0.02 && force.length_sq() < 0.08 * 0.08 {
            velocity = Vec2::ZERO;
        }

        node.velocity = velocity;
        node.world_pos += velocity * step;
        any_motion |= velocity.length_sq() > 0.000_001;
    }

    if !any_pinned {
        let centroid = scene
            .nodes
            .iter()
            .fold(Vec2::ZERO, |sum, node| sum + node.world_pos)
            / node_count as f32;
        if centroid.length_sq() > 0.000_001 {
            for node in &mut scene.nodes {
                node.world_pos -= centroid;
            }
        }
    }

    any_motion
}
