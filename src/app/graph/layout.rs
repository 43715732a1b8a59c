use std::collections::VecDeque;
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};

use super::GraphScene;

const SPACING: f32 = 130.0;
const TRANSITION_SECS: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LayoutKind {
    BreadthFirst,
    Grid,
    ForceDirected,
    Concentric,
    Circle,
}

impl LayoutKind {
    pub(crate) const ALL: [LayoutKind; 5] = [
        Self::BreadthFirst,
        Self::Grid,
        Self::ForceDirected,
        Self::Concentric,
        Self::Circle,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::BreadthFirst => "breadthfirst",
            Self::Grid => "grid",
            Self::ForceDirected => "cose",
            Self::Concentric => "concentric",
            Self::Circle => "circle",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::BreadthFirst => "Hierarchy",
            Self::Grid => "Grid",
            Self::ForceDirected => "Force",
            Self::Concentric => "Concentric",
            Self::Circle => "Circle",
        }
    }

    /// Fixed target positions, or `None` for the simulated layout.
    pub(in crate::app) fn targets(self, scene: &GraphScene) -> Option<Vec<Vec2>> {
        let count = scene.nodes.len();
        match self {
            Self::BreadthFirst => Some(breadth_first(scene)),
            Self::Grid => Some(grid(count)),
            Self::Concentric => Some(concentric(scene)),
            Self::Circle => Some(circle(count)),
            Self::ForceDirected => None,
        }
    }
}

fn centered(index: usize, count: usize) -> f32 {
    index as f32 - (count.saturating_sub(1) as f32 * 0.5)
}

/// Rows by BFS depth from the source-only nodes; disconnected parts start
/// their own tree at depth zero.
fn breadth_first(scene: &GraphScene) -> Vec<Vec2> {
    let count = scene.nodes.len();
    let mut depth = vec![usize::MAX; count];
    let (sources, rest): (Vec<usize>, Vec<usize>) = (0..count)
        .partition(|&index| scene.incoming[index].is_empty() && !scene.outgoing[index].is_empty());
    let roots = sources.into_iter().chain(rest);

    for root in roots {
        if depth[root] != usize::MAX {
            continue;
        }
        depth[root] = 0;
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            for &edge in &scene.outgoing[current] {
                let next = scene.edges[edge].to;
                if depth[next] == usize::MAX {
                    depth[next] = depth[current] + 1;
                    queue.push_back(next);
                }
            }
        }
    }

    let levels = depth.iter().copied().max().map_or(0, |deepest| deepest + 1);
    let mut rows = vec![Vec::new(); levels];
    for (index, &level) in depth.iter().enumerate() {
        rows[level].push(index);
    }

    let mut positions = vec![Vec2::ZERO; count];
    for (level, row) in rows.iter().enumerate() {
        for (slot, &index) in row.iter().enumerate() {
            positions[index] = vec2(
                centered(slot, row.len()) * SPACING,
                centered(level, levels) * SPACING * 1.3,
            );
        }
    }
    positions
}

fn grid(count: usize) -> Vec<Vec2> {
    let columns = (count as f32).sqrt().ceil().max(1.0) as usize;
    let rows = count.div_ceil(columns);
    (0..count)
        .map(|index| {
            vec2(
                centered(index % columns, columns) * SPACING,
                centered(index / columns, rows) * SPACING,
            )
        })
        .collect()
}

/// Highest degree in the middle; ring `k` holds up to `6k` nodes.
fn concentric(scene: &GraphScene) -> Vec<Vec2> {
    let count = scene.nodes.len();
    let mut order = (0..count).collect::<Vec<_>>();
    order.sort_by(|&a, &b| scene.degree(b).cmp(&scene.degree(a)).then(a.cmp(&b)));

    let mut positions = vec![Vec2::ZERO; count];
    let mut placed = 0;
    let mut ring = 0usize;
    while placed < count {
        let capacity = if ring == 0 { 1 } else { ring * 6 };
        let members = &order[placed..(placed + capacity).min(count)];
        let radius = ring as f32 * SPACING;
        for (slot, &index) in members.iter().enumerate() {
            let angle = -FRAC_PI_2 + (slot as f32 / members.len() as f32) * TAU;
            positions[index] = vec2(angle.cos(), angle.sin()) * radius;
        }
        placed += members.len();
        ring += 1;
    }
    positions
}

fn circle(count: usize) -> Vec<Vec2> {
    let radius = (count as f32 * SPACING / TAU).max(SPACING);
    (0..count)
        .map(|index| {
            let angle = -FRAC_PI_2 + (index as f32 / count.max(1) as f32) * TAU;
            vec2(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
    }
}

/// Eased move of every node from where it was to its layout target.
pub(in crate::app) struct LayoutTransition {
    from: Vec<Vec2>,
    to: Vec<Vec2>,
    started_at: f64,
}

impl LayoutTransition {
    pub(in crate::app) fn new(from: Vec<Vec2>, to: Vec<Vec2>, started_at: f64) -> Self {
        Self { from, to, started_at }
    }

    pub(in crate::app) fn target(&self, index: usize) -> Option<Vec2> {
        self.to.get(index).copied()
    }

    fn progress(&self, now: f64) -> f32 {
        (((now - self.started_at) / TRANSITION_SECS).clamp(0.0, 1.0)) as f32
    }

    /// Writes interpolated positions into the scene; returns `true` once finished.
    pub(in crate::app) fn apply(&self, scene: &mut GraphScene, now: f64) -> bool {
        let t = self.progress(now);
        let eased = ease_in_out(t);
        for ((node, from), to) in scene.nodes.iter_mut().zip(&self.from).zip(&self.to) {
            node.world_pos = *from + (*to - *from) * eased;
            node.velocity = Vec2::ZERO;
        }
        t >= 1.0
    }
}
