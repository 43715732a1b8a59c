use std::collections::HashMap;

use eframe::egui::{Color32, Vec2, vec2};

use crate::palette::NodeShape;
use crate::supply::{Facility, FacilityType, MovementStatus};
use crate::transform::GraphElements;
use crate::util::stable_pair;

use super::super::physics::PhysicsScratch;

pub(in crate::app) struct SceneNode {
    pub(in crate::app) id: String,
    pub(in crate::app) label: String,
    pub(in crate::app) kind: FacilityType,
    pub(in crate::app) details: Facility,
    pub(in crate::app) color: Color32,
    pub(in crate::app) shape: NodeShape,
    pub(in crate::app) world_pos: Vec2,
    pub(in crate::app) velocity: Vec2,
    pub(in crate::app) pinned: bool,
}

pub(in crate::app) struct SceneEdge {
    pub(in crate::app) id: String,
    pub(in crate::app) from: usize,
    pub(in crate::app) to: usize,
    pub(in crate::app) label: String,
    pub(in crate::app) status: MovementStatus,
    pub(in crate::app) color: Color32,
    pub(in crate::app) weight: u8,
}

/// Index-based copy of the element set the graph engine renders.
///
/// `outgoing`/`incoming` hold edge indices per node so several movements
/// between the same pair of facilities stay distinct.
#[derive(Default)]
pub(in crate::app) struct GraphScene {
    pub(in crate::app) nodes: Vec<SceneNode>,
    pub(in crate::app) edges: Vec<SceneEdge>,
    pub(in crate::app) index_by_id: HashMap<String, usize>,
    pub(in crate::app) outgoing: Vec<Vec<usize>>,
    pub(in crate::app) incoming: Vec<Vec<usize>>,
    pub(in crate::app) physics_scratch: PhysicsScratch,
}

fn seed_position(id: &str, index: usize) -> Vec2 {
    let (jx, jy) = stable_pair(id);
    let direction = vec2(jx, jy);
    let direction = if direction.length_sq() <= 0.0001 {
        let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    } else {
        direction.normalized()
    };
    direction * (60.0 + (index as f32 * 9.0))
}

impl GraphScene {
    /// Builds a scene from resolved elements, keeping the position, velocity
    /// and pin of every node that already existed in `prior`.
    pub(in crate::app) fn from_elements(elements: &GraphElements, prior: Option<GraphScene>) -> Self {
        let mut previous = prior
            .map(|scene| {
                scene
                    .nodes
                    .into_iter()
                    .map(|node| (node.id.clone(), node))
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();

        let nodes = elements
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let (world_pos, velocity, pinned) = previous
                    .remove(&node.id)
                    .map(|old| (old.world_pos, old.velocity, old.pinned))
                    .unwrap_or_else(|| (seed_position(&node.id, index), Vec2::ZERO, false));
                SceneNode {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    kind: node.kind.clone(),
                    details: node.details.clone(),
                    color: node.color,
                    shape: node.shape,
                    world_pos,
                    velocity,
                    pinned,
                }
            })
            .collect::<Vec<_>>();

        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect::<HashMap<_, _>>();

        let mut edges = Vec::with_capacity(elements.edges.len());
        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        for edge in &elements.edges {
            let (Some(&from), Some(&to)) =
                (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
            else {
                tracing::debug!(edge = %edge.id, "skipping edge with unresolved endpoint");
                continue;
            };
            outgoing[from].push(edges.len());
            incoming[to].push(edges.len());
            edges.push(SceneEdge {
                id: edge.id.clone(),
                from,
                to,
                label: edge.label.clone(),
                status: edge.status,
                color: edge.color,
                weight: edge.weight,
            });
        }

        Self {
            nodes,
            edges,
            index_by_id,
            outgoing,
            incoming,
            physics_scratch: PhysicsScratch::default(),
        }
    }

    pub(in crate::app) fn degree(&self, index: usize) -> usize {
        self.outgoing.get(index).map_or(0, Vec::len) + self.incoming.get(index).map_or(0, Vec::len)
    }

    pub(in crate::app) fn positions(&self) -> Vec<Vec2> {
        self.nodes.iter().map(|node| node.world_pos).collect()
    }

    pub(in crate::app) fn centroid(&self) -> Vec2 {
        if self.nodes.is_empty() {
            return Vec2::ZERO;
        }
        self.nodes
            .iter()
            .fold(Vec2::ZERO, |sum, node| sum + node.world_pos)
            / self.nodes.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supply::MovementStatus;
    use crate::transform::tests::{movement, scenario_facilities};
    use crate::transform::to_elements;

    #[test]
    fn indexes_edges_by_endpoint() {
        let elements = to_elements(
            &scenario_facilities(),
            &[
                movement("M1", "F1", "F2", MovementStatus::InTransit),
                movement("M3", "F1", "F2", MovementStatus::Completed),
                movement("M2", "F1", "F9", MovementStatus::Scheduled),
            ],
        );
        let scene = GraphScene::from_elements(&elements, None);

        assert_eq!(scene.nodes.len(), 2);
        assert_eq!(scene.edges.len(), 2);
        assert_eq!(scene.outgoing[0], vec![0, 1]);
        assert_eq!(scene.incoming[1], vec![0, 1]);
        assert_eq!(scene.degree(0), 2);
    }

    #[test]
    fn rebuild_keeps_existing_positions() {
        let elements = to_elements(&scenario_facilities(), &[]);
        let mut scene = GraphScene::from_elements(&elements, None);
        scene.nodes[1].world_pos = vec2(321.0, -12.0);
        scene.nodes[1].pinned = true;

        let only_f2 = crate::transform::filter_by_query(&elements, "depot");
        let rebuilt = GraphScene::from_elements(&only_f2, Some(scene));
        assert_eq!(rebuilt.nodes.len(), 1);
        assert_eq!(rebuilt.nodes[0].world_pos, vec2(321.0, -12.0));
        assert!(rebuilt.nodes[0].pinned);
        assert_eq!(rebuilt.index_by_id.get("F2"), Some(&0));
    }
}
