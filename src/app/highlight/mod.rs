use std::collections::HashSet;

use super::graph::GraphScene;

/// The selected node, every edge touching it and the nodes on the far end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct HighlightState {
    pub(in crate::app) node: usize,
    pub(in crate::app) neighbors: HashSet<usize>,
    pub(in crate::app) edges: HashSet<usize>,
}

impl HighlightState {
    pub(in crate::app) fn contains_node(&self, index: usize) -> bool {
        self.node == index || self.neighbors.contains(&index)
    }
}

pub(in crate::app) fn build_highlight_state(scene: &GraphScene, selected: usize) -> Option<HighlightState> {
    if selected >= scene.nodes.len() {
        return None;
    }

    let mut state = HighlightState {
        node: selected,
        ..HighlightState::default()
    };

    for &edge_index in scene.outgoing[selected].iter().chain(&scene.incoming[selected]) {
        let Some(edge) = scene.edges.get(edge_index) else {
            continue;
        };
        state.edges.insert(edge_index);
        let other = if edge.from == selected { edge.to } else { edge.from };
        if other != selected {
            state.neighbors.insert(other);
        }
    }

    Some(state)
}

pub(in crate::app) fn build_highlight_state_for_id(scene: &GraphScene, selected_id: &str) -> Option<HighlightState> {
    let &index = scene.index_by_id.get(selected_id)?;
    build_highlight_state(scene, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supply::{FacilityType, MovementStatus};
    use crate::transform::tests::{facility, movement, scenario_facilities};
    use crate::transform::to_elements;

    #[test]
    fn selection_covers_direct_edges_only() {
        let mut facilities = scenario_facilities();
        facilities.push(facility("F3", "F3 Store", FacilityType::Showroom, 13.0, 80.1));
        let elements = to_elements(
            &facilities,
            &[
                movement("M1", "F1", "F2", MovementStatus::InTransit),
                movement("M2", "F2", "F3", MovementStatus::Completed),
            ],
        );
        let scene = GraphScene::from_elements(&elements, None);

        let Some(state) = build_highlight_state_for_id(&scene, "F1") else {
            panic!("F1 should resolve");
        };
        assert_eq!(state.node, 0);
        assert_eq!(state.edges, HashSet::from([0]));
        assert_eq!(state.neighbors, HashSet::from([1]));
        assert!(!state.contains_node(2));

        let Some(middle) = build_highlight_state_for_id(&scene, "F2") else {
            panic!("F2 should resolve");
        };
        assert_eq!(middle.edges, HashSet::from([0, 1]));
        assert_eq!(middle.neighbors, HashSet::from([0, 2]));
    }

    #[test]
    fn unknown_id_has_no_highlight() {
        let scene = GraphScene::from_elements(&to_elements(&scenario_facilities(), &[]), None);
        assert!(build_highlight_state_for_id(&scene, "F9").is_none());
    }
}
