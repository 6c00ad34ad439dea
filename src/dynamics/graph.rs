//! The constraint graph (bodies as nodes, contact constraints and joints as
//! edges) and the DFS island extraction run once per step before solving.

use std::collections::{HashMap, HashSet};

use crate::dynamics::joint::{Joint, JointDef, JointHandle, JointSet};
use crate::dynamics::rigid_body_set::{BodyHandle, RigidBodySet};
use crate::geometry::collision_data::{CollisionDataMap, FixtureHandle, PairKey};

enum EdgeKind {
    Contact { pair: (FixtureHandle, FixtureHandle) },
    Joint { joint: JointHandle },
}

struct Edge {
    other: BodyHandle,
    kind: EdgeKind,
}

/// An undirected multigraph over bodies, rebuilt fresh every step from the
/// current manifold-collision pairs and the live joint set.
#[derive(Default)]
pub struct ConstraintGraph {
    edges: HashMap<BodyHandle, Vec<Edge>>,
}

impl ConstraintGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_edge(&mut self, from: BodyHandle, to: BodyHandle, kind: EdgeKind) {
        self.edges.entry(from).or_default().push(Edge { other: to, kind });
    }

    /// Rebuilds the graph: one edge per enabled, non-sensor manifold
    /// collision, and one per enabled joint.
    pub fn rebuild(&mut self, collisions: &CollisionDataMap, joints: &JointSet) {
        self.edges.clear();

        for data in collisions.iter() {
            if !data.is_manifold_collision() {
                continue;
            }
            let Some(constraint) = &data.contact_constraint else {
                continue;
            };
            if !constraint.enabled || constraint.is_sensor {
                continue;
            }
            let (a, _) = data.fixture_a;
            let (b, _) = data.fixture_b;
            self.push_edge(a, b, EdgeKind::Contact { pair: (data.fixture_a, data.fixture_b) });
            self.push_edge(b, a, EdgeKind::Contact { pair: (data.fixture_a, data.fixture_b) });
        }

        for (handle, joint) in joints.iter() {
            if !joint.is_enabled() {
                continue;
            }
            let (a, b) = joint.bodies();
            self.push_edge(a, b, EdgeKind::Joint { joint: handle });
            self.push_edge(b, a, EdgeKind::Joint { joint: handle });
        }
    }

    fn neighbors(&self, body: BodyHandle) -> &[Edge] {
        self.edges.get(&body).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One maximal connected component of the constraint graph, ready to hand to
/// the island solver.
#[derive(Default)]
pub struct Island {
    pub bodies: Vec<BodyHandle>,
    pub contacts: Vec<(FixtureHandle, FixtureHandle)>,
    pub joints: Vec<JointHandle>,
}

/// Runs island extraction over every enabled, awake, non-static body not yet
/// assigned to an island. Static bodies act as cut vertices: they may appear
/// in many islands but never propagate the DFS further.
pub fn extract_islands(graph: &ConstraintGraph, bodies: &RigidBodySet) -> Vec<Island> {
    let mut visited: HashSet<BodyHandle> = HashSet::new();
    let mut islands = Vec::new();

    let seeds: Vec<BodyHandle> = bodies
        .iter()
        .filter(|(_, body)| body.is_enabled() && !body.is_asleep() && !body.is_static())
        .map(|(handle, _)| handle)
        .collect();

    for seed in seeds {
        if visited.contains(&seed) {
            continue;
        }

        let mut island = Island::default();
        let mut contact_seen: HashSet<PairKey> = HashSet::new();
        let mut joint_seen: HashSet<JointHandle> = HashSet::new();
        let mut island_statics: HashSet<BodyHandle> = HashSet::new();
        let mut stack = vec![seed];

        while let Some(current) = stack.pop() {
            let Some(body) = bodies.get(current) else {
                continue;
            };

            if body.is_static() {
                if island_statics.insert(current) {
                    island.bodies.push(current);
                }
                continue;
            }

            if !visited.insert(current) {
                continue;
            }
            island.bodies.push(current);

            for edge in graph.neighbors(current) {
                match &edge.kind {
                    EdgeKind::Contact { pair } => {
                        let key = PairKey::new(pair.0, pair.1);
                        if contact_seen.insert(key) {
                            island.contacts.push(*pair);
                        }
                    }
                    EdgeKind::Joint { joint } => {
                        if joint_seen.insert(*joint) {
                            island.joints.push(*joint);
                        }
                    }
                }
                stack.push(edge.other);
            }
        }

        islands.push(island);
    }

    islands
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::joint::{DistanceJoint, JointDef};
    use crate::dynamics::rigid_body::{Body, BodyType};
    use crate::math::Point;

    #[test]
    fn two_joint_connected_bodies_form_one_island() {
        let mut bodies = RigidBodySet::new();
        let a = bodies.insert(Body::new(BodyType::Dynamic));
        let b = bodies.insert(Body::new(BodyType::Dynamic));

        let mut joints = JointSet::new();
        joints.insert(JointDef::Distance(DistanceJoint::new(a, b, Point::origin(), Point::origin(), 1.0)));

        let collisions = CollisionDataMap::new();
        let mut graph = ConstraintGraph::new();
        graph.rebuild(&collisions, &joints);

        let islands = extract_islands(&graph, &bodies);
        assert_eq!(islands.len(), 1);
        assert_eq!(islands[0].bodies.len(), 2);
    }

    #[test]
    fn disconnected_bodies_form_separate_islands() {
        let mut bodies = RigidBodySet::new();
        bodies.insert(Body::new(BodyType::Dynamic));
        bodies.insert(Body::new(BodyType::Dynamic));

        let collisions = CollisionDataMap::new();
        let joints = JointSet::new();
        let mut graph = ConstraintGraph::new();
        graph.rebuild(&collisions, &joints);

        let islands = extract_islands(&graph, &bodies);
        assert_eq!(islands.len(), 2);
    }

    #[test]
    fn a_shared_static_body_does_not_merge_two_islands() {
        let mut bodies = RigidBodySet::new();
        let ground = bodies.insert(Body::new(BodyType::Static));
        let a = bodies.insert(Body::new(BodyType::Dynamic));
        let b = bodies.insert(Body::new(BodyType::Dynamic));

        let mut joints = JointSet::new();
        joints.insert(JointDef::Distance(DistanceJoint::new(ground, a, Point::origin(), Point::origin(), 1.0)));
        joints.insert(JointDef::Distance(DistanceJoint::new(ground, b, Point::origin(), Point::origin(), 1.0)));

        let collisions = CollisionDataMap::new();
        let mut graph = ConstraintGraph::new();
        graph.rebuild(&collisions, &joints);

        let islands = extract_islands(&graph, &bodies);
        assert_eq!(islands.len(), 2);
        for island in &islands {
            assert!(island.bodies.contains(&ground));
        }
    }
}
