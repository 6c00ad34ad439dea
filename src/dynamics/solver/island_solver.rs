//! Per-island step: the seven phases that turn one island's bodies, contacts
//! and joints from "start of step" to "end of step" state.

use crate::dynamics::graph::Island;
use crate::dynamics::joint::JointSet;
use crate::dynamics::rigid_body_set::RigidBodySet;
use crate::dynamics::solver::position_solver::PositionConstraint;
use crate::dynamics::solver::velocity_constraint::ContactVelocityConstraint;
use crate::dynamics::solver::{IntegrationParameters, Settings};
use crate::geometry::collision_data::CollisionDataMap;
use crate::math::{Point, Real, Vector};

/// Runs the full seven-phase step for one island.
pub fn solve_island(
    island: &Island,
    bodies: &mut RigidBodySet,
    joints: &mut JointSet,
    collisions: &mut CollisionDataMap,
    gravity: Vector,
    settings: &Settings,
    params: &IntegrationParameters,
) {
    // Phase 1: velocity integration (gravity, forces, torques, damping).
    integrate_velocities(island, bodies, gravity, params.dt);

    // Phase 2: contact constraint init + warm-start.
    let mut contact_constraints = Vec::with_capacity(island.contacts.len());
    for &(fixture_a, fixture_b) in &island.contacts {
        let Some(data) = collisions.get_mut(fixture_a, fixture_b) else {
            continue;
        };
        let Some(constraint) = &mut data.contact_constraint else {
            continue;
        };
        if !constraint.enabled || constraint.is_sensor {
            continue;
        }
        if let Some(prepared) = ContactVelocityConstraint::prepare(constraint, bodies, params) {
            prepared.warm_start(constraint, bodies);
            contact_constraints.push((fixture_a, fixture_b, prepared));
        }
    }

    // Phase 3: joint init (also re-applies each joint's warm-start impulse).
    for &handle in &island.joints {
        if let Some(joint) = joints.get_mut(handle) {
            joint.initialize_constraints(bodies, params);
        }
    }

    // Phase 4: velocity iterations, joints before contacts each sweep.
    for _ in 0..params.velocity_iterations {
        for &handle in &island.joints {
            if let Some(joint) = joints.get_mut(handle) {
                joint.solve_velocity_constraints(bodies, params);
            }
        }
        for (fixture_a, fixture_b, prepared) in &contact_constraints {
            if let Some(data) = collisions.get_mut(*fixture_a, *fixture_b) {
                if let Some(constraint) = &mut data.contact_constraint {
                    prepared.solve(constraint, bodies);
                }
            }
        }
    }

    // Phase 5: position integration. `previous_transform` is captured here,
    // immediately before the pose changes, so continuous collision
    // detection can sweep across exactly what this step actually moved.
    for &handle in &island.bodies {
        let Some(body) = bodies.get_mut(handle) else {
            continue;
        };
        if !body.body_type.participates_in_islands() || body.is_asleep() {
            continue;
        }
        body.previous_transform = body.transform;
        body.transform.translation.vector += body.linear_velocity * params.dt;
        let angle = body.transform.rotation.angle() + body.angular_velocity * params.dt;
        body.transform.rotation = crate::math::Rotation::new(angle);
    }

    // Phase 6: position iterations (NGS), joints then contacts, early exit
    // once everything in the island is within tolerance. `converged` tracks
    // that exit condition for phase 7: with zero position iterations there's
    // nothing to converge on, so it starts `true`.
    let position_constraints = build_position_constraints(&contact_constraints, collisions, bodies);
    let mut converged = true;
    for _ in 0..params.position_iterations {
        let mut joints_ok = true;
        for &handle in &island.joints {
            if let Some(joint) = joints.get_mut(handle) {
                joints_ok &= joint.solve_position_constraints(bodies, params);
            }
        }
        let mut min_separation = Real::MAX;
        for constraint in &position_constraints {
            let separation = constraint.solve(bodies, params);
            min_separation = min_separation.min(separation);
        }
        let contacts_ok = position_constraints.is_empty() || min_separation >= -3.0 * params.linear_slop;
        converged = joints_ok && contacts_ok;
        if converged {
            break;
        }
    }

    // Phase 7: at-rest detection, shared across the whole island so one
    // moving body keeps its sleeping neighbors awake. Gated on `converged`:
    // a stack whose velocities dip under tolerance while still settling
    // must not sleep until the position solve above actually agrees it's
    // done (see DESIGN.md's "Sleep determinism" note).
    update_sleep_state(island, bodies, settings, params.dt, converged);
}

/// Applies gravity, the accumulated one-shot force/torque, and every
/// still-live timed force/torque; clears the accumulators and drops expired
/// timed entries.
fn integrate_velocities(island: &Island, bodies: &mut RigidBodySet, gravity: Vector, dt: Real) {
    for &handle in &island.bodies {
        let Some(body) = bodies.get_mut(handle) else {
            continue;
        };
        if !body.body_type.participates_in_islands() || body.is_asleep() {
            continue;
        }

        let mut force = body.force;
        if body.inverse_mass > 0.0 {
            force += gravity * body.mass;
        }
        let mut torque = body.torque;

        body.timed_forces.retain_mut(|f| {
            force += f.force;
            !f.is_complete(dt)
        });
        body.timed_torques.retain_mut(|t| {
            torque += t.torque;
            !t.is_complete(dt)
        });

        body.linear_velocity += force * body.inverse_mass * dt;
        body.angular_velocity += torque * body.inverse_inertia * dt;

        body.linear_velocity *= 1.0 / (1.0 + dt * body.linear_damping);
        body.angular_velocity *= 1.0 / (1.0 + dt * body.angular_damping);

        body.force = Vector::zeros();
        body.torque = 0.0;
    }
}

fn build_position_constraints(
    contact_constraints: &[(crate::geometry::collision_data::FixtureHandle, crate::geometry::collision_data::FixtureHandle, ContactVelocityConstraint)],
    collisions: &CollisionDataMap,
    bodies: &RigidBodySet,
) -> Vec<PositionConstraint> {
    let mut out = Vec::new();
    for (fixture_a, fixture_b, prepared) in contact_constraints {
        let Some(data) = collisions.get(*fixture_a, *fixture_b) else {
            continue;
        };
        let Some(constraint) = &data.contact_constraint else {
            continue;
        };
        let Some(body_a) = bodies.get(prepared.body_a) else {
            continue;
        };
        let Some(body_b) = bodies.get(prepared.body_b) else {
            continue;
        };
        for point in &constraint.points {
            let local_anchor_a: Point = body_a.transform.inverse() * point.point;
            let local_anchor_b: Point = body_b.transform.inverse() * point.point;
            out.push(PositionConstraint {
                body_a: prepared.body_a,
                body_b: prepared.body_b,
                local_anchor_a,
                local_anchor_b,
                normal: constraint.normal,
                separation_at_prepare: -point.depth,
            });
        }
    }
    out
}

fn update_sleep_state(island: &Island, bodies: &mut RigidBodySet, settings: &Settings, dt: Real, converged: bool) {
    if !settings.at_rest_detection_enabled {
        return;
    }

    let mut min_at_rest = Real::MAX;
    let mut any_dynamic = false;
    for &handle in &island.bodies {
        let Some(body) = bodies.get_mut(handle) else {
            continue;
        };
        if !body.body_type.participates_in_islands() {
            continue;
        }
        any_dynamic = true;

        let under_linear_tolerance = body.linear_velocity.norm_squared() <= settings.at_rest_linear_tolerance * settings.at_rest_linear_tolerance;
        let under_angular_tolerance = body.angular_velocity.abs() <= settings.at_rest_angular_tolerance;
        if !body.flags.contains(crate::dynamics::rigid_body::BodyFlags::AUTO_SLEEP) || !under_linear_tolerance || !under_angular_tolerance {
            body.at_rest_time = 0.0;
        } else {
            body.at_rest_time += dt;
        }
        min_at_rest = min_at_rest.min(body.at_rest_time);
    }

    if any_dynamic && converged && min_at_rest >= settings.min_at_rest_time {
        for &handle in &island.bodies {
            if let Some(body) = bodies.get_mut(handle) {
                if body.body_type.participates_in_islands() {
                    body.sleep();
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::fixture::FixtureBuilder;
    use crate::dynamics::graph::Island;
    use crate::dynamics::rigid_body::{Body, BodyType};
    use crate::geometry::shape::Polygon;

    #[test]
    fn free_fall_body_gains_downward_velocity_and_moves() {
        let mut bodies = RigidBodySet::new();
        let mut body = Body::new(BodyType::Dynamic);
        body.fixtures.push(Some(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build()));
        body.recompute_mass();
        let handle = bodies.insert(body);

        let island = Island {
            bodies: vec![handle],
            contacts: vec![],
            joints: vec![],
        };
        let mut joints = JointSet::new();
        let mut collisions = CollisionDataMap::new();
        let settings = Settings::default();
        let params = IntegrationParameters::from_settings(1.0 / 60.0, &settings);

        solve_island(&island, &mut bodies, &mut joints, &mut collisions, Vector::new(0.0, -10.0), &settings, &params);

        let body = bodies.get(handle).unwrap();
        assert!(body.linear_velocity.y < 0.0);
        assert!(body.transform.translation.vector.y < 0.0);
    }

    #[test]
    fn slow_settled_body_eventually_sleeps() {
        let mut bodies = RigidBodySet::new();
        let mut body = Body::new(BodyType::Dynamic);
        body.fixtures.push(Some(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build()));
        body.recompute_mass();
        let handle = bodies.insert(body);

        let island = Island {
            bodies: vec![handle],
            contacts: vec![],
            joints: vec![],
        };
        let mut joints = JointSet::new();
        let mut collisions = CollisionDataMap::new();
        let mut settings = Settings::default();
        settings.min_at_rest_time = 0.1;
        let params = IntegrationParameters::from_settings(1.0 / 60.0, &settings);

        for _ in 0..10 {
            solve_island(&island, &mut bodies, &mut joints, &mut collisions, Vector::zeros(), &settings, &params);
        }

        assert!(bodies.get(handle).unwrap().is_asleep());
    }
}
