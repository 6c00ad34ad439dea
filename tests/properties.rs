//! General invariants that should hold across many scenarios, rather than
//! one literal end-to-end story.

use kinetix2d::dynamics::DistanceJoint;
use kinetix2d::errors::PhysicsError;
use kinetix2d::math::{Isometry, Point, Vector};
use kinetix2d::{Aabb, BodyType, Circle, FixtureBuilder, JointDef, Polygon, RigidBodyBuilder, World};

fn dynamic_box(world: &mut World, translation: Vector) -> kinetix2d::BodyHandle {
    world
        .add_body(
            RigidBodyBuilder::new(BodyType::Dynamic)
                .translation(translation)
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build())
                .build(),
        )
        .unwrap()
}

#[test]
fn stepping_with_zero_elapsed_time_is_a_no_op() {
    let mut world = World::new();
    world.set_gravity(Vector::new(0.0, -9.8));
    let body = dynamic_box(&mut world, Vector::new(0.0, 5.0));

    let before = world.get_body(body).unwrap().transform.translation.vector;
    let stepped = world.update(0.0);
    let after = world.get_body(body).unwrap().transform.translation.vector;

    assert!(!stepped, "zero elapsed time should not consume a fixed step");
    assert_eq!(before, after);
}

#[test]
fn add_then_remove_leaves_the_world_empty_and_reusable() {
    let mut world = World::new();
    let body = dynamic_box(&mut world, Vector::zeros());
    assert!(world.get_body(body).is_some());

    world.remove_body(body, false).unwrap();
    assert!(world.get_body(body).is_none());
    assert_eq!(world.bodies().count(), 0);

    // Re-adding after removal succeeds and yields a distinct, live handle.
    let reborn = dynamic_box(&mut world, Vector::zeros());
    assert!(world.get_body(reborn).is_some());
}

#[test]
fn removing_a_body_drops_its_tracked_contacts() {
    let mut world = World::new();
    world.set_gravity(Vector::zeros());
    let a = dynamic_box(&mut world, Vector::zeros());
    let b = dynamic_box(&mut world, Vector::new(0.2, 0.0));
    world.refresh_contacts();
    assert!(world.is_in_contact((a, 0), (b, 0)));

    world.remove_body(a, false).unwrap();
    assert!(!world.is_in_contact((a, 0), (b, 0)));
    assert_eq!(world.get_contacts().count(), 0);
}

#[test]
fn joint_with_an_unknown_body_is_rejected_and_the_world_is_unchanged() {
    let mut world = World::new();
    let a = dynamic_box(&mut world, Vector::zeros());

    // A handle to a body that has since been removed: same slot, stale
    // generation, so it no longer names a member of `world`.
    let stray = dynamic_box(&mut world, Vector::new(10.0, 0.0));
    world.remove_body(stray, false).unwrap();

    let before = world.joints().count();
    let result = world.add_joint(JointDef::Distance(DistanceJoint::builder(a, stray).build()));
    assert_eq!(result, Err(PhysicsError::MembershipViolation));
    assert_eq!(world.joints().count(), before);
}

#[test]
fn coincident_bodies_produce_a_finite_nonnegative_penetration_and_unit_normal() {
    let mut world = World::new();
    world.set_gravity(Vector::zeros());
    let a = dynamic_box(&mut world, Vector::zeros());
    let _b = dynamic_box(&mut world, Vector::zeros());
    world.refresh_contacts();

    let body = world.get_body(a).unwrap();
    assert!(!body.transform.translation.vector.x.is_nan());

    for data in world.get_contacts() {
        if let Some(pen) = &data.penetration {
            assert!(pen.depth >= 0.0 && pen.depth.is_finite());
            assert!((pen.normal.norm() - 1.0).abs() < 1.0e-3);
        }
    }
}

#[test]
fn zero_density_fixture_never_produces_nan_mass_or_velocity() {
    let mut world = World::new();
    world.set_gravity(Vector::new(0.0, -9.8));
    let body = world
        .add_body(
            RigidBodyBuilder::new(BodyType::Dynamic)
                .fixture(FixtureBuilder::new(Box::new(Circle { radius: 0.5 })).density(0.0).build())
                .build(),
        )
        .unwrap();

    world.updatev(1.0 / 60.0);

    let b = world.get_body(body).unwrap();
    assert!(!b.linear_velocity.x.is_nan() && !b.linear_velocity.y.is_nan());
    assert!(!b.inverse_mass.is_nan());
}

#[test]
fn detect_aabb_and_detect_convex_are_instantaneous_spatial_queries_not_tracked_contacts() {
    let mut world = World::new();
    world.set_gravity(Vector::zeros());
    let a = dynamic_box(&mut world, Vector::zeros());
    let b = dynamic_box(&mut world, Vector::new(5.0, 5.0));

    let probe = Aabb::new(Point::new(-0.4, -0.4), Point::new(0.4, 0.4));
    let hits = world.detect_aabb(&probe);
    assert!(hits.contains(&(a, 0)));
    assert!(!hits.contains(&(b, 0)));

    let probe_shape = Polygon::rectangle(0.4, 0.4);
    let probe_pose = Isometry::new(Vector::new(0.0, 0.0), 0.0);
    let convex_hits = world.detect_convex(&probe_shape, &probe_pose);
    assert!(convex_hits.contains(&(a, 0)));
    assert!(!convex_hits.contains(&(b, 0)));

    // A one-off query never populates the tracked contact map.
    assert_eq!(world.get_contacts().count(), 0);
}
