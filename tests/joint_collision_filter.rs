//! Two overlapping bodies joined with `collision_allowed = false` never
//! produce a confirmed contact, even though their fixtures geometrically
//! overlap and the broad-phase sees them.

use kinetix2d::dynamics::DistanceJoint;
use kinetix2d::math::Vector;
use kinetix2d::{BodyType, FixtureBuilder, JointDef, Polygon, RigidBodyBuilder, World};

#[test]
fn joint_disallowing_collision_suppresses_the_contact() {
    let mut world = World::new();
    world.set_gravity(Vector::zeros());

    let a = world
        .add_body(
            RigidBodyBuilder::new(BodyType::Dynamic)
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build())
                .build(),
        )
        .unwrap();
    let b = world
        .add_body(
            RigidBodyBuilder::new(BodyType::Dynamic)
                .translation(Vector::new(0.2, 0.0))
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build())
                .build(),
        )
        .unwrap();

    let joint = DistanceJoint::builder(a, b).rest_length(0.2).collision_allowed(false).build();
    world.add_joint(JointDef::Distance(joint)).unwrap();

    assert!(!world.is_joint_collision_allowed(a, b));

    world.refresh_contacts();
    assert!(!world.is_in_contact((a, 0), (b, 0)), "overlapping fixtures joined with collision_allowed=false should not confirm a contact");
}
