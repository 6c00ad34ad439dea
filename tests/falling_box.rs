//! A box dropped onto a floor settles to rest on top of it rather than
//! sinking through, and falls asleep once it stops moving.

use kinetix2d::math::Vector;
use kinetix2d::{BodyType, FixtureBuilder, Polygon, RigidBodyBuilder, Settings, World};

#[test]
fn box_settles_on_floor_and_falls_asleep() {
    let mut world = World::new();
    world.set_settings(Settings::default());

    let floor_top = 0.25;
    world
        .add_body(
            RigidBodyBuilder::new(BodyType::Static)
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(5.0, floor_top))).build())
                .build(),
        )
        .unwrap();

    let box_half = 0.5;
    let box_handle = world
        .add_body(
            RigidBodyBuilder::new(BodyType::Dynamic)
                .translation(Vector::new(0.0, 5.0))
                .fixture(
                    FixtureBuilder::new(Box::new(Polygon::rectangle(box_half, box_half)))
                        .density(1.0)
                        .friction(0.2)
                        .restitution(0.0)
                        .build(),
                )
                .build(),
        )
        .unwrap();

    world.set_gravity(Vector::new(0.0, -9.8));
    for _ in 0..120 {
        world.updatev(1.0 / 60.0);
    }

    let body = world.get_body(box_handle).unwrap();
    let rest_y = floor_top + box_half;
    assert!((body.transform.translation.vector.y - rest_y).abs() < 0.05, "box settled at {}, expected near {rest_y}", body.transform.translation.vector.y);
    assert!(body.linear_velocity.norm() < world.settings().at_rest_linear_tolerance);
    assert!(body.is_asleep(), "box should have fallen asleep after 2s at rest");
}
