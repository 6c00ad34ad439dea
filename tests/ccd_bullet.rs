//! A small fast-moving body flagged `bullet` is stopped at the wall by CCD
//! when continuous detection is enabled, and tunnels through it (the
//! negative control) when continuous detection is disabled.

use kinetix2d::dynamics::ContinuousDetectionMode;
use kinetix2d::math::Vector;
use kinetix2d::{BodyType, Circle, FixtureBuilder, Polygon, RigidBodyBuilder, Settings, World};

fn build_world(mode: ContinuousDetectionMode) -> (World, kinetix2d::BodyHandle) {
    let mut world = World::new();
    world.set_gravity(Vector::zeros());

    let mut settings = Settings::default();
    settings.continuous_detection_mode = mode;
    world.set_settings(settings);

    // A thin wall straddling x = 0.
    world
        .add_body(
            RigidBodyBuilder::new(BodyType::Static)
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.05, 2.0))).build())
                .build(),
        )
        .unwrap();

    // A bullet starting just in front of the wall, moving fast enough to
    // cross it (and land 1 unit past it) in a single step.
    let bullet = world
        .add_body(
            RigidBodyBuilder::new(BodyType::Dynamic)
                .translation(Vector::new(-0.2, 0.0))
                .linear_velocity(Vector::new(72.0, 0.0))
                .bullet(true)
                .fixture(FixtureBuilder::new(Box::new(Circle { radius: 0.05 })).density(1.0).build())
                .build(),
        )
        .unwrap();

    (world, bullet)
}

#[test]
fn bullet_is_stopped_at_the_wall_with_ccd_enabled() {
    let (mut world, bullet) = build_world(ContinuousDetectionMode::BulletsOnly);
    world.updatev(1.0 / 60.0);

    let x = world.get_body(bullet).unwrap().transform.translation.vector.x;
    assert!(x < 0.1, "CCD should have clamped the bullet at the wall, ended at x={x}");
}

#[test]
fn bullet_tunnels_through_the_wall_with_ccd_disabled() {
    let (mut world, bullet) = build_world(ContinuousDetectionMode::None);
    world.updatev(1.0 / 60.0);

    let x = world.get_body(bullet).unwrap().transform.translation.vector.x;
    assert!(x > 0.5, "without CCD the bullet should tunnel straight through, ended at x={x}");
}
