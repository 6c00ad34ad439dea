//! Two far-apart colliding pairs are solved as independent islands: removing
//! one pair does not perturb the other pair's post-step state.

use kinetix2d::math::Vector;
use kinetix2d::{BodyType, FixtureBuilder, Polygon, RigidBodyBuilder, World};

fn add_resting_pair(world: &mut World, x_offset: f32) -> kinetix2d::BodyHandle {
    world
        .add_body(
            RigidBodyBuilder::new(BodyType::Static)
                .translation(Vector::new(x_offset, 0.0))
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(5.0, 0.25))).build())
                .build(),
        )
        .unwrap();
    world
        .add_body(
            RigidBodyBuilder::new(BodyType::Dynamic)
                .translation(Vector::new(x_offset, 0.74))
                .fixture(FixtureBuilder::new(Box::new(Polygon::rectangle(0.5, 0.5))).density(1.0).build())
                .build(),
        )
        .unwrap()
}

#[test]
fn removing_one_pair_does_not_change_the_others_post_step_state() {
    let mut world_both = World::new();
    world_both.set_gravity(Vector::new(0.0, -9.8));
    add_resting_pair(&mut world_both, -100.0);
    let second_box = add_resting_pair(&mut world_both, 100.0);
    for _ in 0..10 {
        world_both.updatev(1.0 / 60.0);
    }
    let body_both = world_both.get_body(second_box).unwrap();
    let (pos_both, vel_both) = (body_both.transform.translation.vector, body_both.linear_velocity);

    let mut world_alone = World::new();
    world_alone.set_gravity(Vector::new(0.0, -9.8));
    let second_box_alone = add_resting_pair(&mut world_alone, 100.0);
    for _ in 0..10 {
        world_alone.updatev(1.0 / 60.0);
    }
    let body_alone = world_alone.get_body(second_box_alone).unwrap();
    let (pos_alone, vel_alone) = (body_alone.transform.translation.vector, body_alone.linear_velocity);

    assert!((pos_both.y - pos_alone.y).abs() < 1.0e-5);
    assert!((vel_both - vel_alone).norm() < 1.0e-5);
}
