//! Engine tick integration tests: physics sync, camera follow, render order
//! and deferred editor edits running together through [`Game::tick`].

use bevy_ecs::prelude::*;
use glam::{Mat3, Vec2};

use keelengine::components::camera::Camera;
use keelengine::components::follower::Follower;
use keelengine::components::parallax::Parallax;
use keelengine::components::rigidbody::RigidBody;
use keelengine::components::sprite::Sprite;
use keelengine::components::transform2d::Transform2D;
use keelengine::game::Game;
use keelengine::resources::gameconfig::GameConfig;
use keelengine::resources::worldtime::WorldTime;
use keelengine::systems::render::{DrawKind, DrawList, render_scene};

const EPSILON: f32 = 1e-4;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec_approx_eq(a: Vec2, b: Vec2) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn zero_gravity_game() -> Game {
    let mut config = GameConfig::new();
    config.gravity = Vec2::ZERO;
    config.validate_hierarchy = true;
    Game::new(config)
}

fn spawn_sprite(game: &mut Game, name: &str, local: Transform2D, parent: Option<Entity>) -> Entity {
    let e = game.scene.create_entity(name);
    game.scene.add_scene_node(e, local, parent);
    game.scene
        .world_mut()
        .entity_mut(e)
        .insert(Sprite::new(name));
    e
}

#[test]
fn new_game_has_camera_time_and_config() {
    let game = Game::new(GameConfig::new());
    let camera = game.scene.active_camera().expect("camera");
    assert_eq!(game.scene.display_name(camera), "Camera");
    assert!(game.scene.world().get::<Camera>(camera).is_some());
    assert!(game.scene.world().contains_resource::<WorldTime>());
    assert!(approx_eq(game.config().camera_distance, 10.0));
}

#[test]
fn tick_advances_time_with_scale() {
    let mut game = zero_gravity_game();
    game.scene.world_mut().resource_mut::<WorldTime>().time_scale = 2.0;
    let mut list = DrawList::new();
    game.tick(0.25, &mut list, 1.0);
    game.tick(0.25, &mut list, 1.0);
    let time = game.time();
    assert!(approx_eq(time.elapsed, 1.0));
    assert!(approx_eq(time.delta, 0.5));
    assert_eq!(time.frame, 2);
    assert_eq!(list.frames, 2);
}

#[test]
fn physics_writes_world_pose_under_moving_parent() {
    let mut game = zero_gravity_game();
    let platform = game.scene.create_entity("platform");
    game.scene
        .add_scene_node(platform, Transform2D::from_position(Vec2::new(10.0, 0.0)), None);
    let crate_e = game.scene.create_entity("crate");
    game.scene.add_scene_node(
        crate_e,
        Transform2D::from_position(Vec2::new(1.0, 0.0)),
        Some(platform),
    );
    game.scene.add_rigid_body(
        crate_e,
        RigidBody::kinematic().with_velocity(Vec2::new(0.0, 2.0)),
    );

    // body pose was seeded from the node's global transform
    let pose = game.scene.world().get::<RigidBody>(crate_e).unwrap().pose;
    assert!(vec_approx_eq(pose.position, Vec2::new(11.0, 0.0)));

    let mut list = DrawList::new();
    game.tick(0.5, &mut list, 1.0);
    assert!(vec_approx_eq(
        game.scene.global_transform(crate_e).position,
        Vec2::new(11.0, 1.0)
    ));
    // the node's local was recomputed against the parent
    assert!(vec_approx_eq(
        game.scene.local_transform(crate_e).unwrap().position,
        Vec2::new(1.0, 1.0)
    ));

    // moving the parent does not drag an awake body along: physics owns the pose
    game.scene
        .set_local_transform(platform, Transform2D::from_position(Vec2::new(-5.0, 0.0)));
    game.tick(0.5, &mut list, 1.0);
    assert!(vec_approx_eq(
        game.scene.global_transform(crate_e).position,
        Vec2::new(11.0, 2.0)
    ));
}

#[test]
fn gravity_from_config_pulls_dynamic_bodies() {
    let mut config = GameConfig::new();
    config.gravity = Vec2::new(0.0, -10.0);
    let mut game = Game::new(config);
    let ball = game.scene.create_entity("ball");
    game.scene.add_scene_node(ball, Transform2D::IDENTITY, None);
    game.scene.add_rigid_body(ball, RigidBody::dynamic());

    let mut list = DrawList::new();
    game.tick(0.1, &mut list, 1.0);
    let y = game.scene.global_transform(ball).position.y;
    assert!(approx_eq(y, -0.1));
}

#[test]
fn camera_follows_target() {
    let mut game = zero_gravity_game();
    let camera = game.scene.active_camera().unwrap();
    let hero = spawn_sprite(
        &mut game,
        "hero",
        Transform2D::from_position(Vec2::new(8.0, -4.0)),
        None,
    );
    game.scene
        .world_mut()
        .entity_mut(camera)
        .insert(Follower::new(hero).with_speed(2.0));

    let mut list = DrawList::new();
    game.tick(0.25, &mut list, 1.0);
    assert!(vec_approx_eq(
        game.scene.global_transform(camera).position,
        Vec2::new(4.0, -2.0)
    ));

    game.tick(1.0, &mut list, 1.0);
    assert!(vec_approx_eq(
        game.scene.global_transform(camera).position,
        Vec2::new(8.0, -4.0)
    ));
    // the hero is at the view centre now
    let view = list.view.unwrap().view;
    assert!(view.transform_point2(Vec2::new(8.0, -4.0)).length() < EPSILON);
}

#[test]
fn parallax_layer_trails_the_camera_in_the_same_tick() {
    let mut game = zero_gravity_game();
    let camera = game.scene.active_camera().unwrap();
    let hills = spawn_sprite(
        &mut game,
        "hills",
        Transform2D::from_position(Vec2::new(0.0, 3.0)),
        None,
    );
    game.scene
        .world_mut()
        .entity_mut(hills)
        .insert(Parallax::new(Vec2::splat(0.5)));

    let mut list = DrawList::new();
    game.tick(0.016, &mut list, 1.0);
    assert!(vec_approx_eq(
        game.scene.global_transform(hills).position,
        Vec2::new(0.0, 3.0)
    ));

    game.scene
        .set_local_transform(camera, Transform2D::from_position(Vec2::new(10.0, -2.0)));
    game.tick(0.016, &mut list, 1.0);
    assert!(vec_approx_eq(
        game.scene.global_transform(hills).position,
        Vec2::new(5.0, 2.0)
    ));
    // the draw record already carries the scrolled position
    let expected = Mat3::from_translation(Vec2::new(5.0, 2.0));
    assert!(list.records[0].transform.abs_diff_eq(expected, EPSILON));
}

#[test]
fn render_submits_in_hierarchy_preorder() {
    let mut game = zero_gravity_game();
    let a = spawn_sprite(&mut game, "a", Transform2D::IDENTITY, None);
    let b = spawn_sprite(&mut game, "b", Transform2D::IDENTITY, None);
    let a_child = spawn_sprite(
        &mut game,
        "a_child",
        Transform2D::from_position(Vec2::new(1.0, 2.0)).with_layer(3),
        Some(a),
    );
    // nodes without drawables are walked but not submitted
    let group = game.scene.create_entity("group");
    game.scene.add_scene_node(group, Transform2D::IDENTITY, Some(b));
    let deep = spawn_sprite(&mut game, "deep", Transform2D::IDENTITY, Some(group));

    let mut list = DrawList::new();
    game.tick(0.016, &mut list, 16.0 / 9.0);
    assert_eq!(list.entities(), vec![a, a_child, b, deep]);

    let record = &list.records[1];
    assert_eq!(record.layer, 3);
    assert_eq!(
        record.kind,
        DrawKind::Sprite {
            tex_key: "a_child".to_string()
        }
    );
    let expected = Mat3::from_translation(Vec2::new(1.0, 2.0));
    assert!(record.transform.abs_diff_eq(expected, EPSILON));
}

#[test]
fn render_without_camera_is_empty() {
    let mut game = zero_gravity_game();
    spawn_sprite(&mut game, "a", Transform2D::IDENTITY, None);
    let camera = game.scene.active_camera().unwrap();
    game.scene.destroy_entity(camera);
    assert_eq!(game.scene.active_camera(), None);

    let mut list = DrawList::new();
    render_scene(&mut game.scene, &mut list, 1.0);
    assert!(list.view.is_none());
    assert!(list.records.is_empty());
}

#[test]
fn editor_requests_apply_after_the_tick_systems() {
    let mut game = zero_gravity_game();
    let a = spawn_sprite(&mut game, "a", Transform2D::from_position(Vec2::new(1.0, 0.0)), None);
    let b = spawn_sprite(&mut game, "b", Transform2D::from_position(Vec2::new(0.0, 1.0)), None);
    let c = spawn_sprite(&mut game, "c", Transform2D::IDENTITY, Some(b));

    // requests gathered while walking the outline
    let rows = game.inspector.outline(&mut game.scene);
    for row in &rows {
        if row.entity == b {
            game.inspector.request_reparent(b, a);
        }
        if row.entity == c {
            game.inspector.request_delete(c);
        }
    }
    game.inspector.request_rename(a, "anchor");
    assert_eq!(game.scene.parent(b), None);
    assert!(game.scene.contains(c));

    let mut list = DrawList::new();
    game.tick(0.016, &mut list, 1.0);

    assert_eq!(game.scene.parent(b), Some(a));
    assert!(!game.scene.contains(c));
    assert_eq!(game.scene.display_name(a), "anchor");
    assert!(vec_approx_eq(
        game.scene.global_transform(b).position,
        Vec2::new(1.0, 1.0)
    ));
    // rendering in the same tick already sees the new structure
    assert_eq!(list.entities(), vec![a, b]);
    assert!(game.inspector.pending().is_empty());
}

#[test]
fn headless_run_uses_configured_tick() {
    let mut config = GameConfig::new();
    config.target_fps = 50;
    config.gravity = Vec2::ZERO;
    let mut game = Game::new(config);
    let mut list = DrawList::new();
    game.run_headless(25, &mut list);
    assert!(approx_eq(game.time().elapsed, 0.5));
    assert_eq!(list.frames, 25);
}
