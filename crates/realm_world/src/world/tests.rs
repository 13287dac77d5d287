use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use super::World;
use crate::config::WorldConfig;
use crate::connection::Connection;
use crate::entity::{Damageable, Entity, Targetable};
use crate::events::WorldEvent;
use crate::format::FieldType;
use crate::kinds::Kind;
use crate::map::Map;
use crate::player::SessionBound;
use crate::types::{EntityId, Position};

#[derive(Default)]
struct Log {
    sent: Vec<Value>,
    raw: Vec<String>,
    closed: Option<String>,
}

/// Connection double recording everything the world sends.
#[derive(Clone, Default)]
struct Recorder {
    log: Arc<Mutex<Log>>,
}

impl Recorder {
    /// Every message received, batches flattened.
    fn messages(&self) -> Vec<Value> {
        let log = self.log.lock().unwrap();
        let mut out = Vec::new();
        for payload in &log.sent {
            match payload.as_array() {
                Some(items) if items.first().is_some_and(Value::is_array) => {
                    out.extend(items.iter().cloned())
                }
                _ => out.push(payload.clone()),
            }
        }
        out
    }

    fn of_type(&self, message_type: u64) -> Vec<Value> {
        self.messages()
            .into_iter()
            .filter(|m| m[0] == json!(message_type))
            .collect()
    }

    fn raw(&self) -> Vec<String> {
        self.log.lock().unwrap().raw.clone()
    }

    fn closed(&self) -> Option<String> {
        self.log.lock().unwrap().closed.clone()
    }

    fn clear(&self) {
        self.log.lock().unwrap().sent.clear();
    }
}

impl Connection for Recorder {
    fn send(&self, payload: Value) {
        self.log.lock().unwrap().sent.push(payload);
    }

    fn send_raw(&self, text: &str) {
        self.log.lock().unwrap().raw.push(text.to_string());
    }

    fn close(&self, reason: &str) {
        self.log.lock().unwrap().closed = Some(reason.to_string());
    }
}

const WIDTH: i32 = 84;

/// Tile index of a static entity that ends up standing on `(x, y)`.
fn tile_for(x: i32, y: i32) -> String {
    (y * WIDTH + x + 1).to_string()
}

/// A 3x1 group strip with a single tile starting area at (5, 5).
fn map_with(extra: Value) -> Map {
    let mut data = json!({
        "width": WIDTH,
        "height": 12,
        "collisions": [WIDTH * 2 + 2],
        "checkpoints": [
            { "id": 1, "x": 5, "y": 5, "w": 1, "h": 1, "s": 1 },
            { "id": 2, "x": 60, "y": 6, "w": 1, "h": 1, "s": 0 }
        ]
    });
    if let (Some(base), Some(extra)) = (data.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    Map::from_json(&data.to_string()).unwrap()
}

fn config() -> WorldConfig {
    WorldConfig {
        rng_seed: Some(11),
        ..WorldConfig::default()
    }
}

fn world_with(extra: Value) -> World {
    World::new(config(), map_with(extra))
}

fn connect(world: &mut World) -> (EntityId, Recorder) {
    let recorder = Recorder::default();
    let id = world.connect(Box::new(recorder.clone())).unwrap();
    (id, recorder)
}

fn hello(name: &str, armor: Kind, weapon: Kind) -> Vec<Value> {
    vec![json!(0), json!(name), json!(armor.id()), json!(weapon.id())]
}

fn join(world: &mut World, name: &str) -> (EntityId, Recorder) {
    join_with(world, name, Kind::ClothArmor, Kind::Sword1)
}

fn join_with(world: &mut World, name: &str, armor: Kind, weapon: Kind) -> (EntityId, Recorder) {
    let (id, recorder) = connect(world);
    world.handle_message(id, hello(name, armor, weapon));
    world.update();
    (id, recorder)
}

fn only_mob(world: &World, kind: Kind) -> EntityId {
    world
        .mobs()
        .find(|m| m.kind() == kind)
        .map(|m| m.id())
        .unwrap()
}

fn item_of_kind(world: &World, kind: Kind) -> Option<EntityId> {
    world.items().find(|i| i.kind() == kind).map(|i| i.id())
}

fn hit_until_dead(world: &mut World, player: EntityId, mob: EntityId) {
    for _ in 0..500 {
        if world.mob(mob).is_none() {
            return;
        }
        world.handle_message(player, vec![json!(8), json!(mob.0)]);
    }
    panic!("mob {} survived", mob);
}

#[test]
fn connecting_sends_go_and_waits_for_hello() {
    let mut world = world_with(json!({}));
    let (id, recorder) = connect(&mut world);

    assert_eq!(recorder.raw(), vec!["go".to_string()]);
    assert!(!world.player(id).unwrap().has_entered_game());
    assert!(world.entity(id).is_none());
    assert_eq!(world.player_count(), 0);
}

#[test]
fn hello_welcomes_player_into_starting_area() {
    let mut world = world_with(json!({}));
    let (id, recorder) = join(&mut world, "<b>bob</b>");

    let welcome = recorder.of_type(1);
    assert_eq!(welcome, vec![json!([1, id.0, "bob", 5, 5, 80])]);
    assert_eq!(world.player_count(), 1);
    assert_eq!(world.entity(id).unwrap().position(), Position::new(5, 5));
    assert!(world
        .drain_events()
        .contains(&WorldEvent::PlayerEntered { player: id, name: "bob".to_string() }));
}

#[test]
fn first_message_other_than_hello_closes_without_side_effects() {
    let mut world = world_with(json!({}));
    let (id, recorder) = connect(&mut world);

    world.handle_message(id, vec![json!(4), json!(6), json!(6)]);

    assert_eq!(recorder.closed().as_deref(), Some("Invalid handshake message: 4,6,6"));
    assert!(world.player(id).is_none());
    assert_eq!(world.player_count(), 0);
    assert_eq!(
        world.drain_events(),
        vec![WorldEvent::ConnectionClosed {
            player: id,
            reason: "Invalid handshake message: 4,6,6".to_string(),
        }]
    );
}

#[test]
fn second_hello_closes_the_connection() {
    let mut world = world_with(json!({}));
    let (id, recorder) = join(&mut world, "bob");

    world.handle_message(id, hello("bob", Kind::ClothArmor, Kind::Sword1));

    assert_eq!(
        recorder.closed().as_deref(),
        Some("Cannot initiate handshake twice: 0,bob,21,60")
    );
    assert!(world.player(id).is_none());
    assert_eq!(world.player_count(), 0);
}

#[test]
fn malformed_messages_name_their_type() {
    let mut world = world_with(json!({}));
    let (id, recorder) = join(&mut world, "bob");

    world.handle_message(id, vec![json!(4), json!("a")]);

    assert_eq!(recorder.closed().as_deref(), Some("Invalid MOVE message format: 4,a"));
}

#[test]
fn full_world_refuses_connections() {
    let config = WorldConfig {
        max_players: 1,
        ..config()
    };
    let mut world = World::new(config, map_with(json!({})));
    connect(&mut world);

    let refused = Recorder::default();
    assert!(world.connect(Box::new(refused.clone())).is_none());
    assert_eq!(refused.closed().as_deref(), Some("World is full"));
}

#[test]
fn idle_players_time_out() {
    let config = WorldConfig {
        idle_timeout_ms: 1_000,
        ..config()
    };
    let mut world = World::new(config, map_with(json!({})));
    let (id, recorder) = join(&mut world, "bob");

    let remaining = 1_000 - world.now_ms();
    world.advance_time(remaining - 1);
    assert!(recorder.closed().is_none());
    world.advance_time(1);

    assert_eq!(recorder.raw(), vec!["go".to_string(), "timeout".to_string()]);
    assert_eq!(recorder.closed().as_deref(), Some("Player was idle for too long"));
    assert!(world.player(id).is_none());
}

#[test]
fn players_see_each_other_enter_and_leave() {
    let mut world = world_with(json!({}));
    let (alice, alice_rx) = join(&mut world, "alice");
    let (bob, bob_rx) = join(&mut world, "bob");

    let spawns = alice_rx.of_type(2);
    assert!(spawns.iter().any(|s| s[1] == json!(bob.0)));
    assert!(!alice_rx.of_type(2).iter().any(|s| s[1] == json!(alice.0)));
    assert!(bob_rx
        .of_type(19)
        .iter()
        .any(|list| list.as_array().unwrap()[1..].contains(&json!(alice.0))));
    assert!(alice_rx.of_type(17).contains(&json!([17, 2, 2])));

    alice_rx.clear();
    world.disconnect(bob);
    world.update();

    assert!(alice_rx.of_type(3).contains(&json!([3, bob.0])));
    assert!(alice_rx.of_type(17).contains(&json!([17, 1, 1])));
    assert_eq!(world.player_count(), 1);
    let events = world.drain_events();
    assert!(events.contains(&WorldEvent::PlayerRemoved { player: bob }));
    assert!(events.contains(&WorldEvent::PopulationChanged { population: 1 }));
}

#[test]
fn chat_is_sanitized_capped_and_scoped_to_the_group() {
    let mut world = world_with(json!({}));
    let (alice, alice_rx) = join(&mut world, "alice");
    let (_bob, bob_rx) = join(&mut world, "bob");
    bob_rx.clear();

    world.handle_message(alice, vec![json!(11), json!("<b>hi</b> & bye")]);
    world.handle_message(alice, vec![json!(11), json!("<script>alert(1)</script>")]);
    world.handle_message(alice, vec![json!(11), json!("x".repeat(100))]);
    world.update();

    let chats = bob_rx.of_type(11);
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0], json!([11, alice.0, "hi &amp; bye"]));
    assert_eq!(chats[1][2].as_str().unwrap().len(), 60);
    assert_eq!(alice_rx.of_type(11).len(), 2);
}

#[test]
fn rejected_moves_leave_the_player_in_place() {
    let mut world = world_with(json!({}));
    let (alice, _) = join(&mut world, "alice");

    world.handle_message(alice, vec![json!(4), json!(2), json!(2)]);
    world.handle_message(alice, vec![json!(4), json!(500), json!(2)]);
    assert_eq!(world.entity(alice).unwrap().position(), Position::new(5, 5));

    world.handle_message(alice, vec![json!(4), json!(6), json!(5)]);
    assert_eq!(world.entity(alice).unwrap().position(), Position::new(6, 5));
}

#[test]
fn leaving_a_zone_destroys_the_player_for_old_neighbours() {
    let mut world = world_with(json!({}));
    let (alice, alice_rx) = join(&mut world, "alice");
    let (bob, bob_rx) = join(&mut world, "bob");
    alice_rx.clear();

    world.handle_message(bob, vec![json!(4), json!(70), json!(5)]);
    world.handle_message(bob, vec![json!(21)]);
    world.update();

    assert!(alice_rx.of_type(4).contains(&json!([4, bob.0, 70, 5])));
    assert!(alice_rx.of_type(22).contains(&json!([22, bob.0])));
    let lists = bob_rx.of_type(19);
    let latest = lists.last().unwrap().as_array().unwrap();
    assert!(!latest[1..].contains(&json!(alice.0)));

    alice_rx.clear();
    world.handle_message(bob, vec![json!(11), json!("anyone?")]);
    world.update();
    assert!(alice_rx.of_type(11).is_empty());
}

#[test]
fn unknown_well_formed_commands_become_events() {
    let mut world = world_with(json!({}));
    let (alice, alice_rx) = join(&mut world, "alice");
    world.drain_events();

    world.register_format(99, vec![FieldType::Text]);
    world.handle_message(alice, vec![json!(99), json!("emote")]);

    assert!(alice_rx.closed().is_none());
    assert_eq!(
        world.drain_events(),
        vec![WorldEvent::Message {
            player: alice,
            action: 99,
            fields: vec![json!("emote")],
        }]
    );
}

#[test]
fn aggro_targets_the_player_and_teleport_shakes_it_off() {
    let mut world = world_with(json!({
        "roamingAreas": [
            { "id": 0, "x": 8, "y": 5, "width": 1, "height": 1, "type": "rat", "nb": 1 }
        ]
    }));
    let rat = only_mob(&world, Kind::Rat);
    let (alice, alice_rx) = join(&mut world, "alice");

    world.handle_message(alice, vec![json!(6), json!(rat.0)]);
    world.update();

    assert_eq!(world.mob(rat).unwrap().target(), Some(alice));
    assert!(world.player(alice).unwrap().is_attacked_by(rat));
    assert_eq!(world.haters_of(alice), vec![rat]);
    assert!(alice_rx.of_type(7).contains(&json!([7, rat.0, alice.0])));

    world.handle_message(alice, vec![json!(15), json!(60), json!(6)]);

    let mob = world.mob(rat).unwrap();
    assert_eq!(mob.target(), None);
    assert!(mob.is_returning());
    assert!(world.haters_of(alice).is_empty());
    assert!(!world.player(alice).unwrap().is_attacked_by(rat));
}

#[test]
fn killing_a_mob_reports_the_kill_and_drops_loot() {
    let mut world = world_with(json!({
        "roamingAreas": [
            { "id": 0, "x": 8, "y": 5, "width": 1, "height": 1, "type": "boss", "nb": 1 }
        ]
    }));
    let boss = only_mob(&world, Kind::Boss);
    let (alice, alice_rx) = join_with(&mut world, "alice", Kind::ClothArmor, Kind::GoldenSword);

    hit_until_dead(&mut world, alice, boss);
    world.update();

    assert!(world.dead_mob(boss).is_some());
    assert!(world.entity(boss).is_none());
    let messages = alice_rx.messages();
    let kill = messages.iter().position(|m| *m == json!([18, Kind::Boss.id()])).unwrap();
    let despawn = messages.iter().position(|m| *m == json!([3, boss.0])).unwrap();
    let drop = messages.iter().position(|m| m[0] == json!(14)).unwrap();
    assert!(kill < despawn && despawn < drop);

    let sword = item_of_kind(&world, Kind::GoldenSword).unwrap();
    assert_eq!(
        messages[drop],
        json!([14, boss.0, sword.0, Kind::GoldenSword.id(), [alice.0]])
    );
    assert!(alice_rx.of_type(16).iter().all(|d| d[1] == json!(boss.0)));
}

#[test]
fn dropped_items_blink_then_disappear() {
    let mut world = world_with(json!({
        "roamingAreas": [
            { "id": 0, "x": 8, "y": 5, "width": 1, "height": 1, "type": "boss", "nb": 1 }
        ]
    }));
    let boss = only_mob(&world, Kind::Boss);
    let (alice, alice_rx) = join_with(&mut world, "alice", Kind::ClothArmor, Kind::GoldenSword);
    hit_until_dead(&mut world, alice, boss);
    let sword = item_of_kind(&world, Kind::GoldenSword).unwrap();
    world.update();
    alice_rx.clear();

    world.advance_time(10_000);
    world.update();
    assert_eq!(alice_rx.of_type(24), vec![json!([24, sword.0])]);
    assert!(world.item(sword).is_some());

    world.advance_time(4_000);
    world.update();
    assert_eq!(alice_rx.of_type(22), vec![json!([22, sword.0])]);
    assert!(world.item(sword).is_none());
}

#[test]
fn dead_mobs_respawn_in_their_area() {
    let mut world = world_with(json!({
        "roamingAreas": [
            { "id": 0, "x": 8, "y": 5, "width": 1, "height": 1, "type": "boss", "nb": 1 }
        ]
    }));
    let boss = only_mob(&world, Kind::Boss);
    let (alice, _) = join_with(&mut world, "alice", Kind::ClothArmor, Kind::GoldenSword);
    hit_until_dead(&mut world, alice, boss);

    world.advance_time(30_000);

    let mob = world.mob(boss).unwrap();
    assert!(mob.has_full_health());
    assert_eq!(mob.position(), Position::new(8, 5));
    assert!(world.mob_areas()[0].area.owns(boss));
}

#[test]
fn picking_up_a_weapon_equips_it_and_static_items_return() {
    let mut world = world_with(json!({ "staticEntities": { tile_for(6, 5): "axe" } }));
    let axe = item_of_kind(&world, Kind::Axe).unwrap();
    let (alice, _) = join(&mut world, "alice");
    let (_bob, bob_rx) = join(&mut world, "bob");
    bob_rx.clear();

    world.handle_message(alice, vec![json!(12), json!(axe.0)]);
    world.update();

    assert_eq!(world.player(alice).unwrap().weapon, Kind::Axe);
    assert!(world.item(axe).is_none());
    assert!(bob_rx.of_type(3).contains(&json!([3, axe.0])));
    assert!(bob_rx.of_type(13).contains(&json!([13, alice.0, Kind::Axe.id()])));

    world.advance_time(30_000);
    assert_eq!(world.item(axe).unwrap().position(), Position::new(6, 5));
}

#[test]
fn firepotion_heals_and_wears_off() {
    let mut world = world_with(json!({ "staticEntities": { tile_for(6, 5): "firepotion" } }));
    let potion = item_of_kind(&world, Kind::Firepotion).unwrap();
    let (alice, alice_rx) = join(&mut world, "alice");
    let (_bob, bob_rx) = join(&mut world, "bob");
    alice_rx.clear();
    bob_rx.clear();

    world.handle_message(alice, vec![json!(12), json!(potion.0)]);
    world.update();

    assert!(alice_rx.of_type(23).contains(&json!([23, 80])));
    assert!(bob_rx.of_type(13).contains(&json!([13, alice.0, Kind::Firefox.id()])));
    assert!(world.player(alice).unwrap().has_firepotion());

    bob_rx.clear();
    world.advance_time(15_000);
    world.update();
    assert!(bob_rx.of_type(13).contains(&json!([13, alice.0, Kind::ClothArmor.id()])));
    assert!(!world.player(alice).unwrap().has_firepotion());
}

#[test]
fn opening_a_chest_leaves_one_of_its_items() {
    let mut world = world_with(json!({
        "staticChests": [{ "x": 7, "y": 5, "i": [Kind::Burger.id()] }]
    }));
    let chest = world.chests().next().map(|c| c.id()).unwrap();
    let (alice, alice_rx) = join(&mut world, "alice");
    alice_rx.clear();

    world.handle_message(alice, vec![json!(25), json!(chest.0)]);
    world.update();

    assert!(world.chest(chest).is_none());
    assert!(alice_rx.of_type(3).contains(&json!([3, chest.0])));
    let burger = item_of_kind(&world, Kind::Burger).unwrap();
    let item = world.item(burger).unwrap();
    assert_eq!(item.position(), Position::new(7, 5));
    assert!(item.is_from_chest);
    assert!(item.has_pending_despawn());

    world.advance_time(30_000);
    assert!(world.chest(chest).is_some());
}

#[test]
fn clearing_a_chest_area_rewards_a_chest() {
    let mut world = world_with(json!({
        "chestAreas": [
            { "x": 20, "y": 2, "w": 4, "h": 4, "i": [Kind::Firepotion.id()], "tx": 22, "ty": 8 }
        ],
        "staticEntities": { tile_for(21, 3): "rat" }
    }));
    let rat = only_mob(&world, Kind::Rat);
    assert!(world.chest_areas()[0].area.owns(rat));
    let (alice, _) = join(&mut world, "alice");

    hit_until_dead(&mut world, alice, rat);

    let chest = world.chests().next().unwrap();
    assert_eq!(chest.position(), Position::new(22, 8));
    assert_eq!(chest.items, vec![Kind::Firepotion]);
    assert!(chest.item.has_pending_despawn());
}

#[test]
fn dead_players_only_answer_to_hello() {
    let mut world = world_with(json!({
        "roamingAreas": [
            { "id": 0, "x": 8, "y": 5, "width": 1, "height": 1, "type": "boss", "nb": 1 }
        ]
    }));
    let boss = only_mob(&world, Kind::Boss);
    let (alice, alice_rx) = join(&mut world, "alice");

    for _ in 0..100 {
        if world.player(alice).unwrap().is_dead() {
            break;
        }
        world.handle_message(alice, vec![json!(9), json!(boss.0)]);
    }
    let player = world.player(alice).unwrap();
    assert!(player.is_dead());
    assert!(player.hit_points() <= 0);
    assert!(world.entity(alice).is_none());

    world.handle_message(alice, vec![json!(4), json!(6), json!(5)]);
    assert!(alice_rx.closed().is_none());

    world.handle_message(alice, hello("alice", Kind::ClothArmor, Kind::Sword1));
    assert!(world.player(alice).unwrap().is_active());
    assert_eq!(world.entity(alice).unwrap().position(), Position::new(5, 5));
    assert_eq!(world.player_count(), 1);
}

#[test]
fn checkpoints_set_the_respawn_area() {
    let mut world = world_with(json!({}));
    let (alice, _) = join(&mut world, "alice");

    world.handle_message(alice, vec![json!(26), json!(2)]);
    assert_eq!(world.player(alice).unwrap().last_checkpoint.as_ref().map(|c| c.id), Some(2));

    world.handle_message(alice, vec![json!(26), json!(42)]);
    assert_eq!(world.player(alice).unwrap().last_checkpoint.as_ref().map(|c| c.id), Some(2));
}

#[test]
fn regeneration_tops_up_wounded_players() {
    let mut world = world_with(json!({
        "roamingAreas": [
            { "id": 0, "x": 8, "y": 5, "width": 1, "height": 1, "type": "rat", "nb": 1 }
        ]
    }));
    let rat = only_mob(&world, Kind::Rat);
    let (alice, alice_rx) = join(&mut world, "alice");

    for _ in 0..20 {
        world.handle_message(alice, vec![json!(9), json!(rat.0)]);
        if !world.player(alice).unwrap().has_full_health() {
            break;
        }
    }
    let wounded = world.player(alice).unwrap().hit_points();
    assert!(wounded < 80);
    alice_rx.clear();

    for _ in 0..world.config().regen_every_ticks() {
        world.update();
    }

    assert_eq!(world.player(alice).unwrap().hit_points(), (wounded + 3).min(80));
    assert!(alice_rx.of_type(10).iter().any(|h| h[2] == json!(1)));
}

#[test]
fn bundled_map_populates_a_world() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../maps/world_server.json");
    let map = Map::load(path).unwrap();
    let world = World::new(config(), map);

    assert_eq!(world.mobs().count(), 6 + 3 + 4 + 2);
    assert_eq!(world.npcs().count(), 2);
    assert_eq!(world.items().count(), 2);
    assert_eq!(world.chests().count(), 1);
    assert_eq!(world.chest_areas().len(), 1);
    let ogre = only_mob(&world, Kind::Ogre);
    assert!(world.chest_areas()[0].area.owns(ogre));
    for mob in world.mobs() {
        assert!(world.is_valid_position(mob.position()), "{} spawned on a wall", mob.id());
    }
}

fn lone_rat_world(seed: u64) -> World {
    let config = WorldConfig {
        rng_seed: Some(seed),
        ..WorldConfig::default()
    };
    World::new(
        config,
        map_with(json!({
            "roamingAreas": [
                { "id": 0, "x": 6, "y": 5, "width": 1, "height": 1, "type": "rat", "nb": 1 }
            ]
        })),
    )
}

#[test]
fn players_stop_targeting_a_mob_once_it_dies() {
    let mut world = lone_rat_world(11);
    let rat = only_mob(&world, Kind::Rat);
    let (alice, _) = join_with(&mut world, "alice", Kind::ClothArmor, Kind::GoldenSword);

    world.handle_message(alice, vec![json!(7), json!(rat.0)]);
    assert_eq!(world.player(alice).unwrap().target(), Some(rat));

    world.handle_message(alice, vec![json!(8), json!(rat.0)]);
    assert!(world.mob(rat).is_none());
    assert_eq!(world.player(alice).unwrap().target(), None);
    assert!(world.haters_of(alice).is_empty());
}

#[test]
fn killing_blow_lists_the_killer_in_the_drop() {
    for seed in 0..200 {
        let mut world = lone_rat_world(seed);
        let rat = only_mob(&world, Kind::Rat);
        let (alice, alice_rx) =
            join_with(&mut world, "alice", Kind::ClothArmor, Kind::GoldenSword);
        alice_rx.clear();

        world.handle_message(alice, vec![json!(8), json!(rat.0)]);
        assert!(world.mob(rat).is_none(), "a goldensword kills a rat in one hit");

        if let Some(drop) = alice_rx.of_type(14).first() {
            assert_eq!(drop[1], json!(rat.0));
            assert_eq!(drop[4], json!([alice.0]));
            return;
        }
    }
    panic!("no rat dropped anything in 200 seeds");
}
