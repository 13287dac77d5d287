//! Wire message types and outbound notifications.
//!
//! Every message travels as a JSON array whose first element is the numeric
//! [`MessageType`]. Inbound commands are decoded in [`crate::command`];
//! this module covers the notifications the world sends to clients.

use serde_json::{json, Value};

use crate::kinds::Kind;
use crate::types::{EntityId, Position};

macro_rules! define_message_types {
    ($($variant:ident = $id:literal => $name:literal),* $(,)?) => {
        /// Discriminator carried in field 0 of every message.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum MessageType {
            $($variant = $id,)*
        }

        impl MessageType {
            pub fn from_id(id: i64) -> Option<MessageType> {
                match id {
                    $($id => Some(MessageType::$variant),)*
                    _ => None,
                }
            }

            /// Upper case name used in close reasons.
            pub fn name(self) -> &'static str {
                match self {
                    $(MessageType::$variant => $name,)*
                }
            }
        }
    };
}

define_message_types! {
    Hello = 0 => "HELLO",
    Welcome = 1 => "WELCOME",
    Spawn = 2 => "SPAWN",
    Despawn = 3 => "DESPAWN",
    Move = 4 => "MOVE",
    LootMove = 5 => "LOOTMOVE",
    Aggro = 6 => "AGGRO",
    Attack = 7 => "ATTACK",
    Hit = 8 => "HIT",
    Hurt = 9 => "HURT",
    Health = 10 => "HEALTH",
    Chat = 11 => "CHAT",
    Loot = 12 => "LOOT",
    Equip = 13 => "EQUIP",
    Drop = 14 => "DROP",
    Teleport = 15 => "TELEPORT",
    Damage = 16 => "DAMAGE",
    Population = 17 => "POPULATION",
    Kill = 18 => "KILL",
    List = 19 => "LIST",
    Who = 20 => "WHO",
    Zone = 21 => "ZONE",
    Destroy = 22 => "DESTROY",
    Hp = 23 => "HP",
    Blink = 24 => "BLINK",
    Open = 25 => "OPEN",
    Check = 26 => "CHECK",
}

impl MessageType {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Name of the message type with the given id, or `"UNKNOWN"`.
    pub fn name_of(id: i64) -> &'static str {
        MessageType::from_id(id).map(MessageType::name).unwrap_or("UNKNOWN")
    }
}

/// Notification produced by the world for one or more clients.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Welcome {
        id: EntityId,
        name: String,
        position: Position,
        hit_points: i32,
    },
    /// Full state of an entity entering a client's view.
    Spawn(Vec<Value>),
    Despawn(EntityId),
    Move {
        id: EntityId,
        position: Position,
    },
    LootMove {
        id: EntityId,
        item: EntityId,
    },
    Attack {
        attacker: EntityId,
        target: Option<EntityId>,
    },
    Health {
        points: i32,
        regen: bool,
    },
    Chat {
        id: EntityId,
        text: String,
    },
    Equip {
        id: EntityId,
        kind: Kind,
    },
    Drop {
        mob: EntityId,
        item: EntityId,
        kind: Kind,
        haters: Vec<EntityId>,
    },
    Teleport {
        id: EntityId,
        position: Position,
    },
    Damage {
        id: EntityId,
        points: i32,
    },
    Population {
        world: usize,
        total: usize,
    },
    Kill(Kind),
    List(Vec<EntityId>),
    Destroy(EntityId),
    HitPoints(i32),
    Blink(EntityId),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Welcome { .. } => MessageType::Welcome,
            Message::Spawn(_) => MessageType::Spawn,
            Message::Despawn(_) => MessageType::Despawn,
            Message::Move { .. } => MessageType::Move,
            Message::LootMove { .. } => MessageType::LootMove,
            Message::Attack { .. } => MessageType::Attack,
            Message::Health { .. } => MessageType::Health,
            Message::Chat { .. } => MessageType::Chat,
            Message::Equip { .. } => MessageType::Equip,
            Message::Drop { .. } => MessageType::Drop,
            Message::Teleport { .. } => MessageType::Teleport,
            Message::Damage { .. } => MessageType::Damage,
            Message::Population { .. } => MessageType::Population,
            Message::Kill(_) => MessageType::Kill,
            Message::List(_) => MessageType::List,
            Message::Destroy(_) => MessageType::Destroy,
            Message::HitPoints(_) => MessageType::Hp,
            Message::Blink(_) => MessageType::Blink,
        }
    }

    /// Serializes the notification to its wire array.
    pub fn serialize(&self) -> Value {
        let mut fields = vec![json!(self.message_type().id())];

        match self {
            Message::Welcome {
                id,
                name,
                position,
                hit_points,
            } => fields.extend([
                json!(id.0),
                json!(name),
                json!(position.x),
                json!(position.y),
                json!(hit_points),
            ]),
            Message::Spawn(state) => fields.extend(state.iter().cloned()),
            Message::Despawn(id) | Message::Destroy(id) | Message::Blink(id) => {
                fields.push(json!(id.0))
            }
            Message::Move { id, position } | Message::Teleport { id, position } => {
                fields.extend([json!(id.0), json!(position.x), json!(position.y)])
            }
            Message::LootMove { id, item } => fields.extend([json!(id.0), json!(item.0)]),
            Message::Attack { attacker, target } => {
                fields.extend([json!(attacker.0), json!(target.map(|t| t.0))])
            }
            Message::Health { points, regen } => {
                fields.push(json!(points));
                if *regen {
                    fields.push(json!(1));
                }
            }
            Message::Chat { id, text } => fields.extend([json!(id.0), json!(text)]),
            Message::Equip { id, kind } => fields.extend([json!(id.0), json!(kind.id())]),
            Message::Drop {
                mob,
                item,
                kind,
                haters,
            } => fields.extend([
                json!(mob.0),
                json!(item.0),
                json!(kind.id()),
                json!(haters.iter().map(|h| h.0).collect::<Vec<_>>()),
            ]),
            Message::Damage { id, points } => fields.extend([json!(id.0), json!(points)]),
            Message::Population { world, total } => fields.extend([json!(world), json!(total)]),
            Message::Kill(kind) => fields.push(json!(kind.id())),
            Message::List(ids) => fields.extend(ids.iter().map(|id| json!(id.0))),
            Message::HitPoints(max) => fields.push(json!(max)),
        }

        Value::Array(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_ids_and_names() {
        assert_eq!(MessageType::from_id(0), Some(MessageType::Hello));
        assert_eq!(MessageType::Check.id(), 26);
        assert_eq!(MessageType::name_of(4), "MOVE");
        assert_eq!(MessageType::name_of(99), "UNKNOWN");
    }

    #[test]
    fn serializes_welcome() {
        let message = Message::Welcome {
            id: EntityId(5),
            name: "bob".into(),
            position: Position::new(10, 15),
            hit_points: 80,
        };
        assert_eq!(message.serialize(), json!([1, 5, "bob", 10, 15, 80]));
    }

    #[test]
    fn serializes_attack_without_target() {
        let message = Message::Attack {
            attacker: EntityId(1),
            target: None,
        };
        assert_eq!(message.serialize(), json!([7, 1, null]));
        let message = Message::Attack {
            attacker: EntityId(1),
            target: Some(EntityId(2)),
        };
        assert_eq!(message.serialize(), json!([7, 1, 2]));
    }

    #[test]
    fn health_flags_regeneration() {
        let regen = Message::Health {
            points: 3,
            regen: true,
        };
        let heal = Message::Health {
            points: 40,
            regen: false,
        };
        assert_eq!(regen.serialize(), json!([10, 3, 1]));
        assert_eq!(heal.serialize(), json!([10, 40]));
    }

    #[test]
    fn drop_lists_haters() {
        let message = Message::Drop {
            mob: EntityId(7),
            item: EntityId(8),
            kind: Kind::Flask,
            haters: vec![EntityId(1), EntityId(2)],
        };
        assert_eq!(message.serialize(), json!([14, 7, 8, 35, [1, 2]]));
    }

    #[test]
    fn list_is_flat() {
        let message = Message::List(vec![EntityId(3), EntityId(4)]);
        assert_eq!(message.serialize(), json!([19, 3, 4]));
    }
}
