//! Decoding of inbound commands.
//!
//! Decoding runs after [`FormatChecker`](crate::format::FormatChecker) has
//! accepted the message, so field types are already known. What remains is
//! turning JSON numbers into ids, coordinates and kinds. A number that
//! cannot be an id or a coordinate (fractional, negative or too large)
//! makes the command meaningless and it is dropped.

use serde_json::Value;

use crate::kinds::Kind;
use crate::message::MessageType;
use crate::types::{EntityId, Position};

/// A command sent by a player.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Hello {
        name: String,
        armor: Kind,
        weapon: Kind,
    },
    Move(Position),
    LootMove {
        position: Position,
        item: EntityId,
    },
    Aggro(EntityId),
    Attack(EntityId),
    Hit(EntityId),
    Hurt(EntityId),
    Chat(String),
    Loot(EntityId),
    Teleport(Position),
    Who(Vec<EntityId>),
    Zone,
    Open(EntityId),
    Check(i64),
    /// A well formed command of a type the world has no handler for.
    Other { action: i64, fields: Vec<Value> },
}

impl Command {
    /// Builds a command from a format-checked message.
    pub fn decode(message: &[Value]) -> Option<Command> {
        let (head, fields) = message.split_first()?;
        let action = head.as_i64()?;

        let command = match MessageType::from_id(action) {
            Some(MessageType::Hello) => Command::Hello {
                name: text(fields, 0)?,
                armor: kind(fields, 1)
                    .filter(|k| k.is_armor())
                    .unwrap_or(Kind::ClothArmor),
                weapon: kind(fields, 2)
                    .filter(|k| k.is_weapon())
                    .unwrap_or(Kind::Sword1),
            },
            Some(MessageType::Move) => Command::Move(position(fields, 0)?),
            Some(MessageType::LootMove) => Command::LootMove {
                position: position(fields, 0)?,
                item: entity_id(fields, 2)?,
            },
            Some(MessageType::Aggro) => Command::Aggro(entity_id(fields, 0)?),
            Some(MessageType::Attack) => Command::Attack(entity_id(fields, 0)?),
            Some(MessageType::Hit) => Command::Hit(entity_id(fields, 0)?),
            Some(MessageType::Hurt) => Command::Hurt(entity_id(fields, 0)?),
            Some(MessageType::Chat) => Command::Chat(text(fields, 0)?),
            Some(MessageType::Loot) => Command::Loot(entity_id(fields, 0)?),
            Some(MessageType::Teleport) => Command::Teleport(position(fields, 0)?),
            Some(MessageType::Who) => Command::Who(
                (0..fields.len())
                    .filter_map(|i| entity_id(fields, i))
                    .collect(),
            ),
            Some(MessageType::Zone) => Command::Zone,
            Some(MessageType::Open) => Command::Open(entity_id(fields, 0)?),
            Some(MessageType::Check) => Command::Check(fields.first()?.as_i64()?),
            _ => Command::Other {
                action,
                fields: fields.to_vec(),
            },
        };

        Some(command)
    }
}

fn text(fields: &[Value], index: usize) -> Option<String> {
    fields.get(index)?.as_str().map(str::to_string)
}

fn entity_id(fields: &[Value], index: usize) -> Option<EntityId> {
    fields.get(index)?.as_u64().map(EntityId)
}

fn coordinate(fields: &[Value], index: usize) -> Option<i32> {
    let value = fields.get(index)?.as_u64()?;
    i32::try_from(value).ok()
}

fn position(fields: &[Value], index: usize) -> Option<Position> {
    Some(Position::new(
        coordinate(fields, index)?,
        coordinate(fields, index + 1)?,
    ))
}

fn kind(fields: &[Value], index: usize) -> Option<Kind> {
    Kind::from_id(fields.get(index)?.as_i64()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: Value) -> Option<Command> {
        Command::decode(value.as_array()?)
    }

    #[test]
    fn decodes_hello() {
        assert_eq!(
            decode(json!([0, "bob", 22, 61])),
            Some(Command::Hello {
                name: "bob".into(),
                armor: Kind::LeatherArmor,
                weapon: Kind::Sword2,
            })
        );
    }

    #[test]
    fn hello_with_unknown_gear_gets_starter_gear() {
        assert_eq!(
            decode(json!([0, "bob", 2, 999])),
            Some(Command::Hello {
                name: "bob".into(),
                armor: Kind::ClothArmor,
                weapon: Kind::Sword1,
            })
        );
    }

    #[test]
    fn decodes_positions_and_ids() {
        assert_eq!(
            decode(json!([4, 10, 12])),
            Some(Command::Move(Position::new(10, 12)))
        );
        assert_eq!(
            decode(json!([5, 3, 4, 77])),
            Some(Command::LootMove {
                position: Position::new(3, 4),
                item: EntityId(77),
            })
        );
        assert_eq!(
            decode(json!([20, 1, 2])),
            Some(Command::Who(vec![EntityId(1), EntityId(2)]))
        );
        assert_eq!(decode(json!([21])), Some(Command::Zone));
        assert_eq!(decode(json!([26, 3])), Some(Command::Check(3)));
    }

    #[test]
    fn drops_unusable_numbers() {
        assert_eq!(decode(json!([4, 1.5, 2])), None);
        assert_eq!(decode(json!([4, -1, 2])), None);
        assert_eq!(decode(json!([8, -3])), None);
    }

    #[test]
    fn unknown_actions_pass_through() {
        assert_eq!(
            decode(json!([40, "wave"])),
            Some(Command::Other {
                action: 40,
                fields: vec![json!("wave")],
            })
        );
    }
}
