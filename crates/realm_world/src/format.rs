//! Structural validation of inbound messages.

use std::collections::HashMap;

use serde_json::Value;

use crate::message::MessageType;

/// Expected JSON type of a message field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Number,
    Text,
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::Number => value.is_number(),
            FieldType::Text => value.is_string(),
        }
    }
}

/// Field layouts of every command a client may send.
///
/// A message passes when its first element is a known type id and the
/// remaining elements match that type's layout exactly. WHO is the one
/// variadic command: it takes one or more numbers.
#[derive(Debug, Clone)]
pub struct FormatChecker {
    formats: HashMap<i64, Vec<FieldType>>,
}

impl Default for FormatChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatChecker {
    pub fn new() -> Self {
        use FieldType::{Number as N, Text as S};

        let builtin: [(MessageType, Vec<FieldType>); 13] = [
            (MessageType::Hello, vec![S, N, N]),
            (MessageType::Move, vec![N, N]),
            (MessageType::LootMove, vec![N, N, N]),
            (MessageType::Aggro, vec![N]),
            (MessageType::Attack, vec![N]),
            (MessageType::Hit, vec![N]),
            (MessageType::Hurt, vec![N]),
            (MessageType::Chat, vec![S]),
            (MessageType::Loot, vec![N]),
            (MessageType::Teleport, vec![N, N]),
            (MessageType::Zone, vec![]),
            (MessageType::Open, vec![N]),
            (MessageType::Check, vec![N]),
        ];

        Self {
            formats: builtin
                .into_iter()
                .map(|(t, fields)| (t.id() as i64, fields))
                .collect(),
        }
    }

    /// Adds or replaces the layout of a message type.
    pub fn register(&mut self, message_type: i64, fields: Vec<FieldType>) {
        self.formats.insert(message_type, fields);
    }

    pub fn is_registered(&self, message_type: i64) -> bool {
        self.formats.contains_key(&message_type)
    }

    pub fn check(&self, message: &[Value]) -> bool {
        let Some((head, fields)) = message.split_first() else {
            return false;
        };
        let Some(message_type) = head.as_i64() else {
            return false;
        };

        if let Some(format) = self.formats.get(&message_type) {
            return format.len() == fields.len()
                && format.iter().zip(fields).all(|(f, v)| f.matches(v));
        }

        if message_type == MessageType::Who.id() as i64 {
            return !fields.is_empty() && fields.iter().all(Value::is_number);
        }

        false
    }
}
