use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::schedule::ScheduleRecord;
use crate::todo::TodoRecord;

/// Result of classifying one message.
///
/// Serializes to the externally observed array shapes:
/// `["schedule", {DTSTART, DTEND, duration, title}]` or
/// `["todo", <text>, <category label>]`. The todo confidence is kept on the
/// record but not part of the array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaggedOutput {
    Schedule(ScheduleRecord),
    Todo(TodoRecord),
}

impl TaggedOutput {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Schedule(_) => "schedule",
            Self::Todo(_) => "todo",
        }
    }

    pub fn as_schedule(&self) -> Option<&ScheduleRecord> {
        match self {
            Self::Schedule(record) => Some(record),
            Self::Todo(_) => None,
        }
    }

    pub fn as_todo(&self) -> Option<&TodoRecord> {
        match self {
            Self::Todo(record) => Some(record),
            Self::Schedule(_) => None,
        }
    }

    pub fn todo_confidence(&self) -> Option<u8> {
        self.as_todo().and_then(|todo| todo.confidence)
    }
}

impl From<ScheduleRecord> for TaggedOutput {
    fn from(record: ScheduleRecord) -> Self {
        Self::Schedule(record)
    }
}

impl From<TodoRecord> for TaggedOutput {
    fn from(record: TodoRecord) -> Self {
        Self::Todo(record)
    }
}

impl Serialize for TaggedOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Schedule(record) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(self.tag())?;
                tuple.serialize_element(record)?;
                tuple.end()
            }
            Self::Todo(record) => {
                let mut tuple = serializer.serialize_tuple(3)?;
                tuple.serialize_element(self.tag())?;
                tuple.serialize_element(&record.text)?;
                tuple.serialize_element(&record.category)?;
                tuple.end()
            }
        }
    }
}
