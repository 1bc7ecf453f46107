// questions.rs — QuestionSet: the ordered questionnaire cursor.
//
// Questions are keyed by 1-based sequence number. Persisted documents carry
// the mapping with stringified keys ({"1": "...", "2": "..."}), so the type
// implements its own serde to translate between the string keys on the wire
// and the integer keys the workflow reasons about.
//
// The shrinking copy of this mapping on an application record IS the
// progress cursor: popping the lowest remaining key yields the next
// question, and emptiness signals completion. The keys are not assumed
// contiguous: a partially-corrupted record with {"3": ..., "7": ...} still
// advances correctly.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{Error as DeError, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Ordered mapping from sequence number to question text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSet {
    questions: BTreeMap<u32, String>,
}

impl QuestionSet {
    /// Build a set from question texts in order, numbered 1..N.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let questions = texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| (index as u32 + 1, text.into()))
            .collect();
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Remove and return the question with the lowest remaining sequence
    /// number. `None` when the set is exhausted.
    pub fn pop_next(&mut self) -> Option<(u32, String)> {
        self.questions.pop_first()
    }

    pub fn get(&self, number: u32) -> Option<&str> {
        self.questions.get(&number).map(String::as_str)
    }

    /// Iterate in sequence order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.questions
            .iter()
            .map(|(number, text)| (*number, text.as_str()))
    }
}

impl Serialize for QuestionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.questions.len()))?;
        for (number, text) in &self.questions {
            map.serialize_entry(&number.to_string(), text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for QuestionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuestionSetVisitor;

        impl<'de> Visitor<'de> for QuestionSetVisitor {
            type Value = QuestionSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of sequence numbers to question text")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut questions = BTreeMap::new();
                while let Some((key, text)) = access.next_entry::<String, String>()? {
                    let number: u32 = key.parse().map_err(|_| {
                        A::Error::custom(format!("invalid question number: {key:?}"))
                    })?;
                    questions.insert(number, text);
                }
                Ok(QuestionSet { questions })
            }
        }

        deserializer.deserialize_map(QuestionSetVisitor)
    }
}
