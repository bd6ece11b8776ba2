//! Prompts and decisions: the wire-level view of a pending engine query.
//!
//! A [`Prompt`] is immutable once published and is identified by its
//! generation. A [`Decision`] names the generation it answers plus one
//! selection.
//!
//! Decision payloads look like `{"generation": 4, "index": 2}`,
//! `{"generation": 5, "indices": [0, 3]}` or
//! `{"generation": 6, "boolean": false}`.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::core::PlayerId;
use crate::error::ProtocolError;
use crate::rules::{Purpose, Target};

/// Category of a pending decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Choose one catalog action by index.
    ActionChoice,
    /// Choose between `min` and `max` candidates.
    TargetChoice,
    /// Yes or no.
    BinaryChoice,
    /// Nothing is pending.
    #[default]
    None,
}

/// One selectable option of a prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptOption {
    Action(CatalogEntry),
    Target {
        index: usize,
        target: Target,
        description: String,
    },
    Branch {
        index: usize,
        value: bool,
        description: String,
    },
}

impl PromptOption {
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            PromptOption::Action(entry) => entry.index,
            PromptOption::Target { index, .. } | PromptOption::Branch { index, .. } => *index,
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            PromptOption::Action(entry) => &entry.description,
            PromptOption::Target { description, .. } | PromptOption::Branch { description, .. } => {
                description
            }
        }
    }
}

/// A pending decision, as exposed to external actors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub kind: PromptKind,

    /// Generation a decision must quote to answer this prompt.
    pub generation: u64,

    /// Seat that must decide.
    pub player: Option<PlayerId>,

    pub purpose: Option<Purpose>,

    pub description: String,

    pub options: Vec<PromptOption>,

    /// Selection bounds. Both 1 for action and binary choices.
    pub min: usize,
    pub max: usize,

    /// Answer used for binary choices when nobody answers in time.
    pub fallback: Option<bool>,
}

impl Prompt {
    /// The "nothing pending" prompt at a given generation.
    #[must_use]
    pub fn idle(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.kind != PromptKind::None
    }

    /// Index of the pass entry of an action choice.
    #[must_use]
    pub fn pass_index(&self) -> Option<usize> {
        match self.kind {
            PromptKind::ActionChoice => self.options.len().checked_sub(1),
            _ => None,
        }
    }

    /// Selection the bridge applies when this prompt goes unanswered.
    #[must_use]
    pub fn default_selection(&self) -> Selection {
        match self.kind {
            PromptKind::ActionChoice => Selection::Index(self.pass_index().unwrap_or(0)),
            PromptKind::TargetChoice => {
                Selection::Indices((0..self.min.min(self.options.len())).collect())
            }
            PromptKind::BinaryChoice => Selection::Boolean(self.fallback.unwrap_or(false)),
            PromptKind::None => Selection::Index(0),
        }
    }

    /// Map a single index from a fixed-size action space onto a legal
    /// selection for this prompt.
    ///
    /// - action choices keep the index; the catalog collapses overflow
    /// - target choices select the candidate if it exists, then pad with the
    ///   lowest unused candidates up to `min`
    /// - binary choices map 0 to yes and anything else to no
    #[must_use]
    pub fn selection_for_index(&self, index: usize) -> Selection {
        match self.kind {
            PromptKind::TargetChoice => {
                let len = self.options.len();
                let mut picked = Vec::new();
                if self.max > 0 && index < len {
                    picked.push(index);
                }
                let mut next = 0;
                while picked.len() < self.min.min(len) {
                    if !picked.contains(&next) {
                        picked.push(next);
                    }
                    next += 1;
                }
                Selection::Indices(picked)
            }
            PromptKind::BinaryChoice => Selection::Index(index.min(1)),
            PromptKind::ActionChoice | PromptKind::None => Selection::Index(index),
        }
    }

    /// Decision answering this prompt.
    #[must_use]
    pub fn decide(&self, selection: Selection) -> Decision {
        Decision {
            generation: self.generation,
            selection,
        }
    }
}

/// What an actor selected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    Index(usize),
    Indices(Vec<usize>),
    Boolean(bool),
}

impl Selection {
    /// Name of the variant, for error messages.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Selection::Index(_) => "an index",
            Selection::Indices(_) => "a list of indices",
            Selection::Boolean(_) => "a boolean",
        }
    }
}

/// An answer to the prompt of one generation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DecisionWire", into = "DecisionWire")]
pub struct Decision {
    pub generation: u64,
    pub selection: Selection,
}

impl Decision {
    pub fn index(generation: u64, index: usize) -> Self {
        Self {
            generation,
            selection: Selection::Index(index),
        }
    }

    pub fn indices(generation: u64, indices: Vec<usize>) -> Self {
        Self {
            generation,
            selection: Selection::Indices(indices),
        }
    }

    pub fn boolean(generation: u64, value: bool) -> Self {
        Self {
            generation,
            selection: Selection::Boolean(value),
        }
    }

    /// Parse a JSON decision payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ProtocolError> {
        serde_json::from_slice(bytes).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

#[derive(Serialize, Deserialize)]
struct DecisionWire {
    generation: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    indices: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    boolean: Option<bool>,
}

impl TryFrom<DecisionWire> for Decision {
    type Error = ProtocolError;

    fn try_from(wire: DecisionWire) -> Result<Self, Self::Error> {
        let selection = match (wire.index, wire.indices, wire.boolean) {
            (Some(i), None, None) => Selection::Index(i),
            (None, Some(v), None) => Selection::Indices(v),
            (None, None, Some(b)) => Selection::Boolean(b),
            (None, None, None) => {
                return Err(ProtocolError::Malformed(
                    "expected one of index, indices or boolean".into(),
                ))
            }
            _ => {
                return Err(ProtocolError::Malformed(
                    "only one of index, indices or boolean may be given".into(),
                ))
            }
        };
        Ok(Decision {
            generation: wire.generation,
            selection,
        })
    }
}

impl From<Decision> for DecisionWire {
    fn from(decision: Decision) -> Self {
        let mut wire = DecisionWire {
            generation: decision.generation,
            index: None,
            indices: None,
            boolean: None,
        };
        match decision.selection {
            Selection::Index(i) => wire.index = Some(i),
            Selection::Indices(v) => wire.indices = Some(v),
            Selection::Boolean(b) => wire.boolean = Some(b),
        }
        wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets(len: usize, min: usize, max: usize) -> Prompt {
        Prompt {
            kind: PromptKind::TargetChoice,
            generation: 1,
            options: (0..len)
                .map(|index| PromptOption::Target {
                    index,
                    target: Target::Player(PlayerId::new(index as u8)),
                    description: format!("target {}", index),
                })
                .collect(),
            min,
            max,
            ..Prompt::default()
        }
    }

    #[test]
    fn test_decision_wire_format() {
        let decision = Decision::from_json(br#"{"generation": 4, "index": 2}"#).unwrap();
        assert_eq!(decision, Decision::index(4, 2));

        let decision = Decision::from_json(br#"{"generation": 5, "indices": [0, 3]}"#).unwrap();
        assert_eq!(decision.selection, Selection::Indices(vec![0, 3]));

        let json = serde_json::to_string(&Decision::boolean(6, false)).unwrap();
        assert_eq!(json, r#"{"generation":6,"boolean":false}"#);
    }

    #[test]
    fn test_malformed_decisions() {
        let payloads: [&[u8]; 4] = [
            br#"{"generation": 4}"#,
            br#"{"generation": 4, "index": 1, "boolean": true}"#,
            br#"{"index": 1}"#,
            b"not json",
        ];
        for payload in payloads {
            assert!(matches!(
                Decision::from_json(payload),
                Err(ProtocolError::Malformed(_))
            ));
        }
    }

    #[test]
    fn test_idle_prompt() {
        let prompt = Prompt::idle(9);
        assert!(!prompt.is_pending());
        assert_eq!(prompt.generation, 9);
        assert_eq!(serde_json::to_value(&prompt).unwrap()["kind"], "none");
    }

    #[test]
    fn test_selection_for_index_targets() {
        let prompt = targets(3, 1, 1);
        assert_eq!(prompt.selection_for_index(2), Selection::Indices(vec![2]));
        assert_eq!(prompt.selection_for_index(50), Selection::Indices(vec![0]));

        let optional = targets(3, 0, 3);
        assert_eq!(optional.selection_for_index(50), Selection::Indices(vec![]));

        let forced = targets(3, 2, 2);
        assert_eq!(forced.selection_for_index(1), Selection::Indices(vec![1, 0]));
    }

    #[test]
    fn test_default_selection() {
        assert_eq!(targets(3, 2, 3).default_selection(), Selection::Indices(vec![0, 1]));

        let binary = Prompt {
            kind: PromptKind::BinaryChoice,
            fallback: Some(true),
            ..Prompt::default()
        };
        assert_eq!(binary.default_selection(), Selection::Boolean(true));
        assert_eq!(binary.selection_for_index(7), Selection::Index(1));
    }
}
