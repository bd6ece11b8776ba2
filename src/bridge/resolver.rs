//! Query classification, selection validation and default decisions.
//!
//! A [`Resolver`] is built once per engine query. It produces the prompt
//! shown to actors and remembers just enough of the query to validate a
//! selection and translate it back into an engine [`Answer`].
//!
//! ## Defaults
//!
//! When nobody answers (timeout, teardown, channel failure):
//! - action choice: pass
//! - target choice: the minimum legal selection, i.e. the first `min`
//!   candidates in query order
//! - binary choice: the query's declared fallback

use crate::catalog::ActionCatalog;
use crate::error::ProtocolError;
use crate::rules::{Answer, GameView, Query};

use super::prompt::{Prompt, PromptKind, PromptOption, Selection};

#[derive(Clone, Debug)]
pub(crate) enum Resolver {
    Catalog(ActionCatalog),
    Select { len: usize, min: usize, max: usize },
    Confirm { fallback: bool },
}

impl Resolver {
    /// Classify `query` and build its prompt at `generation`.
    pub fn prepare(query: &Query, view: &GameView, generation: u64) -> (Self, Prompt) {
        match query {
            Query::Priority { player, choices } => {
                let catalog = ActionCatalog::build(choices);
                let prompt = Prompt {
                    kind: PromptKind::ActionChoice,
                    generation,
                    player: Some(*player),
                    purpose: Some(query.purpose()),
                    description: format!("{}: choose an action", view.phase),
                    options: catalog
                        .entries()
                        .iter()
                        .cloned()
                        .map(PromptOption::Action)
                        .collect(),
                    min: 1,
                    max: 1,
                    fallback: None,
                };
                (Resolver::Catalog(catalog), prompt)
            }
            Query::Select {
                player,
                purpose,
                text,
                candidates,
                min,
                max,
            } => {
                let len = candidates.len();
                let min = (*min).min(len);
                let max = (*max).min(len).max(min);
                let prompt = Prompt {
                    kind: PromptKind::TargetChoice,
                    generation,
                    player: Some(*player),
                    purpose: Some(*purpose),
                    description: text.clone(),
                    options: candidates
                        .iter()
                        .enumerate()
                        .map(|(index, c)| PromptOption::Target {
                            index,
                            target: c.target,
                            description: c.label.clone(),
                        })
                        .collect(),
                    min,
                    max,
                    fallback: None,
                };
                (Resolver::Select { len, min, max }, prompt)
            }
            Query::Confirm {
                player,
                purpose,
                text,
                fallback,
            } => {
                let prompt = Prompt {
                    kind: PromptKind::BinaryChoice,
                    generation,
                    player: Some(*player),
                    purpose: Some(*purpose),
                    description: text.clone(),
                    options: vec![
                        PromptOption::Branch {
                            index: 0,
                            value: true,
                            description: "Yes".into(),
                        },
                        PromptOption::Branch {
                            index: 1,
                            value: false,
                            description: "No".into(),
                        },
                    ],
                    min: 1,
                    max: 1,
                    fallback: Some(*fallback),
                };
                (Resolver::Confirm { fallback: *fallback }, prompt)
            }
        }
    }

    /// Whether the query leaves no choice at all and needs no prompt.
    pub fn is_forced(&self) -> bool {
        match self {
            Resolver::Select { max, .. } => *max == 0,
            _ => false,
        }
    }

    /// The default decision as a selection and as an engine answer.
    pub fn default_decision(&self) -> (Selection, Answer) {
        match self {
            Resolver::Catalog(catalog) => (Selection::Index(catalog.pass_index()), Answer::Pass),
            Resolver::Select { min, .. } => {
                let picked: Vec<usize> = (0..*min).collect();
                (Selection::Indices(picked.clone()), Answer::Selection(picked))
            }
            Resolver::Confirm { fallback } => {
                (Selection::Boolean(*fallback), Answer::Binary(*fallback))
            }
        }
    }

    /// Validate a selection and translate it into an engine answer.
    pub fn translate(&self, selection: &Selection) -> Result<Answer, ProtocolError> {
        match self {
            Resolver::Catalog(catalog) => match selection {
                Selection::Index(i) => Ok(catalog.answer(*i)),
                Selection::Indices(v) if v.len() == 1 => Ok(catalog.answer(v[0])),
                Selection::Indices(v) => Err(ProtocolError::SelectionCount {
                    count: v.len(),
                    min: 1,
                    max: 1,
                }),
                Selection::Boolean(_) => Err(ProtocolError::WrongSelection {
                    prompt: PromptKind::ActionChoice,
                    given: selection.label(),
                }),
            },
            Resolver::Select { len, min, max } => {
                let picked = match selection {
                    Selection::Index(i) => vec![*i],
                    Selection::Indices(v) => v.clone(),
                    Selection::Boolean(_) => {
                        return Err(ProtocolError::WrongSelection {
                            prompt: PromptKind::TargetChoice,
                            given: selection.label(),
                        })
                    }
                };
                validate_indices(&picked, *len, *min, *max)?;
                Ok(Answer::Selection(picked))
            }
            Resolver::Confirm { .. } => match selection {
                Selection::Boolean(b) => Ok(Answer::Binary(*b)),
                Selection::Index(0) => Ok(Answer::Binary(true)),
                Selection::Index(1) => Ok(Answer::Binary(false)),
                Selection::Index(i) => Err(ProtocolError::OutOfRange {
                    index: *i,
                    options: 2,
                }),
                Selection::Indices(_) => Err(ProtocolError::WrongSelection {
                    prompt: PromptKind::BinaryChoice,
                    given: selection.label(),
                }),
            },
        }
    }
}

fn validate_indices(picked: &[usize], len: usize, min: usize, max: usize) -> Result<(), ProtocolError> {
    for (n, &index) in picked.iter().enumerate() {
        if index >= len {
            return Err(ProtocolError::OutOfRange {
                index,
                options: len,
            });
        }
        if picked[..n].contains(&index) {
            return Err(ProtocolError::DuplicateSelection(index));
        }
    }
    if picked.len() < min || picked.len() > max {
        return Err(ProtocolError::SelectionCount {
            count: picked.len(),
            min,
            max,
        });
    }
    Ok(())
}
