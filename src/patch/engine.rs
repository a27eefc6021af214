use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{debug, instrument, trace};

use super::selector::{Selector, Token};
use super::{Operation, OperationType, Patch, PatchError};
use crate::document::render_scalar;

/// Why an operation left the document untouched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("operation has no value")]
    MissingValue,

    #[error("{0}")]
    Unresolved(String),

    #[error("unsupported: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Applied,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationReport {
    /// Position of the patch in the list handed to [`apply_patches`]
    pub patch: usize,
    /// Position of the operation within its patch
    pub operation: usize,
    pub kind: OperationType,
    pub path: String,
    pub outcome: OperationOutcome,
}

/// What happened to every operation of every matching patch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchReport {
    pub matched: Vec<usize>,
    pub operations: Vec<OperationReport>,
}

impl PatchReport {
    pub fn applied(&self) -> impl Iterator<Item = &OperationReport> {
        self.operations
            .iter()
            .filter(|op| op.outcome == OperationOutcome::Applied)
    }

    pub fn skipped(&self) -> impl Iterator<Item = &OperationReport> {
        self.operations
            .iter()
            .filter(|op| matches!(op.outcome, OperationOutcome::Skipped(_)))
    }
}

#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub bytes: Vec<u8>,
    pub report: PatchReport,
}

/// Apply every matching patch to a raw document, in order.
///
/// Each patch sees the output of the previous one. Operations that cannot
/// be resolved are skipped without touching the document. The only errors
/// are input that is not structured text at all and a failure to encode
/// the result. When nothing changed, the input bytes come back verbatim.
#[instrument(skip_all, fields(patches = patches.len()))]
pub fn apply_patches(patches: &[Patch], bytes: &[u8]) -> Result<PatchOutcome, PatchError> {
    let mut document: Value = serde_yaml::from_slice(bytes).map_err(PatchError::Document)?;
    let mut report = PatchReport::default();
    let mut mutated = false;

    for (patch_idx, patch) in patches.iter().enumerate() {
        if !patch.matcher.matches(&document) {
            trace!(patch = patch_idx, "Patch does not match document");
            continue;
        }

        report.matched.push(patch_idx);

        for (op_idx, operation) in patch.operations.iter().enumerate() {
            let outcome = match apply_operation(&mut document, operation) {
                Ok(changed) => {
                    mutated |= changed;
                    OperationOutcome::Applied
                }
                Err(reason) => {
                    debug!(
                        patch = patch_idx,
                        operation = op_idx,
                        kind = %operation.kind,
                        path = %operation.path,
                        "Skipping patch operation: {reason}"
                    );
                    OperationOutcome::Skipped(reason)
                }
            };

            report.operations.push(OperationReport {
                patch: patch_idx,
                operation: op_idx,
                kind: operation.kind,
                path: operation.path.clone(),
                outcome,
            });
        }
    }

    if !mutated {
        return Ok(PatchOutcome {
            bytes: bytes.to_vec(),
            report,
        });
    }

    let encoded = serde_yaml::to_string(&document).map_err(PatchError::Encoding)?;

    Ok(PatchOutcome {
        bytes: encoded.into_bytes(),
        report,
    })
}

/// Returns whether the document was changed
fn apply_operation(document: &mut Value, operation: &Operation) -> Result<bool, SkipReason> {
    // test operations are always satisfied, even when the path is unusable
    if operation.kind == OperationType::Test {
        match operation.path.parse::<Selector>() {
            Ok(selector) => {
                let actual = lookup(document, selector.tokens());
                let satisfied = actual.is_some() && actual == operation.value.as_ref();
                debug!(path = %selector, satisfied, "Evaluated test operation");
            }
            Err(reason) => {
                debug!(path = %operation.path, "Test operation has an invalid path: {reason}");
            }
        }
        return Ok(false);
    }

    let selector: Selector = operation.path.parse().map_err(SkipReason::InvalidPath)?;

    match operation.kind {
        OperationType::Test => Ok(false),
        OperationType::Unsupported => Err(SkipReason::Unsupported(
            "operation type must be add, replace, remove or test".to_string(),
        )),
        kind => {
            let value = match kind {
                OperationType::Remove => None,
                _ => Some(operation.value.as_ref().ok_or(SkipReason::MissingValue)?),
            };

            // work on a copy so a failure halfway down the path leaves no trace
            let mut candidate = document.clone();
            mutate(&mut candidate, selector.tokens(), kind, value)?;
            *document = candidate;
            Ok(true)
        }
    }
}

fn mutate(
    root: &mut Value,
    tokens: &[Token],
    kind: OperationType,
    value: Option<&Value>,
) -> Result<(), SkipReason> {
    let Some((last, parents)) = tokens.split_last() else {
        return match value {
            Some(value) => {
                *root = value.clone();
                Ok(())
            }
            None => Err(SkipReason::Unsupported(
                "cannot remove the document root".to_string(),
            )),
        };
    };

    let mut current = root;
    for (idx, token) in parents.iter().enumerate() {
        let next = parents.get(idx + 1).unwrap_or(last);
        current = descend(current, token, next)?;
    }

    match value {
        Some(value) => set(current, last, kind, value.clone()),
        None => remove(current, last),
    }
}

/// Step into the child addressed by `token`, creating it when the token is
/// optional and the child is missing
fn descend<'a>(
    node: &'a mut Value,
    token: &Token,
    next: &Token,
) -> Result<&'a mut Value, SkipReason> {
    match token {
        Token::Key { name, optional } => {
            let map = as_mapping(node, token)?;
            let missing = map.get(name.as_str()).is_none_or(Value::is_null);

            if missing {
                if !optional {
                    return Err(SkipReason::Unresolved(format!("key {name:?} does not exist")));
                }
                map.insert(Value::String(name.clone()), empty_container(next));
            }

            map.get_mut(name.as_str())
                .ok_or_else(|| SkipReason::Unresolved(format!("key {name:?} does not exist")))
        }
        Token::Index(idx) => {
            let seq = as_sequence(node, token)?;
            let len = seq.len();
            seq.get_mut(*idx).ok_or_else(|| out_of_bounds(*idx, len))
        }
        Token::Append => {
            let seq = as_sequence(node, token)?;
            seq.push(empty_container(next));
            seq.last_mut()
                .ok_or_else(|| SkipReason::Unresolved("appended element vanished".to_string()))
        }
        Token::Match {
            key,
            value,
            optional,
        } => {
            let seq = as_sequence(node, token)?;
            match find_match(seq, key, value) {
                Some(pos) => Ok(&mut seq[pos]),
                None if *optional => {
                    let mut element = Mapping::new();
                    element.insert(Value::String(key.clone()), Value::String(value.clone()));
                    seq.push(Value::Mapping(element));
                    seq.last_mut().ok_or_else(|| {
                        SkipReason::Unresolved("appended element vanished".to_string())
                    })
                }
                None => Err(no_match(key, value)),
            }
        }
    }
}

fn set(node: &mut Value, token: &Token, kind: OperationType, value: Value) -> Result<(), SkipReason> {
    match token {
        Token::Key { name, optional } => {
            let map = as_mapping(node, token)?;
            if kind == OperationType::Replace && !optional && !map.contains_key(name.as_str()) {
                return Err(SkipReason::Unresolved(format!("key {name:?} does not exist")));
            }
            map.insert(Value::String(name.clone()), value);
            Ok(())
        }
        Token::Index(idx) => {
            let seq = as_sequence(node, token)?;
            let len = seq.len();
            if kind == OperationType::Add {
                if *idx > len {
                    return Err(out_of_bounds(*idx, len));
                }
                seq.insert(*idx, value);
            } else {
                let slot = seq.get_mut(*idx).ok_or_else(|| out_of_bounds(*idx, len))?;
                *slot = value;
            }
            Ok(())
        }
        Token::Append => {
            as_sequence(node, token)?.push(value);
            Ok(())
        }
        Token::Match {
            key,
            value: expected,
            optional,
        } => {
            let seq = as_sequence(node, token)?;
            match find_match(seq, key, expected) {
                Some(pos) => seq[pos] = value,
                None if *optional => seq.push(value),
                None => return Err(no_match(key, expected)),
            }
            Ok(())
        }
    }
}

fn remove(node: &mut Value, token: &Token) -> Result<(), SkipReason> {
    match token {
        Token::Key { name, optional } => {
            let map = as_mapping(node, token)?;
            if map.remove(name.as_str()).is_none() && !optional {
                return Err(SkipReason::Unresolved(format!("key {name:?} does not exist")));
            }
            Ok(())
        }
        Token::Index(idx) => {
            let seq = as_sequence(node, token)?;
            if *idx >= seq.len() {
                return Err(out_of_bounds(*idx, seq.len()));
            }
            seq.remove(*idx);
            Ok(())
        }
        Token::Append => Err(SkipReason::Unsupported(
            "'-' cannot be removed".to_string(),
        )),
        Token::Match {
            key,
            value,
            optional,
        } => {
            let seq = as_sequence(node, token)?;
            match find_match(seq, key, value) {
                Some(pos) => {
                    seq.remove(pos);
                    Ok(())
                }
                None if *optional => Ok(()),
                None => Err(no_match(key, value)),
            }
        }
    }
}

/// Read-only resolution used by `test` operations
fn lookup<'a>(root: &'a Value, tokens: &[Token]) -> Option<&'a Value> {
    tokens.iter().try_fold(root, |node, token| match token {
        Token::Key { name, .. } => node.get(name.as_str()),
        Token::Index(idx) => node.get(*idx),
        Token::Append => None,
        Token::Match { key, value, .. } => {
            let seq = node.as_sequence()?;
            find_match(seq, key, value).map(|pos| &seq[pos])
        }
    })
}

fn find_match(seq: &[Value], key: &str, expected: &str) -> Option<usize> {
    seq.iter().position(|element| {
        element
            .get(key)
            .and_then(render_scalar)
            .is_some_and(|actual| actual == expected)
    })
}

fn empty_container(next: &Token) -> Value {
    if next.wants_sequence() {
        Value::Sequence(Vec::new())
    } else {
        Value::Mapping(Mapping::new())
    }
}

fn as_mapping<'a>(node: &'a mut Value, token: &Token) -> Result<&'a mut Mapping, SkipReason> {
    node.as_mapping_mut()
        .ok_or_else(|| SkipReason::Unresolved(format!("{token} does not address a mapping")))
}

fn as_sequence<'a>(node: &'a mut Value, token: &Token) -> Result<&'a mut Vec<Value>, SkipReason> {
    node.as_sequence_mut()
        .ok_or_else(|| SkipReason::Unresolved(format!("{token} does not address a sequence")))
}

fn out_of_bounds(idx: usize, len: usize) -> SkipReason {
    SkipReason::Unresolved(format!("index {idx} is out of bounds for length {len}"))
}

fn no_match(key: &str, value: &str) -> SkipReason {
    SkipReason::Unresolved(format!("no element with {key}={value}"))
}
