use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{FengError, Result};
use crate::models::{ActualAttribute, AttributeType, ExpectedAttribute};
use crate::remote::SchemaStore;

pub const DEFAULT_THROTTLE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAddition {
    pub key: String,
    pub kind: AttributeType,
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeIncrease {
    pub key: String,
    pub kind: AttributeType,
    pub old_size: u32,
    pub new_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConflictIssue {
    TypeMismatch { expected: AttributeType, actual: AttributeType },
    SizeDecrease { expected: u32, actual: u32 },
}

impl ConflictIssue {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::SizeDecrease { .. } => "size_decrease",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub key: String,
    pub issue: ConflictIssue,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issue {
            ConflictIssue::TypeMismatch { expected, actual } => {
                write!(f, "Cannot change type from {actual} to {expected}")
            }
            ConflictIssue::SizeDecrease { expected, actual } => {
                write!(f, "Cannot decrease size from {actual} to {expected} (data loss risk)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtraAttribute {
    pub key: String,
    pub kind: AttributeType,
}

/// One line of the human-facing issue list.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub key: String,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDiff {
    pub to_add: Vec<AttributeAddition>,
    pub to_update: Vec<SizeIncrease>,
    pub conflicts: Vec<Conflict>,
    pub to_remove: Vec<ExtraAttribute>,
}

impl SchemaDiff {
    /// Extra remote attributes block automation too, even though they are harmless.
    pub fn can_auto_update(&self) -> bool {
        self.conflicts.is_empty() && self.to_remove.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        !self.to_add.is_empty() || !self.to_update.is_empty()
    }

    pub fn issues(&self) -> Vec<Issue> {
        let conflicts = self.conflicts.iter().map(|c| Issue {
            key: c.key.clone(),
            code: c.issue.code(),
            message: c.to_string(),
        });
        let extras = self.to_remove.iter().map(|r| Issue {
            key: r.key.clone(),
            code: "extra_attribute",
            message: format!("Extra {} attribute not in expected schema", r.kind),
        });
        conflicts.chain(extras).collect()
    }
}

/// Compare the attributes a collection should have with the ones it reports.
pub fn analyze_schema(expected: &[ExpectedAttribute], actual: &[ActualAttribute]) -> SchemaDiff {
    let actual_by_key: HashMap<&str, &ActualAttribute> =
        actual.iter().map(|a| (a.key.as_str(), a)).collect();
    let mut diff = SchemaDiff::default();

    for exp in expected {
        let Some(act) = actual_by_key.get(exp.key.as_str()) else {
            diff.to_add.push(AttributeAddition {
                key: exp.key.clone(),
                kind: exp.kind,
                size: exp.size,
            });
            continue;
        };
        if exp.kind != act.kind {
            diff.conflicts.push(Conflict {
                key: exp.key.clone(),
                issue: ConflictIssue::TypeMismatch { expected: exp.kind, actual: act.kind },
            });
            continue;
        }
        if let (Some(want), Some(have)) = (exp.size, act.size) {
            if want > have {
                diff.to_update.push(SizeIncrease {
                    key: exp.key.clone(),
                    kind: exp.kind,
                    old_size: have,
                    new_size: want,
                });
            } else if want < have {
                diff.conflicts.push(Conflict {
                    key: exp.key.clone(),
                    issue: ConflictIssue::SizeDecrease { expected: want, actual: have },
                });
            }
        }
    }

    for act in actual {
        if !expected.iter().any(|e| e.key == act.key) {
            diff.to_remove.push(ExtraAttribute { key: act.key.clone(), kind: act.kind });
        }
    }
    diff
}

/// Attributes still being provisioned remotely take no part in analysis.
pub fn available_attributes(attributes: &[ActualAttribute]) -> Vec<ActualAttribute> {
    attributes.iter().filter(|a| a.is_available()).cloned().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaAction {
    Created,
    Updated,
}

impl fmt::Display for SchemaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
        })
    }
}

#[derive(Debug)]
pub struct AttributeResult {
    pub key: String,
    pub action: SchemaAction,
    pub outcome: Result<()>,
}

impl AttributeResult {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

fn create_attribute(store: &impl SchemaStore, collection_id: &str, add: &AttributeAddition) -> Result<()> {
    // New attributes are optional so existing documents stay valid.
    match add.kind {
        AttributeType::String => {
            let size = add.size.ok_or_else(|| {
                FengError::Other(format!("string attribute {} has no size", add.key))
            })?;
            store.create_string_attribute(collection_id, &add.key, size, false)
        }
        AttributeType::Integer => store.create_integer_attribute(collection_id, &add.key, false),
        AttributeType::Url => store.create_url_attribute(collection_id, &add.key, false),
        AttributeType::Datetime => store.create_datetime_attribute(collection_id, &add.key, false),
        AttributeType::Boolean => store.create_boolean_attribute(collection_id, &add.key, false),
        AttributeType::Other => Err(FengError::Other(format!(
            "cannot create attribute {} of unsupported type",
            add.key
        ))),
    }
}

/// Apply the additions and size increases of `diff`, one call at a time, pausing
/// `throttle` after every call. A failed attribute does not stop the rest.
pub fn auto_update_schema(
    store: &impl SchemaStore,
    collection_id: &str,
    diff: &SchemaDiff,
    throttle: Duration,
) -> Result<Vec<AttributeResult>> {
    if !diff.can_auto_update() {
        let keys: Vec<String> = diff.issues().into_iter().map(|i| i.key).collect();
        return Err(FengError::SchemaBlocked(keys.join(", ")));
    }

    let mut results = Vec::with_capacity(diff.to_add.len() + diff.to_update.len());
    let pause = || {
        if !throttle.is_zero() {
            std::thread::sleep(throttle);
        }
    };

    for add in &diff.to_add {
        let outcome = create_attribute(store, collection_id, add);
        match &outcome {
            Ok(()) => info!(key = %add.key, kind = %add.kind, "created attribute"),
            Err(e) => warn!(key = %add.key, error = %e, "attribute creation failed"),
        }
        results.push(AttributeResult { key: add.key.clone(), action: SchemaAction::Created, outcome });
        pause();
    }

    for update in &diff.to_update {
        let outcome = store.update_string_attribute(collection_id, &update.key, update.new_size, false);
        match &outcome {
            Ok(()) => info!(key = %update.key, from = update.old_size, to = update.new_size, "widened attribute"),
            Err(e) => warn!(key = %update.key, error = %e, "attribute size update failed"),
        }
        results.push(AttributeResult { key: update.key.clone(), action: SchemaAction::Updated, outcome });
        pause();
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryStore;

    fn expected(key: &str, kind: AttributeType, size: Option<u32>) -> ExpectedAttribute {
        ExpectedAttribute { key: key.to_string(), kind, size, required: false }
    }

    fn actual(key: &str, kind: AttributeType, size: Option<u32>) -> ActualAttribute {
        ActualAttribute { key: key.to_string(), kind, size, required: false, status: None }
    }

    #[test]
    fn test_missing_attribute_goes_to_add_only() {
        let diff = analyze_schema(&[expected("title", AttributeType::String, Some(100))], &[]);
        assert_eq!(
            diff.to_add,
            vec![AttributeAddition { key: "title".into(), kind: AttributeType::String, size: Some(100) }]
        );
        assert!(diff.to_update.is_empty() && diff.conflicts.is_empty() && diff.to_remove.is_empty());
        assert!(diff.can_auto_update());
        assert!(diff.has_changes());
    }

    #[test]
    fn test_size_decrease_is_a_conflict() {
        let diff = analyze_schema(
            &[expected("content", AttributeType::String, Some(500))],
            &[actual("content", AttributeType::String, Some(1000))],
        );
        assert!(diff.to_update.is_empty());
        assert_eq!(diff.conflicts.len(), 1);
        assert_eq!(diff.conflicts[0].issue.code(), "size_decrease");
        assert_eq!(
            diff.conflicts[0].to_string(),
            "Cannot decrease size from 1000 to 500 (data loss risk)"
        );
        assert!(!diff.can_auto_update());
    }

    #[test]
    fn test_size_increase_is_an_update() {
        let diff = analyze_schema(
            &[expected("content", AttributeType::String, Some(1000))],
            &[actual("content", AttributeType::String, Some(500))],
        );
        assert_eq!(diff.to_update.len(), 1);
        assert_eq!((diff.to_update[0].old_size, diff.to_update[0].new_size), (500, 1000));
        assert!(diff.conflicts.is_empty());
    }

    #[test]
    fn test_type_mismatch_takes_precedence_over_size() {
        let diff = analyze_schema(
            &[expected("site", AttributeType::Url, None)],
            &[actual("site", AttributeType::String, Some(100))],
        );
        assert_eq!(diff.conflicts.len(), 1);
        assert_eq!(
            diff.conflicts[0].issue,
            ConflictIssue::TypeMismatch { expected: AttributeType::Url, actual: AttributeType::String }
        );
    }

    #[test]
    fn test_matching_or_unsized_attributes_produce_nothing() {
        let diff = analyze_schema(
            &[
                expected("name", AttributeType::String, Some(100)),
                expected("deposit", AttributeType::Integer, None),
            ],
            &[
                actual("name", AttributeType::String, Some(100)),
                actual("deposit", AttributeType::Integer, None),
            ],
        );
        assert_eq!(diff, SchemaDiff::default());
        assert!(!diff.has_changes());
    }

    #[test]
    fn test_extra_attribute_blocks_auto_update() {
        let diff = analyze_schema(&[], &[actual("legacy", AttributeType::String, Some(10))]);
        assert_eq!(diff.to_remove.len(), 1);
        assert!(!diff.has_changes());
        assert!(!diff.can_auto_update());
        let issues = diff.issues();
        assert_eq!(issues[0].code, "extra_attribute");
    }

    #[test]
    fn test_each_key_lands_in_one_list() {
        let diff = analyze_schema(
            &[
                expected("a", AttributeType::String, Some(10)),
                expected("b", AttributeType::String, Some(20)),
                expected("c", AttributeType::String, Some(5)),
                expected("d", AttributeType::Integer, None),
            ],
            &[
                actual("b", AttributeType::String, Some(10)),
                actual("c", AttributeType::String, Some(50)),
                actual("d", AttributeType::Boolean, None),
                actual("e", AttributeType::Url, None),
            ],
        );
        let mut keys: Vec<&str> = diff.to_add.iter().map(|a| a.key.as_str())
            .chain(diff.to_update.iter().map(|u| u.key.as_str()))
            .chain(diff.conflicts.iter().map(|c| c.key.as_str()))
            .chain(diff.to_remove.iter().map(|r| r.key.as_str()))
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_available_attributes_filters_status() {
        let mut processing = actual("x", AttributeType::String, Some(1));
        processing.status = Some("processing".into());
        let mut ready = actual("y", AttributeType::String, Some(1));
        ready.status = Some("available".into());
        let kept = available_attributes(&[processing, ready, actual("z", AttributeType::Url, None)]);
        let keys: Vec<&str> = kept.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["y", "z"]);
    }

    #[test]
    fn test_auto_update_dispatches_by_type() {
        let store = MemoryStore::with_collection("c", "article");
        store.add_attribute("c", "content", AttributeType::String, Some(500));
        let diff = SchemaDiff {
            to_add: vec![
                AttributeAddition { key: "title".into(), kind: AttributeType::String, size: Some(100) },
                AttributeAddition { key: "newDate".into(), kind: AttributeType::Datetime, size: None },
                AttributeAddition { key: "url1".into(), kind: AttributeType::Url, size: None },
                AttributeAddition { key: "views".into(), kind: AttributeType::Integer, size: None },
                AttributeAddition { key: "done".into(), kind: AttributeType::Boolean, size: None },
            ],
            to_update: vec![SizeIncrease {
                key: "content".into(),
                kind: AttributeType::String,
                old_size: 500,
                new_size: 1000,
            }],
            ..Default::default()
        };
        let results = auto_update_schema(&store, "c", &diff, Duration::ZERO).unwrap();
        assert!(results.iter().all(AttributeResult::succeeded));
        assert_eq!(
            *store.calls.borrow(),
            vec![
                "create_string title 100",
                "create_datetime newDate",
                "create_url url1",
                "create_integer views",
                "create_boolean done",
                "update_string content 1000",
            ]
        );
    }

    #[test]
    fn test_auto_update_continues_after_failure() {
        let store = MemoryStore::with_collection("c", "article");
        store.fail("url1");
        let diff = SchemaDiff {
            to_add: vec![
                AttributeAddition { key: "url1".into(), kind: AttributeType::Url, size: None },
                AttributeAddition { key: "url2".into(), kind: AttributeType::Url, size: None },
            ],
            to_update: vec![SizeIncrease {
                key: "missing".into(),
                kind: AttributeType::String,
                old_size: 1,
                new_size: 2,
            }],
            ..Default::default()
        };
        let results = auto_update_schema(&store, "c", &diff, Duration::ZERO).unwrap();
        let ok: Vec<bool> = results.iter().map(AttributeResult::succeeded).collect();
        assert_eq!(ok, vec![false, true, false]);
        assert_eq!(results[2].action, SchemaAction::Updated);
    }

    #[test]
    fn test_auto_update_refuses_blocked_diff() {
        let store = MemoryStore::with_collection("c", "article");
        let diff = analyze_schema(&[], &[actual("legacy", AttributeType::String, Some(10))]);
        let err = auto_update_schema(&store, "c", &diff, Duration::ZERO).unwrap_err();
        assert!(matches!(err, FengError::SchemaBlocked(keys) if keys == "legacy"));
        assert!(store.calls.borrow().is_empty());
    }

    #[test]
    fn test_throttle_applies_to_every_operation() {
        let store = MemoryStore::with_collection("c", "article");
        store.add_attribute("c", "a", AttributeType::String, Some(1));
        let diff = SchemaDiff {
            to_add: vec![AttributeAddition { key: "b".into(), kind: AttributeType::Integer, size: None }],
            to_update: vec![SizeIncrease { key: "a".into(), kind: AttributeType::String, old_size: 1, new_size: 2 }],
            ..Default::default()
        };
        let started = std::time::Instant::now();
        auto_update_schema(&store, "c", &diff, Duration::from_millis(20)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
