//! Immutable, validated rule storage.
//!
//! Rows are converted once at startup. A row that cannot run is left out
//! and reported; a bad row never fails the load as a whole. Agents borrow
//! rules as `Arc<Rule>` and keep their own timers in [`ScriptHolder`]s.
//!
//! [`ScriptHolder`]: crate::holder::ScriptHolder
mod row;
mod validate;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, warn};

use crate::error::TableError;
use crate::event::EventKind;
use crate::holder::{Rule, RuleKey, ScriptType};

pub use row::SmartScriptRow;

/// Authoring smells that do not keep a rule from running.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadWarning {
    #[error("{key}: {group} parameter {index} is unused but set to {value}")]
    UnusedParam {
        key: RuleKey,
        group: &'static str,
        index: usize,
        value: u32,
    },

    #[error("{key}: linked rule {link} does not exist or is not a link event")]
    MissingLink { key: RuleKey, link: u32 },

    #[error("{key}: link event is never linked to and will not fire")]
    UnreferencedLink { key: RuleKey },
}

/// Outcome of a table load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub accepted: usize,
    pub rejected: Vec<TableError>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.warnings.is_empty()
    }
}

/// Validated rules grouped by owner and script domain, in id order.
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    rules: BTreeMap<(i64, ScriptType), Vec<Arc<Rule>>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows<I>(rows: I) -> (Self, LoadReport)
    where
        I: IntoIterator<Item = SmartScriptRow>,
    {
        let mut table = Self::new();
        let mut report = LoadReport::default();

        for row in rows {
            match validate::convert(&row, &mut report.warnings) {
                Ok(rule) => {
                    if let Err(err) = table.insert(rule) {
                        error!(%err, "rule rejected");
                        report.rejected.push(err);
                    }
                }
                Err(err) => {
                    error!(%err, "rule rejected");
                    report.rejected.push(err);
                }
            }
        }

        table.check_links(&mut report.warnings);
        report.accepted = table.len();
        (table, report)
    }

    /// Adds one already validated rule, keeping id order within its owner.
    pub fn insert(&mut self, rule: Rule) -> Result<(), TableError> {
        let key = rule.key;
        let list = self
            .rules
            .entry((key.entry_or_guid, key.source_type))
            .or_default();
        match list.binary_search_by_key(&key.id, |r| r.id()) {
            Ok(_) => Err(TableError::InvalidParams {
                key,
                reason: "duplicate rule id",
            }),
            Err(at) => {
                list.insert(at, Arc::new(rule));
                Ok(())
            }
        }
    }

    /// Rules authored for `entry_or_guid` in `script_type`.
    pub fn rules_for(&self, entry_or_guid: i64, script_type: ScriptType) -> &[Arc<Rule>] {
        self.rules
            .get(&(entry_or_guid, script_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn timed_list(&self, id: u32) -> &[Arc<Rule>] {
        self.rules_for(i64::from(id), ScriptType::TimedActionList)
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn check_links(&self, warnings: &mut Vec<LoadWarning>) {
        for list in self.rules.values() {
            for rule in list {
                if rule.link != 0 {
                    let found = list
                        .iter()
                        .any(|r| r.id() == rule.link && r.event.kind == EventKind::Link);
                    if !found {
                        warn!(rule = %rule.key, link = rule.link, "linked rule missing");
                        warnings.push(LoadWarning::MissingLink {
                            key: rule.key,
                            link: rule.link,
                        });
                    }
                }
                if rule.event.kind == EventKind::Link && !list.iter().any(|r| r.link == rule.id())
                {
                    warn!(rule = %rule.key, "link event is never linked to");
                    warnings.push(LoadWarning::UnreferencedLink { key: rule.key });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;

    fn aggro(id: u32) -> SmartScriptRow {
        SmartScriptRow::new(100, ScriptType::Creature, id)
            .event(EventKind::Aggro, &[])
            .action(ActionKind::Die, &[])
    }

    #[test]
    fn rules_are_kept_in_id_order() {
        let (table, report) = RuleTable::from_rows([aggro(2), aggro(0), aggro(1)]);
        assert_eq!(report.accepted, 3);
        let ids: Vec<u32> = table
            .rules_for(100, ScriptType::Creature)
            .iter()
            .map(|r| r.id())
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(table.rules_for(100, ScriptType::GameObject).is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let (table, report) = RuleTable::from_rows([aggro(0), aggro(0)]);
        assert_eq!(table.len(), 1);
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn link_problems_are_warnings() {
        let linked = SmartScriptRow::new(100, ScriptType::Creature, 1)
            .event(EventKind::Link, &[])
            .action(ActionKind::Die, &[]);
        let (table, report) = RuleTable::from_rows([aggro(0).link(5), linked]);
        assert_eq!(table.len(), 2);
        assert!(report.rejected.is_empty());
        assert_eq!(
            report.warnings,
            vec![
                LoadWarning::MissingLink {
                    key: RuleKey::new(100, ScriptType::Creature, 0),
                    link: 5
                },
                LoadWarning::UnreferencedLink {
                    key: RuleKey::new(100, ScriptType::Creature, 1)
                },
            ]
        );
    }
}
