//! Positional parameter access for row conversion.
//!
//! Each discriminant reads only the columns it understands. The reader
//! remembers which columns were touched so that leftovers can be reported
//! once the typed value is built.
use crate::error::TableError;
use crate::holder::RuleKey;
use crate::table::LoadWarning;

pub(crate) struct ParamReader<'a> {
    key: RuleKey,
    group: &'static str,
    values: &'a [u32],
    used: u32,
}

impl<'a> ParamReader<'a> {
    pub(crate) fn new(key: RuleKey, group: &'static str, values: &'a [u32]) -> Self {
        Self {
            key,
            group,
            values,
            used: 0,
        }
    }

    pub(crate) fn key(&self) -> RuleKey {
        self.key
    }

    pub(crate) fn get(&mut self, index: usize) -> u32 {
        self.used |= 1 << index;
        self.values.get(index).copied().unwrap_or(0)
    }

    pub(crate) fn flag(&mut self, index: usize) -> bool {
        self.get(index) != 0
    }

    pub(crate) fn signed(&mut self, index: usize) -> i32 {
        self.get(index) as i32
    }

    /// Reads `index` and rejects values above `max`.
    pub(crate) fn at_most(
        &mut self,
        index: usize,
        max: u32,
        field: &'static str,
    ) -> Result<u32, TableError> {
        let value = self.get(index);
        if value > max {
            return Err(TableError::ParamOutOfRange {
                key: self.key,
                field,
                value,
            });
        }
        Ok(value)
    }

    /// Reads an inclusive `(min, max)` pair and rejects inverted windows.
    pub(crate) fn window(
        &mut self,
        min_index: usize,
        max_index: usize,
        field: &'static str,
    ) -> Result<(u32, u32), TableError> {
        let min = self.get(min_index);
        let max = self.get(max_index);
        if min > max {
            return Err(TableError::MinMax {
                key: self.key,
                field,
                min,
                max,
            });
        }
        Ok((min, max))
    }

    /// Reports every non-zero column the conversion did not read.
    pub(crate) fn finish(self, warnings: &mut Vec<LoadWarning>) {
        for (index, value) in self.values.iter().enumerate() {
            if *value != 0 && self.used & (1 << index) == 0 {
                tracing::warn!(
                    rule = %self.key,
                    group = self.group,
                    index,
                    value,
                    "unused parameter is not zero"
                );
                warnings.push(LoadWarning::UnusedParam {
                    key: self.key,
                    group: self.group,
                    index,
                    value: *value,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::ScriptType;

    fn key() -> RuleKey {
        RuleKey::new(1, ScriptType::Creature, 0)
    }

    #[test]
    fn unused_nonzero_columns_are_reported() {
        let values = [5, 0, 7, 0];
        let mut reader = ParamReader::new(key(), "action", &values);
        assert_eq!(reader.get(0), 5);
        let mut warnings = Vec::new();
        reader.finish(&mut warnings);
        assert_eq!(
            warnings,
            vec![LoadWarning::UnusedParam {
                key: key(),
                group: "action",
                index: 2,
                value: 7
            }]
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let values = [10, 5];
        let mut reader = ParamReader::new(key(), "event", &values);
        assert!(matches!(
            reader.window(0, 1, "repeat"),
            Err(TableError::MinMax { min: 10, max: 5, .. })
        ));
    }
}
