//! 评分聚合（增量平均值）
//!
//! 聚合值只通过 [`RatingAggregate::apply`] 推进，不会从明细行重新计算。

use serde::{Deserialize, Serialize};

use crate::errors::{EvalSystemError, Result};

/// 当前聚合值：`count == 0` 时 `rating` 固定为 0.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub rating: f64,
    pub count: i64,
}

/// 一次明细变更
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RatingChange {
    Insert { value: f64 },
    Update { old: f64, new: f64 },
    Delete { value: f64 },
}

impl RatingAggregate {
    pub const EMPTY: RatingAggregate = RatingAggregate {
        rating: 0.0,
        count: 0,
    };

    pub fn new(rating: f64, count: i64) -> Self {
        Self { rating, count }
    }

    pub fn apply(&self, change: RatingChange) -> Result<Self> {
        match change {
            RatingChange::Insert { value } => self.on_insert(value),
            RatingChange::Update { old, new } => self.on_update(old, new),
            RatingChange::Delete { value } => self.on_delete(value),
        }
    }

    pub fn on_insert(&self, value: f64) -> Result<Self> {
        check_finite(value)?;
        let count = self.count + 1;
        Ok(Self {
            rating: (self.total() + value) / count as f64,
            count,
        })
    }

    pub fn on_update(&self, old: f64, new: f64) -> Result<Self> {
        check_finite(old)?;
        check_finite(new)?;
        self.require_rows("update")?;
        Ok(Self {
            rating: (self.total() - old + new) / self.count as f64,
            count: self.count,
        })
    }

    pub fn on_delete(&self, value: f64) -> Result<Self> {
        check_finite(value)?;
        self.require_rows("delete")?;
        let count = self.count - 1;
        if count == 0 {
            return Ok(Self::EMPTY);
        }
        Ok(Self {
            rating: (self.total() - value) / count as f64,
            count,
        })
    }

    fn total(&self) -> f64 {
        self.rating * self.count as f64
    }

    fn require_rows(&self, op: &str) -> Result<()> {
        if self.count <= 0 {
            return Err(EvalSystemError::conflict(format!(
                "Cannot {op} a rating on an empty aggregate"
            )));
        }
        Ok(())
    }
}

impl Default for RatingAggregate {
    fn default() -> Self {
        Self::EMPTY
    }
}

fn check_finite(value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EvalSystemError::validation(format!(
            "Rating value must be a finite number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_insert_update_delete_sequence() {
        let start = RatingAggregate::new(4.0, 2);

        // (4 * 2 + 2) / 3
        let inserted = start.on_insert(2.0).unwrap();
        assert_eq!(inserted, RatingAggregate::new(10.0 / 3.0, 3));

        // (10 - 2 + 5) / 3
        let updated = inserted.on_update(2.0, 5.0).unwrap();
        assert_eq!(updated, RatingAggregate::new(13.0 / 3.0, 3));

        // (13 - 5) / 2
        let deleted = updated.on_delete(5.0).unwrap();
        assert_eq!(deleted, RatingAggregate::new(4.0, 2));
    }

    #[test]
    fn test_delete_last_row_resets_rating() {
        let agg = RatingAggregate::new(3.7, 1);
        let next = agg.on_delete(3.7).unwrap();
        assert_eq!(next, RatingAggregate::EMPTY);
        assert!(!next.rating.is_nan());
    }

    #[test]
    fn test_empty_aggregate_rejects_update_and_delete() {
        let empty = RatingAggregate::EMPTY;
        assert_eq!(
            empty.on_update(1.0, 2.0).unwrap_err().kind(),
            ErrorKind::Conflict
        );
        assert_eq!(empty.on_delete(1.0).unwrap_err().kind(), ErrorKind::Conflict);

        let first = empty.on_insert(4.5).unwrap();
        assert_eq!(first, RatingAggregate::new(4.5, 1));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let agg = RatingAggregate::new(4.0, 2);
        assert_eq!(
            agg.on_insert(f64::NAN).unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            agg.apply(RatingChange::Update {
                old: 4.0,
                new: f64::INFINITY
            })
            .unwrap_err()
            .kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn test_change_deserializes_tagged() {
        let change: RatingChange =
            serde_json::from_str(r#"{"op":"update","old":2.0,"new":5.0}"#).unwrap();
        assert_eq!(change, RatingChange::Update { old: 2.0, new: 5.0 });
    }
}
