//! Per-team document numbering.
//!
//! Numbers are a scope prefix followed by a zero-padded counter
//! (`ST000000000001`). The last issued number of each `(team, scope)` lives in
//! `number_sequences`; allocation locks that row, so two units of work
//! creating documents for the same team queue instead of drawing the same
//! number.

use chrono::Utc;
use metrics::counter;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, instrument};

use crate::db::DbPool;
use crate::entities::{
    goods, number_sequence, stock_in_order, stock_out_order, stock_transfer_order,
};
use crate::errors::ServiceError;

/// Width of the counter in a freshly seeded number.
const SEED_WIDTH: usize = 12;

static TRAILING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)(\d+)$").expect("static regex is valid"));

/// Kind of document a number is issued for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NumberScope {
    Goods,
    StockTransfer,
    StockOut,
    StockIn,
}

impl NumberScope {
    pub fn prefix(&self) -> &'static str {
        match self {
            NumberScope::Goods => "G",
            NumberScope::StockTransfer => "ST",
            NumberScope::StockOut => "SO",
            NumberScope::StockIn => "SI",
        }
    }

    /// First number ever issued in this scope.
    pub fn seed(&self) -> String {
        format!("{}{:0width$}", self.prefix(), 1, width = SEED_WIDTH)
    }
}

/// Increments the trailing counter of `last`, keeping its prefix and padding.
///
/// The padding width grows when the counter outgrows it (`ST99` -> `ST100`).
/// Returns `None` when `last` has no trailing digits or the counter overflows.
pub fn increment_number(last: &str) -> Option<String> {
    let caps = TRAILING_DIGITS.captures(last)?;
    let head = caps.get(1)?.as_str();
    let digits = caps.get(2)?.as_str();

    let next = digits.parse::<u128>().ok()?.checked_add(1)?;
    Some(format!("{}{:0width$}", head, next, width = digits.len()))
}

/// Whether `candidate` shares `last`'s prefix and carries a larger counter.
fn is_ahead_of(candidate: &str, last: &str) -> bool {
    let split = |number: &str| {
        let caps = TRAILING_DIGITS.captures(number)?;
        let head = caps.get(1)?.as_str().to_string();
        let counter = caps.get(2)?.as_str().parse::<u128>().ok()?;
        Some((head, counter))
    };
    match (split(candidate), split(last)) {
        (Some((head, counter)), Some((last_head, last_counter))) => {
            head == last_head && counter > last_counter
        }
        _ => false,
    }
}

/// The number that follows `last`, or the scope seed when there is no usable
/// previous number.
pub fn next_after(scope: NumberScope, last: Option<&str>) -> String {
    last.and_then(increment_number)
        .unwrap_or_else(|| scope.seed())
}

#[derive(Debug, Clone)]
pub struct NumberingService {
    db_pool: Arc<DbPool>,
}

impl NumberingService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Allocates the next number inside the caller's transaction.
    ///
    /// The sequence row stays locked until that transaction ends, and the
    /// number is only consumed if it commits.
    #[instrument(skip(self, conn))]
    pub async fn next_number<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        scope: NumberScope,
    ) -> Result<String, ServiceError> {
        let locked = number_sequence::Entity::find()
            .filter(number_sequence::Column::TeamId.eq(team_id))
            .filter(number_sequence::Column::Scope.eq(scope.as_ref()))
            .lock_exclusive()
            .one(conn)
            .await?;

        let number = match locked {
            Some(sequence) => {
                let number = next_after(scope, Some(&sequence.last_number));
                let mut active: number_sequence::ActiveModel = sequence.into();
                active.last_number = Set(number.clone());
                active.updated_at = Set(Utc::now());
                active.update(conn).await?;
                number
            }
            None => {
                // First allocation for this team and scope. A concurrent
                // bootstrap loses on the unique index and surfaces as Conflict.
                let latest = latest_document_number(conn, team_id, scope).await?;
                let number = next_after(scope, latest.as_deref());
                number_sequence::ActiveModel {
                    team_id: Set(team_id),
                    scope: Set(scope.as_ref().to_string()),
                    last_number: Set(number.clone()),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
                number
            }
        };

        counter!("stockflow_numbering.allocated", 1, "scope" => scope.as_ref().to_string());
        debug!(%number, "Number allocated");
        Ok(number)
    }

    /// Records a caller-chosen number so later allocations continue after it.
    ///
    /// Only numbers ahead of the sequence in the same format move it forward.
    /// Anything else leaves the sequence alone; a duplicate is caught by the
    /// unique index when the document is written.
    #[instrument(skip(self, conn))]
    pub async fn claim_number<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        scope: NumberScope,
        number: &str,
    ) -> Result<(), ServiceError> {
        let locked = number_sequence::Entity::find()
            .filter(number_sequence::Column::TeamId.eq(team_id))
            .filter(number_sequence::Column::Scope.eq(scope.as_ref()))
            .lock_exclusive()
            .one(conn)
            .await?;

        match locked {
            Some(sequence) => {
                if is_ahead_of(number, &sequence.last_number) {
                    let mut active: number_sequence::ActiveModel = sequence.into();
                    active.last_number = Set(number.to_string());
                    active.updated_at = Set(Utc::now());
                    active.update(conn).await?;
                }
            }
            None => {
                let latest = latest_document_number(conn, team_id, scope).await?;
                let last = match latest {
                    Some(latest) if !is_ahead_of(number, &latest) => latest,
                    _ => number.to_string(),
                };
                number_sequence::ActiveModel {
                    team_id: Set(team_id),
                    scope: Set(scope.as_ref().to_string()),
                    last_number: Set(last),
                    updated_at: Set(Utc::now()),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
            }
        }
        Ok(())
    }

    /// The number the next allocation would return. Writes nothing and
    /// reserves nothing.
    #[instrument(skip(self))]
    pub async fn preview_number(
        &self,
        team_id: i32,
        scope: NumberScope,
    ) -> Result<String, ServiceError> {
        let db = self.db_pool.as_ref();
        let sequence = number_sequence::Entity::find()
            .filter(number_sequence::Column::TeamId.eq(team_id))
            .filter(number_sequence::Column::Scope.eq(scope.as_ref()))
            .one(db)
            .await?;

        let last = match sequence {
            Some(sequence) => Some(sequence.last_number),
            None => latest_document_number(db, team_id, scope).await?,
        };
        Ok(next_after(scope, last.as_deref()))
    }
}

/// Number of the most recently created document in `scope`, if any.
async fn latest_document_number<C: ConnectionTrait>(
    conn: &C,
    team_id: i32,
    scope: NumberScope,
) -> Result<Option<String>, ServiceError> {
    let number = match scope {
        NumberScope::Goods => goods::Entity::find()
            .filter(goods::Column::TeamId.eq(team_id))
            .order_by_desc(goods::Column::Id)
            .one(conn)
            .await?
            .map(|row| row.number),
        NumberScope::StockTransfer => stock_transfer_order::Entity::find()
            .filter(stock_transfer_order::Column::TeamId.eq(team_id))
            .order_by_desc(stock_transfer_order::Column::Id)
            .one(conn)
            .await?
            .map(|row| row.number),
        NumberScope::StockOut => stock_out_order::Entity::find()
            .filter(stock_out_order::Column::TeamId.eq(team_id))
            .order_by_desc(stock_out_order::Column::Id)
            .one(conn)
            .await?
            .map(|row| row.number),
        NumberScope::StockIn => stock_in_order::Entity::find()
            .filter(stock_in_order::Column::TeamId.eq(team_id))
            .order_by_desc(stock_in_order::Column::Id)
            .one(conn)
            .await?
            .map(|row| row.number),
    };
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("ST000000000001", "ST000000000002")]
    #[case("ST000000000009", "ST000000000010")]
    #[case("ST99", "ST100")]
    #[case("SO-2024-0041", "SO-2024-0042")]
    #[case("G10", "G11")]
    #[case("A0", "A1")]
    #[case("7", "8")]
    fn increments_trailing_counter(#[case] last: &str, #[case] expected: &str) {
        assert_eq!(increment_number(last).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("ST")]
    #[case("ST-draft")]
    fn unparseable_numbers_fall_back_to_seed(#[case] last: &str) {
        assert_eq!(increment_number(last), None);
        assert_eq!(next_after(NumberScope::StockTransfer, Some(last)), "ST000000000001");
    }

    #[test]
    fn seeds_are_prefix_plus_twelve_digits() {
        assert_eq!(NumberScope::StockTransfer.seed(), "ST000000000001");
        assert_eq!(NumberScope::StockOut.seed(), "SO000000000001");
        assert_eq!(NumberScope::StockIn.seed(), "SI000000000001");
        assert_eq!(NumberScope::Goods.seed(), "G000000000001");
        assert_eq!(next_after(NumberScope::Goods, None), "G000000000001");
    }

    #[rstest]
    #[case("ST000000000007", "ST000000000005", true)]
    #[case("ST000000000005", "ST000000000005", false)]
    #[case("ST000000000004", "ST000000000005", false)]
    #[case("ST100", "ST99", true)]
    #[case("X000000000009", "ST000000000005", false)]
    #[case("manual", "ST000000000005", false)]
    fn only_later_numbers_in_the_same_format_advance(
        #[case] candidate: &str,
        #[case] last: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_ahead_of(candidate, last), expected);
    }

    #[test]
    fn scope_names_round_trip_through_strings() {
        assert_eq!(NumberScope::from_str("stock_transfer").unwrap(), NumberScope::StockTransfer);
        assert_eq!(NumberScope::StockOut.as_ref(), "stock_out");
    }
}
