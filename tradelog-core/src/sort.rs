//! Column sorting for tabular views.
//!
//! Rows expose their columns through [`Sortable`]; [`SortIndex`] keeps the
//! active column and direction and reorders any slice of rows with a stable
//! sort. Column comparison follows one rule set:
//!
//! - if either side is a number, both sides are compared as numbers, with
//!   unparseable text and missing values read as 0
//! - two text values use a case-folding collation
//! - anything else (missing vs text, missing vs missing) compares equal
//!
//! A per-column comparator registered with [`SortIndex::with_comparator`]
//! replaces the default rule for that column.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::TradeRecord;

/// A single cell value as seen by the sorter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Missing,
}

impl FieldValue {
    /// Numeric reading of the value. Text reads its leading number, so
    /// `"12abc"` is 12 and `"1.5e3 shares"` is 1500. NaN, text without a
    /// numeric prefix and missing values all read as 0.
    pub fn as_number(&self) -> f64 {
        let n = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => leading_number(s).unwrap_or(0.0),
            FieldValue::Missing => 0.0,
        };
        if n.is_nan() {
            0.0
        } else {
            n
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, FieldValue::Number(_))
    }
}

/// Longest numeric prefix of `s` after leading whitespace: sign, digits, an
/// optional fraction and an optional exponent, or `Infinity`.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].parse().ok();
    }

    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();
    let int_digits = digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits(end + 1);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    s[..end].parse().ok()
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<usize> for FieldValue {
    fn from(n: usize) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Missing, Into::into)
    }
}

/// A row that can be sorted by named column.
pub trait Sortable {
    /// Value of column `key`. Unknown keys return [`FieldValue::Missing`].
    fn field(&self, key: &str) -> FieldValue;
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => f.write_str("asc"),
            SortDirection::Descending => f.write_str("desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    /// Column-header click: the same column flips direction, a new column
    /// starts ascending.
    pub fn toggle(&mut self, key: &str) {
        if self.key == key {
            self.direction = self.direction.flip();
        } else {
            self.key = key.to_string();
            self.direction = SortDirection::Ascending;
        }
    }
}

/// Case-folding string collation.
///
/// Compares case-folded text first; strings equal up to case order
/// lowercase before uppercase.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Default column comparison (ascending).
pub fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    if a.is_number() || b.is_number() {
        return a
            .as_number()
            .partial_cmp(&b.as_number())
            .unwrap_or(Ordering::Equal);
    }
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => collate(x, y),
        _ => Ordering::Equal,
    }
}

/// Stable sort of `records` by column `key` with the default comparison.
pub fn sort_by_key<T: Sortable + Clone>(
    records: &[T],
    key: &str,
    direction: SortDirection,
) -> Vec<T> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| direction.apply(compare_values(&a.field(key), &b.field(key))));
    out
}

/// Ascending comparator for one column.
pub type FieldComparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Sort state for one table plus optional per-column comparators.
pub struct SortIndex<T> {
    state: SortState,
    comparators: HashMap<String, FieldComparator<T>>,
}

impl<T: Sortable + Clone> SortIndex<T> {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            state: SortState::new(key, direction),
            comparators: HashMap::new(),
        }
    }

    /// Replace the default comparison for column `key`. The comparator
    /// defines ascending order; descending reverses it.
    pub fn with_comparator<F>(mut self, key: impl Into<String>, cmp: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.comparators.insert(key.into(), Box::new(cmp));
        self
    }

    pub fn state(&self) -> &SortState {
        &self.state
    }

    pub fn set(&mut self, key: impl Into<String>, direction: SortDirection) {
        self.state = SortState::new(key, direction);
    }

    /// Header click; see [`SortState::toggle`].
    pub fn toggle(&mut self, key: &str) -> &SortState {
        self.state.toggle(key);
        &self.state
    }

    fn compare(&self, a: &T, b: &T) -> Ordering {
        let key = self.state.key.as_str();
        let ordering = match self.comparators.get(key) {
            Some(cmp) => cmp(a, b),
            None => compare_values(&a.field(key), &b.field(key)),
        };
        self.state.direction.apply(ordering)
    }

    /// Sorted copy of `records` under the current state. Stable.
    pub fn sort(&self, records: &[T]) -> Vec<T> {
        let mut out = records.to_vec();
        self.sort_in_place(&mut out);
        out
    }

    pub fn sort_in_place(&self, records: &mut [T]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

impl<T> fmt::Debug for SortIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortIndex")
            .field("state", &self.state)
            .field("custom_columns", &self.comparators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Sortable for TradeRecord {
    fn field(&self, key: &str) -> FieldValue {
        match key {
            "id" => self.id.as_str().into(),
            "date" => self.date.as_str().into(),
            "symbol" => self.symbol.as_str().into(),
            "type" => self.trade_type.as_str().into(),
            "strategy" => self.strategy.as_str().into(),
            "notes" => self.notes.clone().into(),
            "quantity" => self.quantity.into(),
            "entryPrice" | "entry_price" => self.entry_price.into(),
            "exitPrice" | "exit_price" => self.exit_price.into(),
            "stopLoss" | "stop_loss" => self.stop_loss.into(),
            "riskAmount" | "risk_amount" => self.risk_amount.into(),
            "profitLoss" | "profit_loss" => self.profit_loss.into(),
            "riskRewardRatio" | "risk_reward_ratio" => self.risk_reward_ratio.into(),
            _ => FieldValue::Missing,
        }
    }
}
