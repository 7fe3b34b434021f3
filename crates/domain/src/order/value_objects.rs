//! Value objects for the order domain.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Identifier of an item in the external catalog.
///
/// Kept as text so numeric and string catalog keys are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogItemId(String);

impl CatalogItemId {
    /// Creates a new catalog item ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the item ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CatalogItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CatalogItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CatalogItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<u64> for CatalogItemId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for CatalogItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Money amount represented in cents to avoid floating point issues.
///
/// Order totals and spend figures are always whole cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the amount as a two-decimal number for presentation.
    pub fn as_decimal(&self) -> f64 {
        self.cents as f64 / 100.0
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents + rhs.cents,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.cents += rhs.cents;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// A per-unit price (or a line subtotal) at the precision the catalog
/// quotes it.
///
/// Nothing is rounded here; only an order total is rounded, to whole cents,
/// once every line has been summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitPrice(Decimal);

impl UnitPrice {
    /// Converts a catalog price.
    ///
    /// Returns `None` for negative, NaN or out-of-range amounts.
    pub fn from_f64(amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        Decimal::from_f64(amount).map(Self)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Multiplies by a quantity, or None on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Adds two amounts, or None on overflow.
    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Returns the amount as a number for presentation, unrounded.
    pub fn as_decimal(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Rounds to whole cents, half away from zero.
    ///
    /// Returns `None` if the amount does not fit in [`Money`].
    pub fn to_money(&self) -> Option<Money> {
        self.0
            .round_dp_with_strategy(CENT_PLACES, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)?
            .to_i64()
            .map(Money::from_cents)
    }
}

const CENT_PLACES: u32 = 2;

impl From<Money> for UnitPrice {
    fn from(money: Money) -> Self {
        Self(Decimal::new(money.cents(), CENT_PLACES))
    }
}

impl std::fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// A priced snapshot of one catalog entry inside an order.
///
/// Captured when the order is placed; later catalog price changes or
/// deletions never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The catalog entry this line was priced from.
    pub catalog_item_id: CatalogItemId,

    /// Catalog name at the time of ordering.
    pub name: String,

    /// Price per unit at the time of ordering.
    pub unit_price: UnitPrice,

    /// Quantity ordered.
    pub quantity: u32,

    /// `unit_price * quantity`, unrounded.
    pub line_subtotal: UnitPrice,
}

impl LineItem {
    /// Prices a line, computing its subtotal.
    pub fn priced(
        catalog_item_id: impl Into<CatalogItemId>,
        name: impl Into<String>,
        unit_price: impl Into<UnitPrice>,
        quantity: u32,
    ) -> Self {
        let unit_price = unit_price.into();
        Self {
            catalog_item_id: catalog_item_id.into(),
            name: name.into(),
            unit_price,
            quantity,
            line_subtotal: UnitPrice(unit_price.0 * Decimal::from(quantity)),
        }
    }
}
