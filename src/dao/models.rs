use std::{fmt, iter::Sum, ops::Add};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dto::validation::validate_catalog_genre, format::format_currency};

/// Catalog entry for a purchasable game. Never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Unique identifier across the catalog.
    #[validate(length(min = 1, message = "game id must not be empty"))]
    pub id: String,
    /// Display name.
    #[validate(length(min = 1, message = "game name must not be empty"))]
    pub name: String,
    /// Free-text category used by the genre filter. Held to the same rule as genre
    /// filters so that every listed genre can be selected.
    #[validate(custom(function = "validate_catalog_genre"))]
    pub genre: String,
    /// Image reference (relative path or URL).
    pub image: String,
    /// Short marketing blurb.
    pub description: String,
    /// Unit price with two fraction digits.
    #[schema(value_type = f64, example = 29.99)]
    pub price: Price,
    /// Whether the storefront highlights the game as a new release.
    pub is_new: bool,
}

/// A game placed in the cart together with how many copies were added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Game in the cart, stored inline with its quantity.
    #[serde(flatten)]
    pub game: Game,
    /// Always at least 1 while the entry exists.
    pub quantity: u32,
}

impl CartItem {
    /// Start a new cart line for `game` with a quantity of one.
    pub fn new(game: Game) -> Self {
        Self { game, quantity: 1 }
    }

    /// Identifier of the underlying game, which is also the cart line identity.
    pub fn id(&self) -> &str {
        &self.game.id
    }

    /// Price of the whole line (unit price times quantity).
    pub fn line_total(&self) -> Price {
        self.game.price.times(self.quantity)
    }
}

/// Non-negative amount stored as integer cents.
///
/// On the wire a price is a plain decimal number (`29.99`), matching the catalog
/// JSON. Keeping cents internally means cart totals never drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(u64);

impl Price {
    /// Zero amount.
    pub const ZERO: Price = Price(0);

    /// Build a price from integer cents.
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Convert a decimal amount, rounding to the nearest cent.
    ///
    /// Returns `None` for negative or non-finite amounts.
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() || amount < 0.0 {
            return None;
        }
        let cents = (amount * 100.0).round();
        if cents > u64::MAX as f64 {
            return None;
        }
        Some(Self(cents as u64))
    }

    /// Amount in cents.
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Amount as a decimal number, for serialisation and display.
    pub fn as_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Multiply by a quantity, saturating instead of overflowing.
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(u64::from(quantity)))
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Self) -> Self::Output {
        Price(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Self {
        iter.fold(Price::ZERO, Add::add)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = i64::try_from(self.0).unwrap_or(i64::MAX);
        f.write_str(&format_currency(cents, "USD"))
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_decimal())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = f64::deserialize(deserializer)?;
        Price::from_decimal(amount).ok_or_else(|| {
            de::Error::custom(format!("price must be a non-negative amount (got {amount})"))
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_keeps_two_fraction_digits_on_the_wire() {
        let price: Price = serde_json::from_str("29.99").unwrap();
        assert_eq!(price.cents(), 2999);
        assert_eq!(serde_json::to_string(&price).unwrap(), "29.99");
    }

    #[test]
    fn negative_price_is_rejected() {
        assert!(serde_json::from_str::<Price>("-1.5").is_err());
        assert_eq!(Price::from_decimal(f64::NAN), None);
    }

    #[test]
    fn game_uses_camel_case_fields() {
        let game = fixtures::game("7", "Action", 5999);
        let value = serde_json::to_value(&game).unwrap();
        assert_eq!(value["isNew"], serde_json::json!(false));
        assert_eq!(value["price"], serde_json::json!(59.99));
    }

    #[test]
    fn cart_item_flattens_the_game() {
        let item = CartItem {
            game: fixtures::game("3", "RPG", 1000),
            quantity: 2,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["id"], "3");
        assert_eq!(value["quantity"], 2);

        let back: CartItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
        assert_eq!(back.line_total(), Price::from_cents(2000));
    }

    #[test]
    fn price_displays_as_dollars() {
        assert_eq!(Price::from_cents(123_456).to_string(), "$1,234.56");
    }
}
