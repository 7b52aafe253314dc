//! [`Apartment`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::define_text;

/// Apartment for sale.
#[derive(Clone, Debug)]
pub struct Apartment {
    /// ID of this [`Apartment`].
    pub id: Id,

    /// [`Number`] of this [`Apartment`] inside its building.
    pub number: Number,

    /// [`Block`] this [`Apartment`] is located in.
    pub block: Option<Block>,

    /// Floor this [`Apartment`] is located on.
    pub floor: Option<i16>,

    /// [`Development`] this [`Apartment`] belongs to.
    pub development: Option<Development>,

    /// Physical [`Layout`] of this [`Apartment`].
    pub layout: Layout,

    /// Asking price of this [`Apartment`].
    pub price: Money,

    /// Monthly condominium fee of this [`Apartment`].
    pub condo_fee: Option<Money>,

    /// [`Description`] of this [`Apartment`].
    pub description: Option<Description>,

    /// [`DateTime`] when this [`Apartment`] is expected to be delivered.
    pub delivery_at: Option<DeliveryDateTime>,

    /// [`Status`] of this [`Apartment`].
    pub status: Status,

    /// [`DateTime`] when this [`Apartment`] was created.
    pub created_at: CreationDateTime,
}

impl Apartment {
    /// Checks the price and the [`Layout`] of this [`Apartment`] to be
    /// consistent.
    ///
    /// # Errors
    ///
    /// With the first found inconsistency.
    pub fn check_conditions(&self) -> Result<(), ConditionsError> {
        use ConditionsError as E;

        if !self.price.is_positive() {
            return Err(E::NonPositivePrice);
        }
        if let Some(fee) = self.condo_fee {
            if fee.currency != self.price.currency {
                return Err(E::CurrencyMismatch);
            }
            if fee.is_negative() {
                return Err(E::NegativeCondoFee);
            }
        }

        let Layout {
            total_area,
            private_area,
            bedrooms,
            suites,
            ..
        } = self.layout;
        if private_area.is_some_and(|a| a > total_area) {
            return Err(E::PrivateAreaExceedsTotal);
        }
        if suites > bedrooms {
            return Err(E::SuitesExceedBedrooms);
        }

        Ok(())
    }
}

/// Physical attributes of an [`Apartment`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Layout {
    /// Total [`Area`].
    pub total_area: Area,

    /// Private [`Area`].
    pub private_area: Option<Area>,

    /// Number of bedrooms.
    pub bedrooms: u8,

    /// Number of suites.
    pub suites: u8,

    /// Number of bathrooms.
    pub bathrooms: u8,

    /// Number of parking spots.
    pub parking_spots: u8,

    /// Indicator whether there is a balcony.
    pub balcony: bool,
}

/// ID of an [`Apartment`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_text! {
    #[doc = "Number of an [`Apartment`] inside its building (e.g. `101A`)."]
    Number(max = 16)
}

define_text! {
    #[doc = "Block of a building an [`Apartment`] is located in."]
    Block(max = 32)
}

define_text! {
    #[doc = "Name of a development an [`Apartment`] belongs to."]
    Development(max = 256)
}

define_text! {
    #[doc = "Description of an [`Apartment`]."]
    Description(max = 4096)
}

/// Area in square meters.
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Area(Decimal);

impl Area {
    /// Creates a new [`Area`] if the given `square_meters` is positive.
    #[must_use]
    pub fn new(square_meters: Decimal) -> Option<Self> {
        (square_meters > Decimal::ZERO).then_some(Self(square_meters))
    }
}

define_kind! {
    #[doc = "Status of an [`Apartment`]."]
    enum Status {
        #[doc = "[`Apartment`] can be sold."]
        Available = 1,

        #[doc = "[`Apartment`] is held by an ongoing sale."]
        Reserved = 2,

        #[doc = "[`Apartment`] is sold."]
        Sold = 3,

        #[doc = "[`Apartment`] is withdrawn from sale."]
        Unavailable = 4,
    }
}

impl Status {
    /// Indicates whether this [`Status`] is managed manually rather than by a
    /// [`Sale`].
    ///
    /// [`Sale`]: crate::domain::Sale
    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self, Self::Available | Self::Unavailable)
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Available
    }
}

/// Inconsistency of [`Apartment`] attributes.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ConditionsError {
    /// Price is zero or negative.
    #[display("price must be positive")]
    NonPositivePrice,

    /// Condominium fee is in a currency other than the price.
    #[display("condominium fee must be in the currency of the price")]
    CurrencyMismatch,

    /// Condominium fee is negative.
    #[display("condominium fee must not be negative")]
    NegativeCondoFee,

    /// Private [`Area`] is greater than the total one.
    #[display("private area must not exceed the total area")]
    PrivateAreaExceedsTotal,

    /// There are more suites than bedrooms.
    #[display("suites must not outnumber bedrooms")]
    SuitesExceedBedrooms,
}

/// [`DateTime`] when an [`Apartment`] was created.
pub type CreationDateTime = DateTimeOf<(Apartment, unit::Creation)>;

/// [`DateTime`] when an [`Apartment`] is expected to be delivered.
pub type DeliveryDateTime = DateTimeOf<(Apartment, unit::Delivery)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{DateTime, Money};
    use rust_decimal::Decimal;

    use super::{
        Apartment, Area, ConditionsError, Id, Layout, Number, Status,
    };

    fn apartment() -> Apartment {
        Apartment {
            id: Id::new(),
            number: Number::new("101").unwrap(),
            block: None,
            floor: Some(1),
            development: None,
            layout: Layout {
                total_area: Area::new(Decimal::from(70)).unwrap(),
                private_area: Some(Area::new(Decimal::from(62)).unwrap()),
                bedrooms: 2,
                suites: 1,
                bathrooms: 2,
                parking_spots: 1,
                balcony: true,
            },
            price: Money::from_str("250000BRL").unwrap(),
            condo_fee: Some(Money::from_str("450BRL").unwrap()),
            description: None,
            delivery_at: None,
            status: Status::Available,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn checks_conditions() {
        let mut a = apartment();
        assert_eq!(a.check_conditions(), Ok(()));

        a.condo_fee = Some(Money::from_str("450USD").unwrap());
        assert_eq!(a.check_conditions(), Err(ConditionsError::CurrencyMismatch));
        a.condo_fee = None;

        a.layout.private_area = Some(Area::new(Decimal::from(80)).unwrap());
        assert_eq!(
            a.check_conditions(),
            Err(ConditionsError::PrivateAreaExceedsTotal),
        );
        a.layout.private_area = None;

        a.layout.suites = 3;
        assert_eq!(
            a.check_conditions(),
            Err(ConditionsError::SuitesExceedBedrooms),
        );
        a.layout.suites = 0;

        a.price = Money::from_str("0BRL").unwrap();
        assert_eq!(a.check_conditions(), Err(ConditionsError::NonPositivePrice));
    }

    #[test]
    fn rejects_non_positive_area() {
        assert!(Area::new(Decimal::ZERO).is_none());
        assert!(Area::new(Decimal::from(-1)).is_none());
    }

    #[test]
    fn distinguishes_manual_statuses() {
        assert!(Status::Available.is_manual());
        assert!(Status::Unavailable.is_manual());
        assert!(!Status::Reserved.is_manual());
        assert!(!Status::Sold.is_manual());
    }
}
