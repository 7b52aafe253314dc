//! [`Sale`] definitions.

use common::{define_kind, unit, DateTime, DateTimeOf, Money};
use derive_more::{Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{apartment, client, define_text};
#[cfg(doc)]
use super::{Apartment, Client};

/// Sale of an [`Apartment`] to a [`Client`].
///
/// Its [`Status`] drives the [`apartment::Status`] of the sold [`Apartment`].
#[derive(Clone, Debug)]
pub struct Sale {
    /// ID of this [`Sale`].
    pub id: Id,

    /// ID of the [`Client`] buying the [`Apartment`].
    pub client_id: client::Id,

    /// ID of the [`Apartment`] being sold.
    pub apartment_id: apartment::Id,

    /// Agreed price.
    pub price: Money,

    /// Payment [`Terms`].
    pub terms: Terms,

    /// [`Seller`] who closed this [`Sale`].
    pub seller: Option<Seller>,

    /// Commission of the [`Seller`].
    pub commission: Option<Money>,

    /// [`Notes`] about this [`Sale`].
    pub notes: Option<Notes>,

    /// [`Status`] of this [`Sale`].
    pub status: Status,

    /// [`DateTime`] when this [`Sale`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Sale`] was confirmed.
    pub confirmed_at: Option<ConfirmationDateTime>,

    /// [`DateTime`] when this [`Sale`] was cancelled.
    pub cancelled_at: Option<CancellationDateTime>,

    /// [`DateTime`] when this [`Sale`] was fully paid off.
    pub paid_off_at: Option<PayoffDateTime>,
}

impl Sale {
    /// Moves this [`Sale`] into the provided [`Status`], recording the
    /// transition time where applicable.
    ///
    /// # Errors
    ///
    /// If this [`Sale`] cannot move into the provided [`Status`].
    pub fn transition(
        &mut self,
        to: Status,
        at: DateTime,
    ) -> Result<(), TransitionError> {
        if !self.status.can_become(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }

        self.status = to;
        match to {
            Status::Confirmed => self.confirmed_at = Some(at.coerce()),
            Status::Cancelled => self.cancelled_at = Some(at.coerce()),
            Status::Pending | Status::UnderReview => {}
        }
        Ok(())
    }

    /// Records (or clears) the [`DateTime`] this [`Sale`] was fully paid off.
    ///
    /// # Errors
    ///
    /// If a payoff is recorded on a not [`Status::Confirmed`] [`Sale`], or
    /// earlier than its confirmation.
    pub fn set_paid_off_at(
        &mut self,
        at: Option<PayoffDateTime>,
    ) -> Result<(), PayoffError> {
        if let Some(at) = at {
            if self.status != Status::Confirmed {
                return Err(PayoffError::NotConfirmed(self.status));
            }
            if self.confirmed_at.is_some_and(|c| at < c.coerce()) {
                return Err(PayoffError::BeforeConfirmation);
            }
        }
        self.paid_off_at = at;
        Ok(())
    }

    /// Checks the commercial conditions of this [`Sale`] to be consistent.
    ///
    /// # Errors
    ///
    /// With the first found inconsistency.
    pub fn check_conditions(&self) -> Result<(), ConditionsError> {
        use ConditionsError as E;

        let Self {
            price,
            terms:
                Terms {
                    payment_method: _,
                    down_payment,
                    installments,
                },
            commission,
            ..
        } = self;

        if !price.is_positive() {
            return Err(E::NonPositivePrice);
        }

        let amounts = [
            *down_payment,
            installments.as_ref().map(|i| i.amount),
            *commission,
        ];
        if amounts.iter().flatten().any(|m| m.currency != price.currency) {
            return Err(E::CurrencyMismatch);
        }

        if let Some(down_payment) = down_payment {
            if down_payment.is_negative() {
                return Err(E::NegativeDownPayment);
            }
            if down_payment.amount > price.amount {
                return Err(E::DownPaymentExceedsPrice);
            }
        }

        if let Some(Installments { count, amount, .. }) = installments {
            if *count == 0 || !amount.is_positive() {
                return Err(E::InvalidInstallments);
            }
        }

        if commission.is_some_and(|c| c.is_negative()) {
            return Err(E::NegativeCommission);
        }

        Ok(())
    }
}

/// Payment terms of a [`Sale`].
#[derive(Clone, Debug, Default)]
pub struct Terms {
    /// [`PaymentMethod`] agreed on.
    pub payment_method: Option<PaymentMethod>,

    /// Down payment made upfront.
    pub down_payment: Option<Money>,

    /// [`Installments`] paying off the rest.
    pub installments: Option<Installments>,
}

/// Installments plan of a [`Sale`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Installments {
    /// Number of installments.
    pub count: u16,

    /// Amount of a single installment.
    pub amount: Money,

    /// [`DateTime`] when the first installment is due.
    pub first_due_at: Option<DueDateTime>,
}

/// ID of a [`Sale`].
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
    #[doc = "Payment method of a [`Sale`] (e.g. `Financing`)."]
    PaymentMethod(max = 64)
}

define_text! {
    #[doc = "Name of a seller who closed a [`Sale`]."]
    Seller(max = 256)
}

define_text! {
    #[doc = "Free-form notes about a [`Sale`]."]
    Notes(max = 4096)
}

define_kind! {
    #[doc = "Status of a [`Sale`]."]
    enum Status {
        #[doc = "[`Sale`] is created and awaits a decision."]
        Pending = 1,

        #[doc = "[`Sale`] is closed."]
        Confirmed = 2,

        #[doc = "[`Sale`] is called off."]
        Cancelled = 3,

        #[doc = "[`Sale`] is being reviewed before a decision."]
        UnderReview = 4,
    }
}

impl Status {
    /// Indicates whether a [`Sale`] in this [`Status`] still awaits a
    /// decision.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::UnderReview)
    }

    /// Indicates whether a [`Sale`] in this [`Status`] cannot change anymore.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Indicates whether a [`Sale`] may move from this [`Status`] into the
    /// provided one.
    #[must_use]
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Pending,
                Self::UnderReview | Self::Confirmed | Self::Cancelled,
            ) | (Self::UnderReview, Self::Confirmed | Self::Cancelled)
        )
    }

    /// Returns the [`apartment::Status`] of the [`Apartment`] whose [`Sale`]
    /// is in this [`Status`].
    #[must_use]
    pub const fn apartment_status(self) -> apartment::Status {
        match self {
            Self::Pending | Self::UnderReview => apartment::Status::Reserved,
            Self::Confirmed => apartment::Status::Sold,
            Self::Cancelled => apartment::Status::Available,
        }
    }
}

/// Error of an invalid [`Sale`] [`Status`] transition.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("cannot move `Sale` from `{from}` to `{to}`")]
pub struct TransitionError {
    /// [`Status`] the [`Sale`] is in.
    pub from: Status,

    /// [`Status`] the [`Sale`] was requested to move into.
    pub to: Status,
}

/// Error of recording a [`Sale`] payoff.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum PayoffError {
    /// Only a [`Status::Confirmed`] [`Sale`] may be paid off.
    #[display("`{_0}` `Sale` cannot be paid off")]
    NotConfirmed(#[error(not(source))] Status),

    /// Payoff precedes the confirmation of the [`Sale`].
    #[display("payoff cannot precede the confirmation")]
    BeforeConfirmation,
}

/// Inconsistency of [`Sale`] commercial conditions.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ConditionsError {
    /// Price is zero or negative.
    #[display("price must be positive")]
    NonPositivePrice,

    /// Some amount is in a currency other than the price.
    #[display("all amounts must be in the currency of the price")]
    CurrencyMismatch,

    /// Down payment is negative.
    #[display("down payment must not be negative")]
    NegativeDownPayment,

    /// Down payment is greater than the price.
    #[display("down payment must not exceed the price")]
    DownPaymentExceedsPrice,

    /// [`Installments`] have zero count or non-positive amount.
    #[display("installments must have positive count and amount")]
    InvalidInstallments,

    /// Commission is negative.
    #[display("commission must not be negative")]
    NegativeCommission,
}

/// [`DateTime`] when a [`Sale`] was created.
pub type CreationDateTime = DateTimeOf<(Sale, unit::Creation)>;

/// [`DateTime`] when a [`Sale`] was confirmed.
pub type ConfirmationDateTime = DateTimeOf<(Sale, unit::Confirmation)>;

/// [`DateTime`] when a [`Sale`] was cancelled.
pub type CancellationDateTime = DateTimeOf<(Sale, unit::Cancellation)>;

/// [`DateTime`] when the first [`Installments`] payment is due.
pub type DueDateTime = DateTimeOf<(Sale, unit::Due)>;

/// [`DateTime`] when a [`Sale`] was fully paid off.
pub type PayoffDateTime = DateTimeOf<(Sale, unit::Payoff)>;

#[cfg(test)]
mod spec {
    use std::{str::FromStr as _, time::Duration};

    use common::{DateTime, Money};

    use crate::domain::{apartment, client};

    use super::{
        ConditionsError, Id, Installments, PayoffError, Sale, Status, Terms,
    };

    fn sale(price: &str) -> Sale {
        Sale {
            id: Id::new(),
            client_id: client::Id::new(),
            apartment_id: apartment::Id::new(),
            price: Money::from_str(price).unwrap(),
            terms: Terms::default(),
            seller: None,
            commission: None,
            notes: None,
            status: Status::Pending,
            created_at: DateTime::now().coerce(),
            confirmed_at: None,
            cancelled_at: None,
            paid_off_at: None,
        }
    }

    #[test]
    fn allows_only_forward_transitions() {
        use Status as S;

        for from in S::ALL {
            for to in S::ALL {
                let expected = matches!(
                    (from, to),
                    (S::Pending, S::UnderReview | S::Confirmed | S::Cancelled)
                        | (S::UnderReview, S::Confirmed | S::Cancelled)
                );
                assert_eq!(from.can_become(*to), expected, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn records_transition_time() {
        let mut s = sale("250000BRL");

        s.transition(Status::UnderReview, DateTime::now()).unwrap();
        assert!(s.confirmed_at.is_none());

        s.transition(Status::Confirmed, DateTime::now()).unwrap();
        assert_eq!(s.status, Status::Confirmed);
        assert!(s.confirmed_at.is_some());

        let err = s.transition(Status::Cancelled, DateTime::now());
        assert!(err.is_err(), "terminal `Sale` cannot change");
        assert!(s.cancelled_at.is_none());
    }

    #[test]
    fn renders_status_names() {
        assert_eq!(Status::UnderReview.to_string(), "UNDER_REVIEW");
        assert_eq!("CANCELLED".parse::<Status>(), Ok(Status::Cancelled));
        assert!("cancelled_ish".parse::<Status>().is_err());
    }

    #[test]
    fn pays_off_only_confirmed() {
        let mut s = sale("250000BRL");

        assert_eq!(
            s.set_paid_off_at(Some(DateTime::now().coerce())),
            Err(PayoffError::NotConfirmed(Status::Pending)),
        );
        assert!(s.paid_off_at.is_none());
        assert_eq!(s.set_paid_off_at(None), Ok(()), "clearing is allowed");

        let confirmed_at = DateTime::now();
        s.transition(Status::Confirmed, confirmed_at).unwrap();
        assert_eq!(
            s.set_paid_off_at(Some(
                (confirmed_at - Duration::from_secs(60)).coerce(),
            )),
            Err(PayoffError::BeforeConfirmation),
        );

        let paid_off_at = (confirmed_at + Duration::from_secs(60)).coerce();
        s.set_paid_off_at(Some(paid_off_at)).unwrap();
        assert_eq!(s.paid_off_at, Some(paid_off_at));
    }

    #[test]
    fn maps_apartment_status() {
        assert_eq!(Status::Pending.apartment_status(), apartment::Status::Reserved);
        assert_eq!(
            Status::UnderReview.apartment_status(),
            apartment::Status::Reserved,
        );
        assert_eq!(Status::Confirmed.apartment_status(), apartment::Status::Sold);
        assert_eq!(
            Status::Cancelled.apartment_status(),
            apartment::Status::Available,
        );
    }

    #[test]
    fn checks_conditions() {
        let mut s = sale("250000BRL");
        assert_eq!(s.check_conditions(), Ok(()));

        s.terms.down_payment = Some(Money::from_str("50000BRL").unwrap());
        s.terms.installments = Some(Installments {
            count: 120,
            amount: Money::from_str("1666.67BRL").unwrap(),
            first_due_at: None,
        });
        s.commission = Some(Money::from_str("7500BRL").unwrap());
        assert_eq!(s.check_conditions(), Ok(()));

        s.commission = Some(Money::from_str("7500USD").unwrap());
        assert_eq!(s.check_conditions(), Err(ConditionsError::CurrencyMismatch));
        s.commission = None;

        s.terms.down_payment = Some(Money::from_str("300000BRL").unwrap());
        assert_eq!(
            s.check_conditions(),
            Err(ConditionsError::DownPaymentExceedsPrice),
        );
        s.terms.down_payment = None;

        s.terms.installments = Some(Installments {
            count: 0,
            amount: Money::from_str("100BRL").unwrap(),
            first_due_at: None,
        });
        assert_eq!(
            s.check_conditions(),
            Err(ConditionsError::InvalidInstallments),
        );

        assert_eq!(
            sale("0BRL").check_conditions(),
            Err(ConditionsError::NonPositivePrice),
        );
    }
}
