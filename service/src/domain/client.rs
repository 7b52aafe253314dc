//! [`Client`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::define_text;

pub use super::user::Email;

/// Buyer of an [`Apartment`].
///
/// [`Apartment`]: crate::domain::Apartment
#[derive(Clone, Debug)]
pub struct Client {
    /// ID of this [`Client`].
    pub id: Id,

    /// [`Name`] of this [`Client`].
    pub name: Name,

    /// [`Cpf`] of this [`Client`].
    ///
    /// Immutable once the [`Client`] is created.
    pub cpf: Cpf,

    /// [`Contacts`] of this [`Client`].
    pub contacts: Contacts,

    /// [`DateTime`] when this [`Client`] was born.
    pub birth_date: Option<BirthDateTime>,

    /// Monthly income of this [`Client`].
    pub monthly_income: Option<Money>,

    /// [`Status`] of this [`Client`].
    pub status: Status,

    /// [`Notes`] about this [`Client`].
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`Client`] was created.
    pub created_at: CreationDateTime,
}

/// Contact details of a [`Client`].
#[derive(Clone, Debug, Default)]
pub struct Contacts {
    /// [`Email`] address.
    pub email: Option<Email>,

    /// [`Phone`] number.
    pub phone: Option<Phone>,

    /// Street [`Address`].
    pub address: Option<Address>,

    /// [`City`] name.
    pub city: Option<City>,

    /// [`State`] code.
    pub state: Option<State>,

    /// [`ZipCode`] of the [`Address`].
    pub zip_code: Option<ZipCode>,
}

/// ID of a [`Client`].
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
    #[doc = "Full name of a [`Client`]."]
    Name(max = 256)
}

define_text! {
    #[doc = "Street address of a [`Client`]."]
    Address(max = 512)
}

define_text! {
    #[doc = "City of a [`Client`]."]
    City(max = 128)
}

define_text! {
    #[doc = "Free-form notes about a [`Client`]."]
    Notes(max = 4096)
}

/// Brazilian individual taxpayer number (CPF) of a [`Client`].
///
/// Stored as 11 digits, while accepted both bare (`12345678909`) and
/// formatted (`123.456.789-09`).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Cpf(String);

impl Cpf {
    /// Creates a new [`Cpf`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl AsRef<str>) -> Option<Self> {
        let number = number.as_ref();
        if !number
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
        {
            return None;
        }

        let digits = number
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect::<Vec<_>>();
        Self::check(&digits).then(|| {
            Self(digits.iter().map(|d| char::from(b'0' + d)).collect())
        })
    }

    /// Returns this [`Cpf`] in the `XXX.XXX.XXX-XX` format.
    #[must_use]
    pub fn formatted(&self) -> String {
        let d = &self.0;
        format!("{}.{}.{}-{}", &d[..3], &d[3..6], &d[6..9], &d[9..])
    }

    /// Checks whether the given `digits` form a valid [`Cpf`].
    fn check(digits: &[u8]) -> bool {
        /// Computes a check digit over the provided `digits`.
        fn check_digit(digits: &[u8]) -> u8 {
            let weight = digits.len() + 1;
            let sum = digits
                .iter()
                .enumerate()
                .map(|(i, d)| usize::from(*d) * (weight - i))
                .sum::<usize>();
            match sum * 10 % 11 {
                10 => 0,
                // Always a single digit here.
                #[expect(clippy::cast_possible_truncation, reason = "< 10")]
                d => d as u8,
            }
        }

        if digits.len() != 11 {
            return false;
        }
        // Sequences like `111.111.111-11` pass the checksum, but are invalid.
        if digits.iter().all(|d| *d == digits[0]) {
            return false;
        }

        check_digit(&digits[..9]) == digits[9]
            && check_digit(&digits[..10]) == digits[10]
    }
}

impl FromStr for Cpf {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Cpf`")
    }
}

/// Phone number of a [`Client`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    ///
    /// Formatting characters (`+`, `(`, `)`, `-`, spaces) are allowed, as long
    /// as 10 to 13 digits remain.
    fn check(number: impl AsRef<str>) -> bool {
        let number = number.as_ref();
        let digits = number.chars().filter(char::is_ascii_digit).count();
        number
            .chars()
            .all(|c| c.is_ascii_digit() || "+()- ".contains(c))
            && number.trim() == number
            && (10..=13).contains(&digits)
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

/// Two-letter code of a Brazilian federative unit (e.g. `SP`).
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct State(String);

impl State {
    /// Creates a new [`State`] if the given `code` is valid.
    ///
    /// The `code` is uppercased.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let code = code.as_ref();
        (code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()))
            .then(|| Self(code.to_ascii_uppercase()))
    }
}

impl FromStr for State {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `State`")
    }
}

/// Brazilian postal code (CEP), stored as 8 digits.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ZipCode(String);

impl ZipCode {
    /// Creates a new [`ZipCode`] if the given `code` is valid.
    ///
    /// Accepts both `12345678` and `12345-678` formats.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let code = code.as_ref();
        let digits = match code.split_once('-') {
            Some((head, tail)) if head.len() == 5 && tail.len() == 3 => {
                format!("{head}{tail}")
            }
            Some(_) => return None,
            None => code.to_owned(),
        };
        (digits.len() == 8 && digits.chars().all(|c| c.is_ascii_digit()))
            .then_some(Self(digits))
    }
}

impl FromStr for ZipCode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ZipCode`")
    }
}

define_kind! {
    #[doc = "Status of a [`Client`]."]
    enum Status {
        #[doc = "[`Client`] is actively buying."]
        Active = 1,

        #[doc = "[`Client`] is no longer buying."]
        Inactive = 2,

        #[doc = "Potential [`Client`] not engaged yet."]
        Prospect = 3,
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Active
    }
}

/// [`DateTime`] when a [`Client`] was born.
pub type BirthDateTime = DateTimeOf<(Client, unit::Birth)>;

/// [`DateTime`] when a [`Client`] was created.
pub type CreationDateTime = DateTimeOf<(Client, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Cpf, Phone, State, ZipCode};

    #[test]
    fn accepts_valid_cpf() {
        let bare = Cpf::new("52998224725").unwrap();
        let formatted = Cpf::new("529.982.247-25").unwrap();

        assert_eq!(bare, formatted);
        assert_eq!(bare.to_string(), "52998224725");
        assert_eq!(bare.formatted(), "529.982.247-25");
    }

    #[test]
    fn rejects_invalid_cpf() {
        assert!(Cpf::new("529.982.247-26").is_none(), "wrong check digit");
        assert!(Cpf::new("111.111.111-11").is_none(), "repeated digits");
        assert!(Cpf::new("5299822472").is_none(), "too short");
        assert!(Cpf::new("529 982 247 25").is_none(), "wrong separators");
        assert!(Cpf::new("").is_none());
    }

    #[test]
    fn validates_phone() {
        assert!(Phone::new("(11) 98765-4321").is_some());
        assert!(Phone::new("+55 11 98765-4321").is_some());
        assert!(Phone::new("12345").is_none());
        assert!(Phone::new("call me").is_none());
    }

    #[test]
    fn normalizes_state_and_zip_code() {
        assert_eq!(State::new("sp").unwrap().to_string(), "SP");
        assert!(State::new("SPO").is_none());

        assert_eq!(ZipCode::new("01310-100").unwrap().to_string(), "01310100");
        assert_eq!(ZipCode::new("01310100").unwrap().to_string(), "01310100");
        assert!(ZipCode::new("0131-0100").is_none());
    }
}
