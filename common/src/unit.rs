//! Marker types describing what a [`DateTimeOf`] stands for.
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Entity confirmation.
#[derive(Clone, Copy, Debug)]
pub struct Confirmation;

/// Entity cancellation.
#[derive(Clone, Copy, Debug)]
pub struct Cancellation;

/// Entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// Person birth.
#[derive(Clone, Copy, Debug)]
pub struct Birth;

/// Expected delivery of a property.
#[derive(Clone, Copy, Debug)]
pub struct Delivery;

/// Payment due date.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// Full payoff of a debt.
#[derive(Clone, Copy, Debug)]
pub struct Payoff;
