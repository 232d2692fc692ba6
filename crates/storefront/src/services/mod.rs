//! Storefront domain services: cart, checkout, payments, tracking and
//! recommendations. Each external collaborator sits behind a trait seam so
//! the services test against in-memory doubles.

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod payments;
pub mod recommend;

#[cfg(test)]
pub(crate) mod testing;
