//! Payment ownership validation and the single payment write path

pub mod validator;

pub use validator::{PaymentRequest, PaymentValidator, validate_payment_amount};
