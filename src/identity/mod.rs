//! Identity data model and validation for the authentication broker.
//! Keep the public surface thin and split implementation across sub-modules.

mod assertion;
mod principal;
mod request_context;
mod validator;

pub use assertion::IdentityAssertion;
pub use principal::{AdminLevel, Principal};
pub use request_context::{CurrentPrincipal, RequestContext};
pub use validator::{validate, ValidatedAssertion};
