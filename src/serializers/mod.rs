//! Built-in field serializers

mod err;

pub use err::{err, serialize_err};

use crate::core::Serializers;

/// Field name the error serializer is registered under
pub const ERR_FIELD: &str = "err";

/// The built-in serializer set: `err` only
pub fn default_serializers() -> Serializers {
    Serializers::new().with(ERR_FIELD, err())
}
