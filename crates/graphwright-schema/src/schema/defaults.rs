//! Default value validation.
//!
//! Defaults go through the same [`Coercer`] as request variables, in its
//! constant mode, so a host may write a default as any constant, including a
//! symbolic enum value.

use crate::coercion::{Coercer, Input};
use crate::definition::InputValueDefinition;
use crate::error::{CoercionError, SchemaError};
use crate::sdl::print_value;

/// Coerces the default of `value` against its declared type. Values without
/// a default always pass.
///
/// # Errors
///
/// Returns every coercion error reported for the default.
pub fn validate_default(
    coercer: &Coercer<'_>,
    value: &InputValueDefinition,
) -> Result<(), Vec<CoercionError>> {
    match value.default_value() {
        Some(default) => coercer.coerce(Input::Const(default), value.ty()).map(|_| ()),
        None => Ok(()),
    }
}

/// Like [`validate_default`], failing the build with a message naming the
/// input value.
pub(crate) fn check_default(
    coercer: &Coercer<'_>,
    value: &InputValueDefinition,
) -> Result<(), SchemaError> {
    validate_default(coercer, value).map_err(|errors| SchemaError::DefaultValue {
        name: value.name().to_string(),
        value: value.default_value().map(print_value).unwrap_or_default(),
        errors,
    })
}
