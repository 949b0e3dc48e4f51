//! Type references, builtin scalars and coerced values.

mod reference;
mod scalars;
mod value;

pub use reference::{BaseType, TypeHandle, TypeRef};
pub use scalars::BuiltinScalar;
pub use value::{Arguments, CoercedValue, InputObject, InputShape, ScalarValue, ShapeField};
