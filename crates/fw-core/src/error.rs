use crate::fault::FaultId;

/// Alias for `Result<T, FwError>`.
pub type FwResult<T> = Result<T, FwError>;

/// Errors raised by state blocks, flows, and components.
///
/// These are configuration and programming errors in a model definition.
/// Simulated faults are never reported through this type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FwError {
    /// A field was read or written that the owner never declared.
    #[error("unknown field \"{field}\" on {owner}")]
    UnknownField {
        /// The block or flow that was accessed.
        owner: String,
        /// The undeclared field name.
        field: String,
    },

    /// A field holds a value of a different type than requested or assigned.
    #[error("field \"{field}\" on {owner} is {found}, expected {expected}")]
    FieldType {
        /// The block or flow that was accessed.
        owner: String,
        /// The field name.
        field: String,
        /// The type the caller asked for.
        expected: &'static str,
        /// The type actually stored.
        found: &'static str,
    },

    /// `replace_fault` was called for a fault that is not active.
    #[error("cannot replace fault \"{fault}\" on {owner}: not present")]
    FaultNotPresent {
        /// The block whose fault set was modified.
        owner: String,
        /// The fault that was expected to be active.
        fault: FaultId,
    },

    /// A function referenced a sub-component it does not own.
    #[error("unknown component \"{component}\" on {owner}")]
    UnknownComponent {
        /// The owning function.
        owner: String,
        /// The missing component name.
        component: String,
    },

    /// A generic validation error with a descriptive message.
    #[error("validation error: {0}")]
    Validation(String),
}
