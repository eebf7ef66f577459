use fw_core::FwError;

/// Alias for `Result<T, ModelError>`.
pub type ModelResult<T> = Result<T, ModelError>;

/// Configuration and invariant errors raised while building or driving a model.
///
/// Simulated faults are state, not errors, and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A flow with the same name is already registered.
    #[error("flow already registered: \"{0}\"")]
    DuplicateFlow(String),

    /// A function with the same name is already registered.
    #[error("function already registered: \"{0}\"")]
    DuplicateFunction(String),

    /// A function was bound to a flow that is not registered.
    #[error("function \"{function}\" references unknown flow \"{flow}\"")]
    UnknownFlow {
        /// The function being registered.
        function: String,
        /// The unregistered flow name.
        flow: String,
    },

    /// A function name did not resolve to a registered function.
    #[error("function not found: \"{0}\"")]
    UnknownFunction(String),

    /// A behavior accessed a port its function is not bound to.
    #[error("function \"{function}\" has no port \"{port}\"")]
    UnboundPort {
        /// The function whose behavior ran.
        function: String,
        /// The port that was requested.
        port: String,
    },

    /// The number of flows passed to `add_function` does not match the
    /// ports the function declares.
    #[error("function \"{function}\" declares {expected} ports but was bound to {found} flows")]
    PortMismatch {
        /// The function being registered.
        function: String,
        /// Number of declared ports.
        expected: usize,
        /// Number of flows supplied.
        found: usize,
    },

    /// A state block, flow, or component rejected an operation.
    #[error(transparent)]
    Block(#[from] FwError),

    /// A snapshot could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
