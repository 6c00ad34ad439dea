//! Error taxonomy. Pre-condition violations from the public API
//! are reported here; internal numerical edge cases (`NumericalDegeneracy`)
//! are absorbed silently inside the narrow-phase and never reach this enum
//! — see `geometry::narrow_phase`.

/// Everything that can go wrong calling into [`crate::world::World`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// A required input was missing.
    #[error("argument `{0}` must not be null/empty")]
    ArgumentNull(&'static str),

    /// The body is already owned by a world.
    #[error("body is already owned by a world")]
    AlreadyOwned,

    /// The joint already exists in this world.
    #[error("joint already exists in this world")]
    AlreadyExists,

    /// A joint referenced a body that is not (yet, or anymore) in this
    /// world, or a body/joint was queried after removal.
    #[error("joint references a body that is not a member of this world")]
    MembershipViolation,

    /// Negative mass/damping, zero step frequency, zero-length normals, etc.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A listener attempted to mutate the world's body/joint set while being
    /// dispatched.
    #[error("listeners must not mutate the world's body/joint set during dispatch")]
    IteratorInvalidation,
}

/// Convenience alias used throughout the public API.
pub type Result<T> = std::result::Result<T, PhysicsError>;
