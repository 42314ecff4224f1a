// crates/gift-ledger-core/src/core/actor.rs
// ============================================================================
// Module: Gift Ledger Actors
// Description: Identities attributed to gift card events.
// Purpose: Make user/app attribution explicit and normalize invalid users away.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An event is caused by a user, an app, a user acting through an app, or
//! nobody. Callers describe the identity with [`Actor`]; the ledger converts it
//! to the stored [`EventActor`] through [`Actor::normalize`], which replaces
//! any user failing [`user_is_valid`] with no user.
//!
//! Apps are not subject to a validity check and pass through unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AppId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Caller-Supplied Identities
// ============================================================================

/// User identity as resolved by the request layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    /// Unauthenticated requester.
    Anonymous,
    /// Registered account.
    Registered {
        /// Account identifier.
        id: UserId,
        /// Whether the account is enabled.
        is_active: bool,
    },
}

impl UserRef {
    /// Convenience constructor for an enabled registered user.
    #[must_use]
    pub const fn active(id: UserId) -> Self {
        Self::Registered {
            id,
            is_active: true,
        }
    }
}

/// Returns true when the user is a real, non-anonymous, enabled identity.
#[must_use]
pub const fn user_is_valid(user: &UserRef) -> bool {
    matches!(
        user,
        UserRef::Registered {
            is_active: true,
            ..
        }
    )
}

/// Identity that caused a gift card event, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Actor {
    /// No attributable identity.
    #[default]
    None,
    /// A user acting directly.
    User(UserRef),
    /// An app acting on its own behalf.
    App(AppId),
    /// A user acting through an app.
    UserViaApp {
        /// User on whose behalf the app acted.
        user: UserRef,
        /// App that performed the action.
        app: AppId,
    },
}

impl Actor {
    /// Normalizes the actor into its stored form.
    ///
    /// A user that fails [`user_is_valid`] is dropped; an accompanying app is
    /// kept as-is.
    #[must_use]
    pub fn normalize(&self) -> EventActor {
        match self {
            Self::None => EventActor::None,
            Self::User(user) => EventActor::from_parts(valid_user_id(user), None),
            Self::App(app) => EventActor::from_parts(None, Some(*app)),
            Self::UserViaApp {
                user,
                app,
            } => EventActor::from_parts(valid_user_id(user), Some(*app)),
        }
    }
}

/// Returns the user identifier when the user passes the validity check.
const fn valid_user_id(user: &UserRef) -> Option<UserId> {
    match user {
        UserRef::Registered {
            id,
            is_active: true,
        } => Some(*id),
        _ => None,
    }
}

// ============================================================================
// SECTION: Stored Attribution
// ============================================================================

/// Normalized actor persisted on an event.
///
/// # Invariants
/// - Never references a user that failed the validity check at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventActor {
    /// No attribution.
    #[default]
    None,
    /// Attributed to a user.
    User {
        /// User identifier.
        user: UserId,
    },
    /// Attributed to an app.
    App {
        /// App identifier.
        app: AppId,
    },
    /// Attributed to a user acting through an app.
    UserViaApp {
        /// User identifier.
        user: UserId,
        /// App identifier.
        app: AppId,
    },
}

impl EventActor {
    /// Builds the stored actor from its two nullable columns.
    #[must_use]
    pub const fn from_parts(user: Option<UserId>, app: Option<AppId>) -> Self {
        match (user, app) {
            (None, None) => Self::None,
            (Some(user), None) => Self::User {
                user,
            },
            (None, Some(app)) => Self::App {
                app,
            },
            (Some(user), Some(app)) => Self::UserViaApp {
                user,
                app,
            },
        }
    }

    /// Returns the attributed user, if any.
    #[must_use]
    pub const fn user(self) -> Option<UserId> {
        match self {
            Self::User {
                user,
            }
            | Self::UserViaApp {
                user, ..
            } => Some(user),
            Self::None
            | Self::App {
                ..
            } => None,
        }
    }

    /// Returns the attributed app, if any.
    #[must_use]
    pub const fn app(self) -> Option<AppId> {
        match self {
            Self::App {
                app,
            }
            | Self::UserViaApp {
                app, ..
            } => Some(app),
            Self::None
            | Self::User {
                ..
            } => None,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
