//! Route-level access decisions derived from the active session.

use crate::auth::{ AuthSession, Role };

/// Where a navigation attempt lands. Both redirect targets preserve no
/// return-to state; after login the user starts from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Granted,
    RedirectToLogin,
    RedirectToUnauthorized,
}

impl RouteAccess {
    pub fn is_granted(&self) -> bool {
        matches!(self, RouteAccess::Granted)
    }

    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            RouteAccess::Granted => None,
            RouteAccess::RedirectToLogin => Some("/login"),
            RouteAccess::RedirectToUnauthorized => Some("/unauthorized"),
        }
    }
}

/// Any authenticated session may pass.
pub fn require_auth(session: Option<&AuthSession>) -> RouteAccess {
    match session {
        Some(_) => RouteAccess::Granted,
        None => RouteAccess::RedirectToLogin,
    }
}

/// Administrator sessions only. An unauthenticated visitor is sent to
/// login, never to the unauthorized page.
pub fn require_admin(session: Option<&AuthSession>) -> RouteAccess {
    match session {
        Some(session) if session.role == Role::Administrator => RouteAccess::Granted,
        Some(_) => RouteAccess::RedirectToUnauthorized,
        None => RouteAccess::RedirectToLogin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> AuthSession {
        AuthSession { email: "someone@tigertrack.local".to_string(), role }
    }

    #[test]
    fn unauthenticated_visitors_go_to_login() {
        assert_eq!(require_auth(None), RouteAccess::RedirectToLogin);
        assert_eq!(require_admin(None), RouteAccess::RedirectToLogin);
        assert_eq!(require_admin(None).redirect_path(), Some("/login"));
    }

    #[test]
    fn authenticated_users_pass_the_auth_gate() {
        let user = session(Role::User);
        assert!(require_auth(Some(&user)).is_granted());
        assert_eq!(require_auth(Some(&user)).redirect_path(), None);
    }

    #[test]
    fn non_admins_are_sent_to_unauthorized() {
        let user = session(Role::User);
        assert_eq!(require_admin(Some(&user)), RouteAccess::RedirectToUnauthorized);
        assert_eq!(require_admin(Some(&user)).redirect_path(), Some("/unauthorized"));
    }

    #[test]
    fn admins_reach_admin_routes() {
        let admin = session(Role::Administrator);
        assert!(require_admin(Some(&admin)).is_granted());
    }
}
