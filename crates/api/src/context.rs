use puppetmaster_auth::Identity;

/// Caller identity for a request, as resolved by the auth middleware.
///
/// Always present on routed requests; `None` is an anonymous caller.
#[derive(Debug, Clone, Default)]
pub struct RequestIdentity(Option<Identity>);

impl RequestIdentity {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn authenticated(identity: Identity) -> Self {
        Self(Some(identity))
    }

    pub fn get(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}
