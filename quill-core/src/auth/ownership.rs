use super::identity::Identity;
use crate::error::AuthError;

/// A resource with an owning user fixed at creation.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

/// Allow iff `identity` owns the resource.
pub fn authorize_owner(identity: &Identity, owner_id: i64) -> Result<(), AuthError> {
    if identity.id == owner_id {
        Ok(())
    } else {
        tracing::debug!(user_id = identity.id, owner_id, "ownership check denied");
        Err(AuthError::Forbidden)
    }
}

/// Existence first, then entitlement: a missing resource is always
/// `NotFound`, whoever asks.
pub fn authorize_resource<R, F>(
    resource: Option<R>,
    identity: &Identity,
    describe: F,
) -> Result<R, AuthError>
where
    R: Owned,
    F: FnOnce() -> String,
{
    let resource = resource.ok_or_else(|| AuthError::NotFound(describe()))?;
    authorize_owner(identity, resource.owner_id())?;
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    struct Note {
        owner: i64,
    }

    impl Owned for Note {
        fn owner_id(&self) -> i64 {
            self.owner
        }
    }

    fn identity(id: i64) -> Identity {
        Identity {
            id,
            email: format!("user{id}@x.com"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn owner_is_allowed() {
        assert_eq!(authorize_owner(&identity(5), 5), Ok(()));
    }

    #[test]
    fn non_owner_is_forbidden() {
        assert_eq!(authorize_owner(&identity(5), 6), Err(AuthError::Forbidden));
    }

    #[test]
    fn missing_resource_reports_not_found_before_ownership() {
        let result = authorize_resource::<Note, _>(None, &identity(5), || "Post with id 9".into());
        assert_eq!(result.err(), Some(AuthError::NotFound("Post with id 9".into())));
    }

    #[test]
    fn existing_resource_of_someone_else_is_forbidden() {
        let result = authorize_resource(Some(Note { owner: 6 }), &identity(5), || "note".into());
        assert_eq!(result.err(), Some(AuthError::Forbidden));
    }

    #[test]
    fn existing_resource_of_requester_is_returned() {
        let note = authorize_resource(Some(Note { owner: 5 }), &identity(5), || "note".into()).unwrap();
        assert_eq!(note.owner, 5);
    }
}
