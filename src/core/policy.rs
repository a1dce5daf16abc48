//! Who may do what to which resource

use crate::error::ApiError;
use crate::models::{Playlist, User};

/// Caller identity as seen by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Anonymous,
    User(i64),
}

impl From<&User> for Subject {
    fn from(user: &User) -> Self {
        Subject::User(user.id)
    }
}

/// Resource being acted on
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Playlist(&'a Playlist),
    Artist,
    Track,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    AddTrack,
    RemoveTrack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    /// Turn a denial into a 403
    pub fn ensure(self) -> Result<(), ApiError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(ApiError::Forbidden(reason.to_string())),
        }
    }
}

pub fn authorize(subject: Subject, resource: Resource<'_>, action: Action) -> Decision {
    match resource {
        Resource::Playlist(playlist) => {
            let is_owner = subject == Subject::User(playlist.owner_id);
            match action {
                Action::Read if is_owner || playlist.is_public => Decision::Allow,
                Action::Read => Decision::Deny("this playlist is private"),
                Action::Create if subject != Subject::Anonymous => Decision::Allow,
                _ if is_owner => Decision::Allow,
                _ => Decision::Deny("not authorized to modify this playlist"),
            }
        }
        Resource::Artist | Resource::Track => match (action, subject) {
            (Action::Read, _) => Decision::Allow,
            (_, Subject::User(_)) => Decision::Allow,
            (_, Subject::Anonymous) => Decision::Deny("sign in to modify the catalog"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn playlist(owner_id: i64, is_public: bool) -> Playlist {
        Playlist {
            id: 1,
            name: "Road trip".to_string(),
            description: None,
            owner_id,
            tracks: vec![],
            is_public,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_private_playlist_read() {
        let private = playlist(1, false);
        let res = Resource::Playlist(&private);

        assert_eq!(authorize(Subject::User(1), res, Action::Read), Decision::Allow);
        assert!(matches!(
            authorize(Subject::User(2), res, Action::Read),
            Decision::Deny(_)
        ));
        assert!(matches!(
            authorize(Subject::Anonymous, res, Action::Read),
            Decision::Deny(_)
        ));
    }

    #[test]
    fn test_public_playlist_read_but_not_write() {
        let public = playlist(1, true);
        let res = Resource::Playlist(&public);

        assert_eq!(authorize(Subject::User(2), res, Action::Read), Decision::Allow);
        for action in [Action::Update, Action::Delete, Action::AddTrack, Action::RemoveTrack] {
            assert!(matches!(authorize(Subject::User(2), res, action), Decision::Deny(_)));
            assert_eq!(authorize(Subject::User(1), res, action), Decision::Allow);
        }
    }

    #[test]
    fn test_catalog_writes_need_a_user() {
        assert_eq!(
            authorize(Subject::Anonymous, Resource::Track, Action::Read),
            Decision::Allow
        );
        assert_eq!(
            authorize(Subject::User(5), Resource::Artist, Action::Delete),
            Decision::Allow
        );
        assert!(authorize(Subject::Anonymous, Resource::Artist, Action::Create)
            .ensure()
            .is_err());
    }
}
