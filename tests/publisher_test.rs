//! Integration tests for credential handling and event publishing

mod test_utils;

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;
    use meet_scheduler::calendar::{AuthorizationError, EventRequest, EventResult, find_slot};
    use meet_scheduler::google::{CacheEntry, CachedCredential, CredentialStore};

    use crate::test_utils::{StubAuthorizer, StubProvider, credential, publisher, write_cache};

    fn kickoff_request() -> EventRequest {
        let slot = find_slot(60, "UTC");
        EventRequest::for_slot(
            "Project Kickoff Meeting",
            &slot,
            &["a@example.com".to_string(), "b@example.com".to_string()],
        )
        .with_description("Initial meeting to discuss project goals and timelines.")
    }

    async fn cached(path: &std::path::Path) -> CachedCredential {
        match CredentialStore::new(path).load().await.unwrap() {
            CacheEntry::Loaded(credential) => credential,
            other => panic!("Expected a cached credential, got {:?}", other),
        }
    }

    /// A valid cache is used as is
    #[tokio::test]
    async fn it_uses_a_valid_cached_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_cache(&path, &credential("cached-token", Some("1//refresh"), 1));
        let before = std::fs::read_to_string(&path).unwrap();

        let authorizer = StubAuthorizer::default();
        let provider = StubProvider::returning("L", "M", "X");
        let result = publisher(&path, &authorizer, &provider)
            .publish(&kickoff_request())
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(authorizer.authorizations(), 0);
        assert_eq!(authorizer.refreshes(), 0);
        assert_eq!(provider.tokens(), vec!["cached-token"]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    /// An expired cache with a refresh token is refreshed and written back
    #[tokio::test]
    async fn it_refreshes_an_expired_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_cache(&path, &credential("stale-token", Some("1//refresh"), -1));
        let before = std::fs::read_to_string(&path).unwrap();

        let authorizer = StubAuthorizer::default();
        let provider = StubProvider::returning("L", "M", "X");
        publisher(&path, &authorizer, &provider)
            .publish(&kickoff_request())
            .await
            .unwrap();

        assert_eq!(authorizer.refreshes(), 1);
        assert_eq!(authorizer.authorizations(), 0);
        assert_eq!(provider.tokens(), vec!["refreshed-token"]);
        assert_ne!(std::fs::read_to_string(&path).unwrap(), before);

        let saved = cached(&path).await;
        assert_eq!(saved.token, "refreshed-token");
        assert_eq!(saved.refresh_token.as_deref(), Some("1//refresh"));
        assert!(saved.is_valid(Utc::now()));
    }

    /// Without a cache the user is asked once and the result is persisted
    #[tokio::test]
    async fn it_authorizes_once_without_a_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");

        let authorizer = StubAuthorizer::default();
        let provider = StubProvider::returning("L", "M", "X");
        let publisher = publisher(&path, &authorizer, &provider);
        publisher.publish(&kickoff_request()).await.unwrap();

        assert_eq!(authorizer.authorizations(), 1);
        assert_eq!(cached(&path).await.token, "consented-token");

        // The persisted credential is reused on the next call
        publisher.publish(&kickoff_request()).await.unwrap();
        assert_eq!(authorizer.authorizations(), 1);
        assert_eq!(provider.tokens(), vec!["consented-token", "consented-token"]);
    }

    /// An expired cache without a refresh token needs consent again
    #[tokio::test]
    async fn it_authorizes_when_expired_without_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_cache(&path, &credential("stale-token", None, -1));

        let authorizer = StubAuthorizer::default();
        let provider = StubProvider::returning("L", "M", "X");
        publisher(&path, &authorizer, &provider)
            .publish(&kickoff_request())
            .await
            .unwrap();

        assert_eq!(authorizer.refreshes(), 0);
        assert_eq!(authorizer.authorizations(), 1);
        assert_eq!(cached(&path).await.token, "consented-token");
    }

    /// A cache that can't be parsed is treated like a missing one
    #[tokio::test]
    async fn it_authorizes_when_the_cache_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{not json").unwrap();

        let authorizer = StubAuthorizer::default();
        let provider = StubProvider::returning("L", "M", "X");
        publisher(&path, &authorizer, &provider)
            .publish(&kickoff_request())
            .await
            .unwrap();

        assert_eq!(authorizer.authorizations(), 1);
        assert_eq!(cached(&path).await.token, "consented-token");
    }

    /// A failed refresh is an error and does not fall back to consent
    #[tokio::test]
    async fn it_returns_an_error_when_refresh_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_cache(&path, &credential("stale-token", Some("1//revoked"), -1));

        let authorizer = StubAuthorizer {
            fail_refresh: true,
            ..Default::default()
        };
        let provider = StubProvider::returning("L", "M", "X");
        let err = publisher(&path, &authorizer, &provider)
            .publish(&kickoff_request())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthorizationError::Refresh(_)));
        assert!(err.to_string().contains("Token has been revoked"));
        assert_eq!(authorizer.authorizations(), 0);
        assert!(provider.events().is_empty());
    }

    /// A failed consent is an error, never an `EventResult`
    #[tokio::test]
    async fn it_returns_an_error_when_consent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");

        let authorizer = StubAuthorizer {
            fail_authorize: true,
            ..Default::default()
        };
        let provider = StubProvider::returning("L", "M", "X");
        let err = publisher(&path, &authorizer, &provider)
            .publish(&kickoff_request())
            .await
            .unwrap_err();

        assert!(matches!(err, AuthorizationError::Consent(_)));
        assert!(!path.exists());
        assert!(provider.events().is_empty());
    }

    /// Provider failures come back as a `Failure` result
    #[tokio::test]
    async fn it_reports_provider_errors_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_cache(&path, &credential("cached-token", None, 1));

        let authorizer = StubAuthorizer::default();
        let provider = StubProvider::failing("Calendar usage limits exceeded");
        let result = publisher(&path, &authorizer, &provider)
            .publish(&kickoff_request())
            .await
            .unwrap();

        match result {
            EventResult::Failure { message } => {
                assert!(message.contains("Calendar usage limits exceeded"))
            }
            other => panic!("Expected a failure, got {:?}", other),
        }
    }

    /// Provider fields map one to one onto a success result
    #[tokio::test]
    async fn it_maps_the_created_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_cache(&path, &credential("cached-token", None, 1));

        let authorizer = StubAuthorizer::default();
        let provider = StubProvider::returning("L", "M", "X");
        let request = kickoff_request();
        let result = publisher(&path, &authorizer, &provider)
            .publish(&request)
            .await
            .unwrap();

        assert_eq!(
            result,
            EventResult::Success {
                event_link: Some("L".to_string()),
                meet_link: Some("M".to_string()),
                event_id: Some("X".to_string()),
            }
        );

        let events = provider.events();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.summary, "Project Kickoff Meeting");
        assert_eq!(event.start.time_zone, "UTC");
        assert_eq!(
            event.start.date_time,
            request.start.format("%Y-%m-%dT%H:%M:%S").to_string()
        );
        assert_eq!(event.attendees.len(), 2);
        assert_eq!(event.conference_data.create_request.conference_solution_key.r#type, "hangoutsMeet");
        assert!(event.reminders.use_default);
        assert!(event.guests_can_modify);
        assert!(event.guests_can_invite_others);
        assert!(event.guests_can_see_other_guests);
    }

    /// Every publish asks for a new conference
    #[tokio::test]
    async fn it_uses_distinct_conference_request_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        write_cache(&path, &credential("cached-token", None, 1));

        let authorizer = StubAuthorizer::default();
        let provider = StubProvider::returning("L", "M", "X");
        let publisher = publisher(&path, &authorizer, &provider);
        let request = kickoff_request();
        for _ in 0..5 {
            publisher.publish(&request).await.unwrap();
        }

        let ids: HashSet<String> = provider
            .events()
            .into_iter()
            .map(|e| e.conference_data.create_request.request_id)
            .collect();
        assert_eq!(ids.len(), 5);
    }
}
