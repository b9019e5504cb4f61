pub mod auth;
pub mod credentials;
pub mod flow;
pub mod gcal;
pub mod oauth;

pub use auth::{Authorizer, BoxedAuthorizer, GoogleAuthorizer};
pub use credentials::{CacheEntry, CachedCredential, ClientSecret, CredentialStore};
pub use gcal::{BoxedCalendarProvider, CalendarProvider, GoogleCalendar};
