use crate::config::{ApiProfile, BoundProfile, ServiceConfig};
use crate::core::auth::ServiceAccountAuth;
use crate::domain::model::{AuthorizedHandle, NewGroup, NewMember};
use crate::domain::ports::TokenProvider;
use crate::utils::error::{BrokerError, Result};
use crate::utils::validation::validate_required_field;

/// Adaptor over the remote directory/settings/migration service. One
/// instance is bound to a single API profile and domain; every operation
/// authorizes a fresh delegated handle, performs one remote round trip, and
/// returns either serialized JSON text (`None` for empty success bodies) or
/// a normalized [`BrokerError::Remote`].
///
/// Operation names correspond directly to the remote service's own
/// operations. Not everything the remote API offers is surfaced here; the
/// caller maps application needs onto this surface.
pub struct GroupsAdaptor<A: TokenProvider> {
    bound: BoundProfile,
    auth: A,
}

impl GroupsAdaptor<ServiceAccountAuth> {
    /// Bind the named profile and pick up credentials through the location
    /// the binder publishes to the environment.
    pub fn from_config(config: &ServiceConfig, profile_name: &str) -> Result<Self> {
        let bound = config.bind(profile_name)?;
        let auth = ServiceAccountAuth::discover()?;
        Ok(Self::with_token_provider(bound, auth))
    }
}

impl<A: TokenProvider> GroupsAdaptor<A> {
    /// Construct with an explicit token source instead of the discovered
    /// service-account credentials.
    pub fn with_token_provider(bound: BoundProfile, auth: A) -> Self {
        Self { bound, auth }
    }

    pub fn profile(&self) -> &ApiProfile {
        &self.bound.profile
    }

    /// Authorize a handle bound to exactly one impersonated identity and one
    /// scope set. Called at the start of every operation; handles are never
    /// reused across calls. Failures here propagate un-normalized.
    pub async fn authorize(&self) -> Result<AuthorizedHandle> {
        let profile = &self.bound.profile;
        let scopes = profile.effective_scopes();
        let token = self
            .auth
            .fetch_token(&scopes, &self.bound.domain.subject_email)
            .await?;
        Ok(AuthorizedHandle::new(
            profile.base_url.clone(),
            token,
            profile.application_name.clone(),
        ))
    }

    fn resource_path(&self, tail: &str) -> String {
        format!("{}/{}", self.bound.profile.service.url_prefix(), tail)
    }

    fn bound_group_email(&self) -> Result<&String> {
        validate_required_field("profile.group_email", &self.bound.profile.group_email)
    }

    //
    // Group operations (directory profile)
    //

    /// Fetch one group by key (email address or opaque id).
    pub async fn get_group_info(&self, key: &str) -> Result<Option<String>> {
        let service = self.authorize().await?;
        let request = service.get(&self.resource_path(&format!("groups/{}", key)));
        self.dispatch("get_group_info", &format!("key: {}", key), request)
            .await
    }

    /// Create a new group from explicit properties. The remote service
    /// reports 409 when a group with that email already exists.
    pub async fn insert_new_group(&self, new_group: &NewGroup) -> Result<Option<String>> {
        let service = self.authorize().await?;
        let request = service.post(&self.resource_path("groups")).json(new_group);
        self.dispatch(
            "insert_new_group",
            &format!("group_settings: {:?}", new_group),
            request,
        )
        .await
    }

    /// Delete an existing group. Success carries no body.
    pub async fn delete_group(&self, group_key: &str) -> Result<Option<String>> {
        let service = self.authorize().await?;
        let request = service.delete(&self.resource_path(&format!("groups/{}", group_key)));
        self.dispatch(
            "delete_group",
            &format!("group_id: {}", group_key),
            request,
        )
        .await
    }

    /// List the groups for a domain, falling back to the configured default
    /// domain. Only the first page of results is returned; any continuation
    /// token in the response is ignored.
    pub async fn list_groups(&self, domain: Option<&str>) -> Result<Option<String>> {
        let domain = domain.unwrap_or(&self.bound.domain.default_name);
        let service = self.authorize().await?;
        let request = service
            .get(&self.resource_path("groups"))
            .query(&[("domain", domain)]);
        self.dispatch("list_groups", &format!("domain: {}", domain), request)
            .await
    }

    //
    // Membership operations (directory profile)
    //

    /// Fetch one membership record.
    pub async fn get_member(&self, group_key: &str, member_key: &str) -> Result<Option<String>> {
        let service = self.authorize().await?;
        let request = service.get(&self.resource_path(&format!(
            "groups/{}/members/{}",
            group_key, member_key
        )));
        self.dispatch(
            "get_member",
            &format!("group_key: [{}] member_key: [{}]", group_key, member_key),
            request,
        )
        .await
    }

    /// Add a member to a group.
    pub async fn insert_member(
        &self,
        group_key: &str,
        new_member: &NewMember,
    ) -> Result<Option<String>> {
        let service = self.authorize().await?;
        let request = service
            .post(&self.resource_path(&format!("groups/{}/members", group_key)))
            .json(new_member);
        self.dispatch(
            "insert_member",
            &format!("group_key: {} member_settings: {:?}", group_key, new_member),
            request,
        )
        .await
    }

    /// Remove a membership. Success carries no body.
    pub async fn delete_member(&self, group_key: &str, member_key: &str) -> Result<Option<String>> {
        let service = self.authorize().await?;
        let request = service.delete(&self.resource_path(&format!(
            "groups/{}/members/{}",
            group_key, member_key
        )));
        self.dispatch(
            "delete_member",
            &format!("group_key: {} member_key: {}", group_key, member_key),
            request,
        )
        .await
    }

    /// List a group's members. First page only, as with [`Self::list_groups`].
    pub async fn list_members(&self, group_key: &str) -> Result<Option<String>> {
        let service = self.authorize().await?;
        let request = service.get(&self.resource_path(&format!("groups/{}/members", group_key)));
        self.dispatch("list_members", &format!("group_key: {}", group_key), request)
            .await
    }

    //
    // Settings operations (settings profile)
    //

    /// Fetch settings for the group email bound in the active profile.
    pub async fn get_group_settings(&self) -> Result<Option<String>> {
        let group_email = self.bound_group_email()?.clone();
        let service = self.authorize().await?;
        let request = service.get(&self.resource_path(&format!("groups/{}", group_email)));
        self.dispatch(
            "get_group_settings",
            &format!("key: {}", group_email),
            request,
        )
        .await
    }

    /// Replace the bound group's settings wholesale. Partial updates are not
    /// supported against the remote API, so the caller sends the complete
    /// settings document.
    pub async fn update_group_settings(
        &self,
        new_settings: &serde_json::Value,
    ) -> Result<Option<String>> {
        let group_email = self.bound_group_email()?.clone();
        let service = self.authorize().await?;
        let request = service
            .put(&self.resource_path(&format!("groups/{}", group_email)))
            .json(new_settings);
        self.dispatch(
            "update_group_settings",
            &format!("new_settings: {}", new_settings),
            request,
        )
        .await
    }

    //
    // Archive insertion (migration profile)
    //

    /// Insert a complete RFC 822 message into the group's archive. A
    /// malformed sender inside the message body is accepted by the remote
    /// service; only an invalid group key fails.
    pub async fn insert_archive(
        &self,
        group_key: &str,
        message_source: &str,
    ) -> Result<Option<String>> {
        let service = self.authorize().await?;
        let request = service
            .post(&self.resource_path(&format!("groups/{}/archive", group_key)))
            .header(reqwest::header::CONTENT_TYPE, "message/rfc822")
            .body(message_source.to_string());
        self.dispatch(
            "insert_archive",
            &format!("group_key: {}", group_key),
            request,
        )
        .await
    }

    //
    // Normalization guard
    //

    /// Uniform success/failure translation applied by every operation:
    /// successful responses come back as re-serialized JSON (`None` when the
    /// body is empty); any remote failure is logged at warn level and
    /// reduced to [`BrokerError::Remote`] carrying the reported status code.
    async fn dispatch(
        &self,
        op: &str,
        context: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<String>> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                // No HTTP status to mirror; transport-level failures are
                // normalized as 502 so callers keep a single error path.
                let status_code = e.status().map_or(502, |s| s.as_u16());
                return Err(self.remote_failure(op, context, status_code, &e.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    return Err(self.remote_failure(op, context, 502, &e.to_string()));
                }
            };
            if body.trim().is_empty() {
                return Ok(None);
            }
            let value: serde_json::Value = serde_json::from_str(&body)?;
            Ok(Some(value.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(self.remote_failure(op, context, status.as_u16(), body.trim()))
        }
    }

    fn remote_failure(
        &self,
        op: &str,
        context: &str,
        status_code: u16,
        detail: &str,
    ) -> BrokerError {
        let message = format!(
            "{}: FAILED status_code: {} message: {} {}",
            op, status_code, detail, context
        );
        tracing::warn!(status_code, "{}", message);
        BrokerError::Remote {
            message,
            status_code,
        }
    }
}
