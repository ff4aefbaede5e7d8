use serde::{Deserialize, Serialize};

/// The remote APIs this adaptor can bind to. A profile names exactly one of
/// these; the kind fixes the URL prefix and the default scope set, so there
/// is no runtime lookup of service classes by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Directory,
    Settings,
    Migration,
}

impl ServiceKind {
    /// Path prefix under the profile's base URL.
    pub fn url_prefix(&self) -> &'static str {
        match self {
            ServiceKind::Directory => "directory/v1",
            ServiceKind::Settings => "settings/v1",
            ServiceKind::Migration => "migration/v1",
        }
    }

    /// Scope set requested when a profile does not list its own.
    pub fn default_scopes(&self) -> &'static [&'static str] {
        match self {
            ServiceKind::Directory => &["directory.group", "directory.group.member"],
            ServiceKind::Settings => &["groups.settings"],
            ServiceKind::Migration => &["groups.migration"],
        }
    }
}

/// Membership role understood by the directory service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberRole {
    Owner,
    Manager,
    Member,
}

/// Request body for creating a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request body for adding a member to a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    pub email: String,
    pub role: MemberRole,
}

/// A live, authenticated connection to one remote API, bound to one
/// impersonated subject. Built fresh for every operation and discarded after
/// the call returns; never cached.
#[derive(Debug, Clone)]
pub struct AuthorizedHandle {
    client: reqwest::Client,
    base_url: String,
    token: String,
    application_name: String,
}

impl AuthorizedHandle {
    pub(crate) fn new(base_url: String, token: String, application_name: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
            application_name,
        }
    }

    pub(crate) fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::POST, path)
    }

    pub(crate) fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::PUT, path)
    }

    pub(crate) fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.request(reqwest::Method::DELETE, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, &self.application_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_kind_url_prefix() {
        assert_eq!(ServiceKind::Directory.url_prefix(), "directory/v1");
        assert_eq!(ServiceKind::Settings.url_prefix(), "settings/v1");
        assert_eq!(ServiceKind::Migration.url_prefix(), "migration/v1");
    }

    #[test]
    fn test_member_role_wire_format() {
        assert_eq!(serde_json::to_string(&MemberRole::Owner).unwrap(), "\"OWNER\"");
        assert_eq!(serde_json::to_string(&MemberRole::Member).unwrap(), "\"MEMBER\"");
        let role: MemberRole = serde_json::from_str("\"MANAGER\"").unwrap();
        assert_eq!(role, MemberRole::Manager);
    }

    #[test]
    fn test_new_group_omits_empty_description() {
        let group = NewGroup {
            email: "course-talk@discussions-dev.example.edu".to_string(),
            name: "Course talk".to_string(),
            description: None,
        };
        let json = serde_json::to_value(&group).unwrap();
        assert!(json.get("description").is_none());
        assert_eq!(json["email"], "course-talk@discussions-dev.example.edu");
    }

    #[test]
    fn test_service_kind_config_spelling() {
        let kind: ServiceKind = serde_json::from_str("\"directory\"").unwrap();
        assert_eq!(kind, ServiceKind::Directory);
    }
}
