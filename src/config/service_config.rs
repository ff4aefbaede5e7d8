use crate::domain::model::ServiceKind;
use crate::utils::error::{BrokerError, Result};
use crate::utils::validation::{
    validate_email, validate_non_empty_string, validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable advertising the delegated-credential file location.
/// Published by [`ServiceConfig::bind`] and consumed by the authorization
/// layer's default discovery.
pub const CREDENTIALS_ENV: &str = "GROUPS_BROKER_CREDENTIALS";

/// Configuration for one (API, domain) pair: where the credential material
/// lives, the domain defaults, and the named API profiles an adaptor
/// instance can activate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub credentials: CredentialsConfig,
    pub domain: DomainConfig,
    pub profiles: HashMap<String, ApiProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub dir: String,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Domain used by group listing when the caller gives none.
    pub default_name: String,
    /// Identity the authorized handle acts as (delegated subject).
    pub subject_email: String,
}

/// A named bundle of remote-service identity, scopes, and target resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiProfile {
    pub service: ServiceKind,
    pub application_name: String,
    pub base_url: String,
    /// Scopes requested for the delegated token. Falls back to the service
    /// kind's default set when omitted.
    pub scopes: Option<Vec<String>>,
    /// Group the settings operations are bound to. Required for settings
    /// profiles, unused elsewhere.
    pub group_email: Option<String>,
}

impl ApiProfile {
    pub fn effective_scopes(&self) -> Vec<String> {
        match &self.scopes {
            Some(scopes) if !scopes.is_empty() => scopes.clone(),
            _ => self
                .service
                .default_scopes()
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// One activated profile plus the domain defaults it operates under.
/// Produced by [`ServiceConfig::bind`]; rebinding replaces it wholesale.
#[derive(Debug, Clone)]
pub struct BoundProfile {
    pub profile: ApiProfile,
    pub domain: DomainConfig,
}

impl ServiceConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BrokerError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BrokerError::InvalidConfigValue {
            field: "toml_parsing".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` references from the environment. Unknown variables
    /// are left verbatim.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid");

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Full path to the delegated-credential file.
    pub fn credentials_path(&self) -> PathBuf {
        Path::new(&self.credentials.dir).join(&self.credentials.file)
    }

    /// Activate the named profile for this adaptor instance and publish the
    /// credential file location to the environment so the authorization
    /// layer's default discovery finds it. Exactly one profile is active per
    /// bound adaptor; binding again replaces it wholesale.
    pub fn bind(&self, profile_name: &str) -> Result<BoundProfile> {
        let profile = self
            .profiles
            .get(profile_name)
            .cloned()
            .ok_or_else(|| BrokerError::Config {
                message: format!("no API profile named [{}]", profile_name),
            })?;

        if profile.service == ServiceKind::Settings {
            validate_required_field(
                &format!("profiles.{}.group_email", profile_name),
                &profile.group_email,
            )?;
        }

        std::env::set_var(CREDENTIALS_ENV, self.credentials_path());

        Ok(BoundProfile {
            profile,
            domain: self.domain.clone(),
        })
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("credentials.dir", &self.credentials.dir)?;
        validate_non_empty_string("credentials.file", &self.credentials.file)?;
        validate_non_empty_string("domain.default_name", &self.domain.default_name)?;
        validate_email("domain.subject_email", &self.domain.subject_email)?;

        for (name, profile) in &self.profiles {
            validate_non_empty_string(
                &format!("profiles.{}.application_name", name),
                &profile.application_name,
            )?;
            validate_url(&format!("profiles.{}.base_url", name), &profile.base_url)?;
            if let Some(group_email) = &profile.group_email {
                validate_email(&format!("profiles.{}.group_email", name), group_email)?;
            }
        }

        Ok(())
    }
}
