use std::{
    collections::BTreeMap,
    env,
    fs::File,
    io,
    path::{Path, PathBuf},
    time,
};

use serde::{Deserialize, Deserializer};
use tracing::debug;

const DEFAULT_ENDPOINT: &str = "https://secure.gooddata.com";
const DEFAULT_POLL_INTERVAL: time::Duration = time::Duration::from_secs(2);
const DEFAULT_TIMEOUT: time::Duration = time::Duration::from_secs(60);
const DEFAULT_RETRIES: u32 = 3;

/// An error encountered while loading or resolving a configuration profile.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The config file could not be read.
    #[error("Failed to load config file")]
    Io(#[from] io::Error),
    /// The config file is not valid YAML, or has the wrong shape.
    #[error("Invalid configuration")]
    Invalid(#[from] serde_yaml::Error),
    /// The config file has no profile with the requested name.
    #[error("Profile '{0}' not found")]
    ProfileNotFound(String),
    /// The token cannot be sent as an HTTP header value.
    #[error("Session token contains invalid characters")]
    InvalidToken,
    /// The endpoint is not a valid URI.
    #[error("Invalid URI")]
    InvalidUri(#[from] http::uri::InvalidUri),
    /// The endpoint lacks a scheme or an authority.
    #[error("Endpoint must be an absolute URI: {0}")]
    RelativeEndpoint(String),
}

/// A fully resolved configuration profile for talking to the platform.
#[derive(Clone)]
pub struct Profile {
    /// The name of the profile.
    pub name: String,
    /// The scheme and authority all request paths are resolved against.
    pub endpoint: http::Uri,
    /// A super-secured token used to authenticate, if any.
    pub sst: Option<String>,
    /// How long to wait between two polls of an asynchronous task.
    pub poll_interval: time::Duration,
    /// The timeout applied to each individual HTTP request.
    pub timeout: time::Duration,
    /// How many times the transport retries an idempotent request after a
    /// connection-level failure.
    pub retries: u32,
    /// The user-agent used on requests.
    pub user_agent: String,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("sst", &self.sst.as_ref().map(|_| "********"))
            .field("poll_interval", &self.poll_interval)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// A profile stored in the config file.
#[derive(Debug, Default, Clone, Deserialize)]
struct ConfigProfile {
    endpoint: Option<String>,
    sst: Option<String>,
    #[serde(default, deserialize_with = "deserialize_duration")]
    poll_interval: Option<time::Duration>,
    #[serde(default, deserialize_with = "deserialize_duration")]
    timeout: Option<time::Duration>,
    retries: Option<u32>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct Config {
    profiles: BTreeMap<String, ConfigProfile>,
}

impl Profile {
    /// Build a profile for the given endpoint with default settings, without
    /// reading any file or environment variable.
    pub fn new(endpoint: &str) -> Result<Self, Error> {
        Self::from_raw(
            ConfigProfile {
                endpoint: Some(endpoint.to_owned()),
                ..Default::default()
            },
            "default".to_owned(),
        )
    }

    /// Load the selected profile from the configuration file (usually
    /// ~/.config/gooddata.yaml). If no configuration file is present, then
    /// the configuration will be loaded solely from the environment.
    ///
    /// If `GOODDATA_PROFILE` is set, that will be used to select the profile.
    /// Otherwise the profile `default` will be used.
    pub fn from_default_env() -> Result<Self, Error> {
        if let Ok(s) = env::var("GOODDATA_PROFILE") {
            Self::from_env(&s)
        } else {
            Self::from_env("default")
        }
    }

    /// Load the given profile from the configuration file (usually
    /// ~/.config/gooddata.yaml). If no configuration file is present, then
    /// the configuration will be loaded solely from the environment.
    ///
    /// The following environment variables can override the corresponding
    /// values in the config file:
    ///
    /// | Environment Variable | Config Value |
    /// |----------------------|--------------|
    /// | `GOODDATA_ENDPOINT`  | `endpoint`   |
    /// | `GOODDATA_SST`       | `sst`        |
    pub fn from_env(name: &str) -> Result<Self, Error> {
        let endpoint = env::var("GOODDATA_ENDPOINT").ok();
        let sst = env::var("GOODDATA_SST").ok();

        let config_path = find_config()?;
        let profile = match read_profile(&config_path, name) {
            Ok(p) => p,
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config file found");
                Default::default()
            }
            Err(e) => return Err(e),
        };

        let profile = ConfigProfile {
            endpoint: endpoint.or(profile.endpoint),
            sst: sst.or(profile.sst),
            ..profile
        };

        Self::from_raw(profile, name.to_owned())
    }

    /// Load the given profile (or 'default') from the given file. Does not
    /// read any environment variables.
    pub fn read(path: impl AsRef<Path>, name: Option<&str>) -> Result<Self, Error> {
        let name = name.unwrap_or("default").to_owned();
        let profile = read_profile(path.as_ref(), &name)?;
        Self::from_raw(profile, name)
    }

    /// Override the interval between polls.
    pub fn with_poll_interval(self, poll_interval: time::Duration) -> Self {
        Self {
            poll_interval,
            ..self
        }
    }

    /// Set the super-secured token used to authenticate.
    pub fn with_sst(self, sst: impl Into<String>) -> Result<Self, Error> {
        let sst = sst.into();
        check_token(&sst)?;

        Ok(Self {
            sst: Some(sst),
            ..self
        })
    }

    fn from_raw(raw: ConfigProfile, name: String) -> Result<Self, Error> {
        let ConfigProfile {
            endpoint,
            sst,
            poll_interval,
            timeout,
            retries,
        } = raw;

        let endpoint_str = endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let endpoint: http::Uri = endpoint_str.parse()?;
        if endpoint.scheme().is_none() || endpoint.authority().is_none() {
            return Err(Error::RelativeEndpoint(endpoint_str.to_owned()));
        }

        if let Some(sst) = &sst {
            check_token(sst)?;
        }

        Ok(Self {
            name,
            endpoint,
            sst,
            poll_interval: poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            retries: retries.unwrap_or(DEFAULT_RETRIES),
            user_agent: format!("gooddata-rust/{}", env!("CARGO_PKG_VERSION")),
        })
    }
}

fn check_token(token: &str) -> Result<(), Error> {
    match http::HeaderValue::from_str(token) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::InvalidToken),
    }
}

fn find_config() -> Result<PathBuf, Error> {
    let Some(home) = env::home_dir() else {
        return Err(Error::Io(io::Error::other(
            "No $HOME found for the current user",
        )));
    };

    let canonical = home.join(".config/gooddata.yaml");
    if canonical.exists() {
        return Ok(canonical);
    }

    for fallback in [".config/gooddata.yml", ".gooddata/config.yaml"] {
        let path = home.join(fallback);
        if path.exists() {
            return Ok(path);
        }
    }

    Ok(canonical)
}

fn read_profile(p: &Path, name: &str) -> Result<ConfigProfile, Error> {
    let file = File::open(p)?;
    let mut config: Config = serde_yaml::from_reader(file).map_err(Error::Invalid)?;
    let Some(config_profile) = config.profiles.remove(name) else {
        return Err(Error::ProfileNotFound(name.to_string()));
    };

    debug!(path = %p.display(), "loaded config file");

    Ok(config_profile)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Option<time::Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(s) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    humantime::parse_duration(&s)
        .map(Some)
        .map_err(serde::de::Error::custom)
}
