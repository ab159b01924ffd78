use crate::domain::errors::ValidationError;

/// Endpoint of the locally run emulator
pub const DEFAULT_LOCAL_ENDPOINT: &str = "localhost:9000";

/// Address of a storage control plane: host, optional port and transport security
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: Option<u16>,
    secure: bool,
}

impl Endpoint {
    /// Parse `host[:port]` or `http(s)://host[:port]`.
    ///
    /// An explicit scheme takes precedence over `secure`.
    pub fn parse(input: &str, secure: bool) -> Result<Self, ValidationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::EmptyEndpoint);
        }

        let (secure, rest) = match input.split_once("://") {
            Some(("http", rest)) => (false, rest),
            Some(("https", rest)) => (true, rest),
            Some((scheme, _)) => return Err(ValidationError::UnsupportedScheme(scheme.to_string())),
            None => (secure, input),
        };

        let rest = rest.trim_end_matches('/');
        if let Some(idx) = rest.find('/') {
            return Err(ValidationError::EndpointHasPath(rest[idx..].to_string()));
        }

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| ValidationError::InvalidPort(port.to_string()))?;
                (host, Some(port))
            }
            None => (rest, None),
        };

        if host.is_empty() {
            return Err(ValidationError::EmptyEndpoint);
        }

        Ok(Self {
            host: host.to_ascii_lowercase(),
            port,
            secure,
        })
    }

    /// The default local emulator endpoint (plain HTTP)
    pub fn local_default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: Some(9000),
            secure: false,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure { "https" } else { "http" }
    }

    /// `host[:port]`, also used as the `Host` header
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// `scheme://host[:port]`
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.authority())
    }

    /// Port actually dialed, falling back to the scheme default
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(if self.secure { 443 } else { 80 })
    }

    /// Whether this endpoint points at the locally managed emulator
    pub fn is_default_local(&self) -> bool {
        matches!(self.host.as_str(), "localhost" | "127.0.0.1") && self.port == Some(9000)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.authority())
    }
}
