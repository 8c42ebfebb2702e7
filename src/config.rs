pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3500";

/// Where the backend lives. Both values are baked in at build time
/// (`BACKEND_URL=https://... trunk build --release`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Socket.IO endpoint and `/downloads/{file}` host.
    pub backend_url: String,
    /// Prefix for REST calls such as `POST {api_base}/download`.
    pub api_base: String,
}

impl Config {
    pub fn from_build_env() -> Self {
        Self::resolve(
            option_env!("BACKEND_URL"),
            option_env!("API_BASE_URL"),
            !cfg!(debug_assertions),
        )
    }

    pub fn resolve(backend_url: Option<&str>, api_base: Option<&str>, release: bool) -> Self {
        let backend_url = non_empty(backend_url)
            .unwrap_or(DEFAULT_BACKEND_URL)
            .trim_end_matches('/')
            .to_string();

        // Release bundles sit behind the backend's reverse proxy.
        let api_base = match non_empty(api_base) {
            Some(base) => base.trim_end_matches('/').to_string(),
            None if release => "/api".to_string(),
            None => format!("{backend_url}/api"),
        };

        Self {
            backend_url,
            api_base,
        }
    }

    pub fn download_endpoint(&self) -> String {
        format!("{}/download", self.api_base)
    }

    /// URL of a finished file, the filename encoded as one path segment.
    pub fn video_url(&self, filename: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(filename.as_bytes())
            .collect::<String>()
            .replace('+', "%20");
        format!("{}/downloads/{}", self.backend_url, encoded)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_build_env()
    }
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}
