use thiserror::Error;

/// Errors produced by the crawl, resolution and forecast pipeline.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Transport failure or a non-success HTTP status.
    #[error("Network error while fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The page did not have the structure the scraper expects.
    #[error("Failed to parse page: {0}")]
    Parse(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid index JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The query matched neither a city nor a province.
    #[error("No city or province matches '{0}'")]
    NotFound(String),

    /// The query matched a province that has no cities in the index.
    #[error("Province '{0}' has no cities in the index")]
    EmptyProvince(String),
}

impl WeatherError {
    pub fn network(url: &str, message: impl ToString) -> Self {
        Self::Network {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

pub type Result<T, E = WeatherError> = std::result::Result<T, E>;
