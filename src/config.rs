use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Config {
    fn parse_origins(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect()
    }

    fn default_cors_origins() -> Vec<String> {
        vec![
            "http://localhost:5173".to_string(),
            "http://localhost:3000".to_string(),
        ]
    }

    pub fn from_env() -> Result<Self, crate::error::AppError> {
        dotenv().ok();
        let bind_host = env::var("BIND_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8000);

        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(value) => {
                let origins = Self::parse_origins(&value);
                if origins.is_empty() {
                    return Err(crate::error::AppError::Config(
                        "CORS_ORIGINS set but empty".into(),
                    ));
                }
                origins
            }
            Err(_) => Self::default_cors_origins(),
        };

        Ok(Self {
            bind_host,
            port,
            cors_origins,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_trims_and_drops_empty() {
        let origins = Config::parse_origins(" http://a.example , ,http://b.example,");
        assert_eq!(origins, vec!["http://a.example", "http://b.example"]);
    }

    #[test]
    fn test_bind_addr_format() {
        let cfg = Config {
            bind_host: "127.0.0.1".into(),
            port: 9000,
            cors_origins: Config::default_cors_origins(),
        };
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9000");
    }
}
