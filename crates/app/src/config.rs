use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

const MIB: usize = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub upload_dir: PathBuf,
    pub public_media_prefix: String,
    pub max_upload_bytes: usize,
    pub max_page_limit: u32,
    pub cors_allow_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid socket address: {0}")]
    InvalidSocket(String),
    #[error("invalid integer for {0}: {1}")]
    InvalidNumber(&'static str, String),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr_raw = read_string("ADBOARD_HTTP_ADDR", "127.0.0.1:3000");
        let http_addr = http_addr_raw
            .parse()
            .map_err(|_| ConfigError::InvalidSocket(http_addr_raw.clone()))?;
        let database_url = read_optional_string("ADBOARD_DATABASE_URL");
        let db_max_connections = read_number("ADBOARD_DB_MAX_CONNECTIONS", 5u32)?;
        let upload_dir = PathBuf::from(read_string("ADBOARD_UPLOAD_DIR", "./uploads"));
        let public_media_prefix = read_string("ADBOARD_PUBLIC_MEDIA_PREFIX", "/uploads");
        if public_media_prefix.trim().trim_matches('/').is_empty() {
            return Err(ConfigError::InvalidValue(
                "ADBOARD_PUBLIC_MEDIA_PREFIX",
                public_media_prefix,
            ));
        }
        let max_upload_bytes = read_number("ADBOARD_MAX_UPLOAD_BYTES", 20 * MIB)?;
        let max_page_limit = read_number("ADBOARD_MAX_PAGE_LIMIT", 100u32)?;
        if max_page_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "ADBOARD_MAX_PAGE_LIMIT",
                max_page_limit.to_string(),
            ));
        }
        let cors_allow_origins = read_list("ADBOARD_CORS_ALLOW_ORIGINS");

        Ok(Self {
            http_addr,
            database_url,
            db_max_connections,
            upload_dir,
            public_media_prefix,
            max_upload_bytes,
            max_page_limit,
            cors_allow_origins,
        })
    }

    /// Settings used when nothing is configured: in-memory store, uploads in
    /// the given directory.
    #[cfg(test)]
    pub fn for_tests(upload_dir: &Path) -> Self {
        Self {
            http_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            database_url: None,
            db_max_connections: 1,
            upload_dir: upload_dir.to_path_buf(),
            public_media_prefix: "/uploads".to_string(),
            max_upload_bytes: MIB,
            max_page_limit: 100,
            cors_allow_origins: Vec::new(),
        }
    }
}

pub fn load_dotenv() -> Result<(), std::io::Error> {
    let path = Path::new(".env");
    if !path.exists() {
        return Ok(());
    }
    let contents = std::fs::read_to_string(path)?;
    for (key, value) in contents.lines().filter_map(parse_dotenv_line) {
        if std::env::var_os(&key).is_none() {
            // Safety: invoked during startup before any threads are spawned.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

fn read_string(key: &'static str, default: &'static str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn read_number<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match read_optional_string(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(key, raw)),
        None => Ok(default),
    }
}

fn read_optional_string(key: &'static str) -> Option<String> {
    let value = std::env::var(key).unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_list(key: &'static str) -> Vec<String> {
    read_optional_string(key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_dotenv_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, raw) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let raw = raw.trim();
    let value = match raw.chars().next() {
        Some(quote @ ('"' | '\'')) if raw.len() >= 2 && raw.ends_with(quote) => {
            let inner = &raw[1..raw.len() - 1];
            if quote == '"' {
                unescape(inner)
            } else {
                inner.to_string()
            }
        }
        _ => raw.to_string(),
    };
    Some((key.to_string(), value))
}

fn unescape(value: &str) -> String {
    let mut output = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => output.push('\n'),
            Some('t') => output.push('\t'),
            Some('r') => output.push('\r'),
            Some(escaped @ ('\\' | '"')) => output.push(escaped),
            Some(other) => {
                output.push('\\');
                output.push(other);
            }
            None => output.push('\\'),
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::parse_dotenv_line;

    fn parsed(line: &str) -> (String, String) {
        parse_dotenv_line(line).unwrap()
    }

    #[test]
    fn plain_and_exported_pairs() {
        assert_eq!(
            parsed("ADBOARD_UPLOAD_DIR=/srv/media"),
            ("ADBOARD_UPLOAD_DIR".to_string(), "/srv/media".to_string())
        );
        assert_eq!(
            parsed("export ADBOARD_MAX_PAGE_LIMIT = 50"),
            ("ADBOARD_MAX_PAGE_LIMIT".to_string(), "50".to_string())
        );
    }

    #[test]
    fn quoted_values() {
        assert_eq!(parsed(r#"A="two words""#).1, "two words");
        assert_eq!(parsed("A='raw \\n'").1, "raw \\n");
        assert_eq!(parsed(r#"A="line\n\"quoted\"""#).1, "line\n\"quoted\"");
        assert_eq!(parsed(r#"A=""#).1, "\"");
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        assert!(parse_dotenv_line("# ADBOARD_HTTP_ADDR=0.0.0.0:80").is_none());
        assert!(parse_dotenv_line("  ").is_none());
        assert!(parse_dotenv_line("=value").is_none());
        assert!(parse_dotenv_line("no separator").is_none());
    }
}
