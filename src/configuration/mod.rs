use std::{
    collections::HashMap,
    env,
    fs::File,
    io::{BufRead, BufReader, ErrorKind},
    path::{Path, PathBuf},
    time::Duration,
};

use lettre::Address;
use log::{debug, info};
use regex::Regex;

pub mod compression;
pub mod credential;
pub mod security;

pub use compression::Compression;
pub use credential::Credential;
pub use security::Security;

use crate::error::Error;

#[derive(Clone, Debug)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub credential: Credential,
    pub security: Security,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct Configuration {
    pub smtp: SmtpSettings,
}

impl Configuration {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    const DEFAULT_FILES: [&'static str; 3] = [
        ".env",
        "~/.rusty-dirmail.conf",
        "/etc/rusty-dirmail.conf",
    ];

    /// Loads the settings from the given (or first default) key/value file,
    /// letting process environment variables override it.
    pub fn load(filename: Option<&str>) -> Result<Configuration, Error> {
        let file_values = match Configuration::find_file(filename)? {
            Some(path) => {
                info!("read settings from {}", path.display());
                Configuration::read_file(&path)?
            }
            None => {
                debug!("no settings file found, using environment only");
                HashMap::new()
            }
        };

        Configuration::from_lookup(|key| match env::var(key) {
            Ok(value) => Some(value),
            Err(_) => file_values.get(key).cloned(),
        })
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Configuration, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        // the first key is the documented name, the rest are older aliases
        let required = |keys: &[&str]| -> Result<String, Error> {
            match keys.iter().find_map(|&key| lookup(key)) {
                Some(value) => Ok(value),
                None => Err(Error::Configuration(format!("{} is not set", keys[0]))),
            }
        };

        let server = required(&["SMTP_SERVER", "SMTP_SERVIDOR"])?.trim().to_string();
        if server.is_empty() {
            return Err(Error::Configuration(String::from("SMTP_SERVER is empty")));
        }

        let port_value = required(&["SMTP_PORT", "SMTP_PUERTO"])?;
        let port = match port_value.trim().parse::<u16>() {
            Ok(port) if port > 0 => port,
            _ => {
                return Err(Error::Configuration(format!(
                    "invalid SMTP_PORT value '{}'",
                    port_value
                )));
            }
        };

        let username = required(&["SMTP_USER", "SMTP_USUARIO"])?.trim().to_string();
        if username.parse::<Address>().is_err() {
            return Err(Error::Configuration(format!(
                "SMTP_USER '{}' is not a valid email address",
                username
            )));
        }
        let password = required(&["SMTP_PASSWORD"])?;

        let security = match lookup("SMTP_SECURITY") {
            Some(value) => Security::parse(&value)?,
            None => Security::default(),
        };

        let timeout = match lookup("SMTP_TIMEOUT") {
            Some(value) => match parse_duration0::parse(value.trim()) {
                Ok(duration) => duration,
                Err(_) => {
                    return Err(Error::Configuration(format!(
                        "invalid SMTP_TIMEOUT value '{}'",
                        value
                    )));
                }
            },
            None => Configuration::DEFAULT_TIMEOUT,
        };

        Ok(Configuration {
            smtp: SmtpSettings {
                server,
                port,
                credential: Credential::new(username, password),
                security,
                timeout,
            },
        })
    }

    fn expand_home(filename: &str) -> PathBuf {
        Configuration::expand_home_with(filename, dirs::home_dir().as_deref())
    }

    /// Only a leading `~` or `~/` refers to the home directory.
    fn expand_home_with(filename: &str, home: Option<&Path>) -> PathBuf {
        match home {
            Some(home) if filename == "~" => home.to_path_buf(),
            Some(home) => match filename.strip_prefix("~/") {
                Some(rest) => home.join(rest),
                None => PathBuf::from(filename),
            },
            None => PathBuf::from(filename),
        }
    }

    fn find_file(filename: Option<&str>) -> Result<Option<PathBuf>, Error> {
        match filename {
            Some(file) => {
                let path = Configuration::expand_home(file);
                if !path.exists() {
                    return Err(Error::Configuration(format!(
                        "config file '{}' doesn't exist",
                        file
                    )));
                }
                Ok(Some(path))
            }
            None => Ok(Configuration::DEFAULT_FILES
                .iter()
                .map(|file| Configuration::expand_home(file))
                .find(|path| path.is_file())),
        }
    }

    fn read_file(path: &Path) -> Result<HashMap<String, String>, Error> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(why) => match why.kind() {
                ErrorKind::NotFound => {
                    return Err(Error::Configuration(format!(
                        "config file '{}' doesn't exist",
                        path.display()
                    )));
                }
                _ => {
                    return Err(Error::Configuration(format!(
                        "unable to open config file '{}': {}",
                        path.display(),
                        why
                    )));
                }
            },
        };

        let mut values = HashMap::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|err| {
                Error::Configuration(format!("unable to read '{}': {}", path.display(), err))
            })?;
            if let Some((key, value)) = Configuration::parse_line(&line) {
                values.insert(key, value);
            }
        }

        Ok(values)
    }

    fn parse_line(line: &str) -> Option<(String, String)> {
        lazy_static! {
            static ref REGEX_ASSIGNMENT: Regex =
                Regex::new(r"^\s*(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*?)\s*$").unwrap();
        }

        if line.trim_start().starts_with('#') {
            return None;
        }
        let captures = REGEX_ASSIGNMENT.captures(line)?;
        let key = captures[1].to_string();
        let mut value = &captures[2];
        for quote in ['"', '\''] {
            if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
                value = &value[1..value.len() - 1];
                break;
            }
        }

        Some((key, value.to_string()))
    }
}
