use anyhow::{self, Result};
use dotenv::dotenv;
use home_core::{navigation::RoomDatabase, persistence::DEFAULT_KEY_PREFIX};
use std::{
    fmt::{self, Display, Formatter},
    net::SocketAddr,
    path::PathBuf,
    str::FromStr,
};

#[derive(Clone, Debug, PartialEq)]
pub enum StorageKind {
    InMem,
    File,
}

impl FromStr for StorageKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inmem" => Ok(StorageKind::InMem),
            "file" => Ok(StorageKind::File),
            _ => Err(()),
        }
    }
}

impl StorageKind {
    fn as_str(&self) -> &'static str {
        match self {
            StorageKind::InMem => "inmem",
            StorageKind::File => "file",
        }
    }
}

impl Display for StorageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub data_dir: PathBuf,
    pub key_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::InMem,
            data_dir: PathBuf::from("./data"),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavigationConfig {
    /// Empty means the built-in test rooms.
    pub rooms: Vec<String>,
    pub target: Option<String>,
}

impl NavigationConfig {
    pub fn room_database(&self) -> RoomDatabase {
        if self.rooms.is_empty() {
            RoomDatabase::test_rooms()
        } else {
            RoomDatabase::from_ids(self.rooms.iter().cloned())
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind: SocketAddr,
    pub storage: StorageConfig,
    pub seed_demo: bool,
    pub navigation: NavigationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            storage: StorageConfig::default(),
            seed_demo: false,
            navigation: NavigationConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut c = Self::default();
        if let Some(s) = lookup("HOME_BIND") {
            c.bind = s.parse()?;
        }
        if let Some(s) = lookup("HOME_STORAGE") {
            c.storage.kind = StorageKind::from_str(&s)
                .map_err(|_| anyhow::anyhow!("unsupported storage kind: {s}"))?;
        }
        if let Some(s) = lookup("HOME_DATA_DIR") {
            c.storage.data_dir = PathBuf::from(s);
        }
        if let Some(s) = lookup("HOME_KEY_PREFIX") {
            if s.is_empty() {
                anyhow::bail!("HOME_KEY_PREFIX must not be empty");
            }
            c.storage.key_prefix = s;
        }
        if let Some(s) = lookup("HOME_SEED_DEMO") {
            c.seed_demo = parse_bool(&s)?;
        }
        if let Some(s) = lookup("HOME_ROOMS") {
            c.navigation.rooms =
                s.split(',').map(str::trim).filter(|r| !r.is_empty()).map(String::from).collect();
        }
        if let Some(s) = lookup("HOME_NAV_TARGET") {
            c.navigation.target = Some(s).filter(|t| !t.is_empty());
        }
        Ok(c)
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("invalid boolean: {s}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let c = from_pairs(&[]).unwrap();
        assert_eq!(c.bind.to_string(), "127.0.0.1:8080");
        assert_eq!(c.storage.kind, StorageKind::InMem);
        assert_eq!(c.storage.key_prefix, "@smart_home");
        assert!(!c.seed_demo);
        assert_eq!(c.navigation.room_database(), RoomDatabase::test_rooms());
    }

    #[test]
    fn reads_overrides() {
        let c = from_pairs(&[
            ("HOME_BIND", "0.0.0.0:9000"),
            ("HOME_STORAGE", "FILE"),
            ("HOME_DATA_DIR", "/var/lib/home"),
            ("HOME_SEED_DEMO", "yes"),
            ("HOME_ROOMS", "Kitchen, Hall,,Garage"),
            ("HOME_NAV_TARGET", "Garage"),
        ])
        .unwrap();
        assert_eq!(c.bind.port(), 9000);
        assert_eq!(c.storage.kind, StorageKind::File);
        assert_eq!(c.storage.data_dir, PathBuf::from("/var/lib/home"));
        assert!(c.seed_demo);
        assert_eq!(c.navigation.rooms, vec!["Kitchen", "Hall", "Garage"]);
        assert_eq!(c.navigation.target.as_deref(), Some("Garage"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(from_pairs(&[("HOME_STORAGE", "postgres")]).is_err());
        assert!(from_pairs(&[("HOME_SEED_DEMO", "maybe")]).is_err());
        assert!(from_pairs(&[("HOME_BIND", "nowhere")]).is_err());
        assert!(from_pairs(&[("HOME_KEY_PREFIX", "")]).is_err());
    }
}
