use serde::Deserialize;

/// Application settings, extracted from Rocket's figment alongside its own
/// configuration (`Rocket.toml`, `ROCKET_*` env vars).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Create the `todos` table on ignition if it is missing.
    #[serde(default = "default_init_schema")]
    pub init_schema: bool,
}

fn default_init_schema() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            init_schema: default_init_schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rocket::figment::Figment;

    use super::*;

    #[test]
    fn schema_bootstrap_is_on_by_default() {
        let config: AppConfig = Figment::new().extract().unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.init_schema);
    }

    #[test]
    fn schema_bootstrap_can_be_disabled() {
        let config: AppConfig = Figment::new()
            .merge(("init_schema", false))
            .extract()
            .unwrap();
        assert!(!config.init_schema);
    }
}
