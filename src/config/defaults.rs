use super::*;

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://insight.ecoguard.se".to_string(),
            login_path: "/Account/Logon".to_string(),
            utility_code: "ELEC".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/ecoguard.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            state_file: "/data/ecoguard_state.json".to_string(),
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            output_dir: "/data/ecoguard_statistics".to_string(),
            currency: "SEK".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: AccountConfig::default(),
            portal: PortalConfig::default(),
            refresh_interval_secs: 3600,
            timezone: "Europe/Stockholm".to_string(),
            logging: LoggingConfig::default(),
            persistence: PersistenceConfig::default(),
            statistics: StatisticsConfig::default(),
        }
    }
}
