#[cfg(test)]
mod config_tests {
    use rustjitter::config::{Config, JitterConfig};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_jitter_config_default() {
        let config = JitterConfig::default();
        assert_eq!(config.min_latency, 200);
        assert_eq!(config.max_latency, 400);
        assert_eq!(config.window, 2000);
        assert_eq!(config.tick_interval, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_jitter_config_validate() {
        assert!(JitterConfig::new(100, 400, 1000, 0).validate().is_err());
        assert!(JitterConfig::new(100, 400, 0, 20).validate().is_err());
        assert!(JitterConfig::new(500, 400, 1000, 20).validate().is_err());
        assert!(JitterConfig::new(-1, 400, 1000, 20).validate().is_err());
        assert!(JitterConfig::new(0, 0, 1000, 20).validate().is_ok());
    }

    #[test]
    fn test_config_load() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[jitter]
min_latency = 100
max_latency = 400
window = 1000
tick_interval = 20

[simulation]
packets = 50
seed = 7
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_file, None);
        assert_eq!(config.jitter, JitterConfig::new(100, 400, 1000, 20));
        assert_eq!(config.simulation.packets, 50);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.jitter_ms, 60);
    }

    #[test]
    fn test_config_load_partial_jitter_section() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[jitter]\nmin_latency = 60").unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.jitter.min_latency, 60);
        assert_eq!(config.jitter.max_latency, 400);
        assert_eq!(config.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn test_config_load_rejects_bad_bounds() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[jitter]\nmin_latency = 900\nmax_latency = 400").unwrap();
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_config_load_missing_file() {
        let err = Config::load("/nonexistent/rustjitter.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rustjitter.toml"));
    }
}
