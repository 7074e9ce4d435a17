//! Merge CLI overrides onto file-loaded settings.

use std::path::PathBuf;

use super::Settings;

/// Values the CLI may override; `None` means "not given, keep the config".
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub root_dir: Option<PathBuf>,
    pub master_file: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub report_prefix: Option<String>,
    pub create_backups: Option<bool>,
    pub clean_sources: Option<bool>,
    pub include_subdirectories: Option<bool>,
    pub retention_days: Option<i64>,
}

pub fn merge_cli_with_settings(mut settings: Settings, cli: CliOverrides) -> Settings {
    if cli.root_dir.is_some() {
        settings.root_dir = cli.root_dir;
    }
    if let Some(master_file) = cli.master_file {
        settings.master_file = master_file;
    }
    if let Some(backup_dir) = cli.backup_dir {
        settings.backup_dir = backup_dir;
    }
    if let Some(prefix) = cli.report_prefix {
        settings.report_prefix = prefix;
    }
    if let Some(create_backups) = cli.create_backups {
        settings.options.create_backups = create_backups;
    }
    if let Some(clean_sources) = cli.clean_sources {
        settings.options.clean_sources = clean_sources;
    }
    if let Some(include_subdirectories) = cli.include_subdirectories {
        settings.options.include_subdirectories = include_subdirectories;
    }
    if let Some(retention_days) = cli.retention_days {
        settings.options.retention_days = retention_days;
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_wins_over_file() {
        let mut file = Settings::default();
        file.options.clean_sources = true;

        let merged = merge_cli_with_settings(
            file,
            CliOverrides {
                clean_sources: Some(false),
                report_prefix: Some("WEEKLY".to_string()),
                ..Default::default()
            },
        );
        assert!(!merged.options.clean_sources);
        assert_eq!(merged.report_prefix, "WEEKLY");
    }

    #[test]
    fn test_absent_overrides_keep_file_values() {
        let mut file = Settings::default();
        file.options.retention_days = 90;
        file.master_file = PathBuf::from("m.xlsx");

        let merged = merge_cli_with_settings(file, CliOverrides::default());
        assert_eq!(merged.options.retention_days, 90);
        assert_eq!(merged.master_file, PathBuf::from("m.xlsx"));
    }
}
