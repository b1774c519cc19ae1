use std::path::PathBuf;

use clap::Parser;

use filmsort_core::Config;

/// Identify films in the source folders and file them into the library.
#[derive(Debug, Parser)]
#[command(name = "filmsort", version, about)]
pub struct Args {
    /// Configuration file.
    #[arg(long, env = "FILMSORT_CONFIG", default_value = "filmsort.toml")]
    pub config: PathBuf,

    /// Show what would happen without touching any file.
    #[arg(short, long)]
    pub test: bool,

    /// Verbose logging, plus the effective config and metrics at the end.
    #[arg(short, long)]
    pub debug: bool,

    /// Do not notify the media server.
    #[arg(short, long)]
    pub quiet: bool,

    /// Process at most N films.
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,

    /// Source folders, replacing the configured ones.
    #[arg(short, long = "source", value_name = "DIR", num_args = 1..)]
    pub sources: Vec<PathBuf>,

    /// Look up films without a year or that look like TV shows.
    #[arg(short, long)]
    pub force_lookup: bool,

    /// Overwrite files already at the destination path.
    #[arg(short = 'o', long)]
    pub overwrite: bool,

    /// Accept the best candidate even below the similarity threshold.
    #[arg(long)]
    pub no_strict: bool,

    /// Skip duplicate checking.
    #[arg(long)]
    pub no_duplicates: bool,

    /// Copy instead of moving.
    #[arg(short, long)]
    pub copy: bool,

    /// Rename films in their source folders instead of moving them.
    #[arg(long)]
    pub rename_only: bool,

    /// Confirm matches and duplicate actions at the terminal.
    #[arg(short, long)]
    pub interactive: bool,

    /// Minimum catalog popularity.
    #[arg(short, long, value_name = "FLOAT")]
    pub pop: Option<f64>,

    /// Log and report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Apply command-line switches on top of the loaded configuration.
    /// Switches only ever turn behaviour on; absent flags keep the config.
    pub fn apply(&self, config: &mut Config) {
        if !self.sources.is_empty() {
            config.sources = self.sources.clone();
        }
        if let Some(limit) = self.limit {
            config.run.limit = limit;
        }
        if let Some(pop) = self.pop {
            config.lookup.min_popularity = pop;
        }

        config.run.test |= self.test;
        config.run.debug |= self.debug;
        config.run.quiet |= self.quiet;
        config.lookup.force_lookup |= self.force_lookup;
        config.lookup.interactive |= self.interactive;
        config.duplicates.force_overwrite |= self.overwrite;
        config.transfer.always_copy |= self.copy;
        config.rename.rename_only |= self.rename_only;

        if self.no_strict {
            config.lookup.strict = false;
        }
        if self.no_duplicates {
            config.duplicates.enabled = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filmsort_core::testing::fixtures;
    use std::path::Path;

    fn config() -> Config {
        fixtures::config_for(Path::new("/downloads"), Path::new("/films"))
    }

    #[test]
    fn test_defaults_leave_config_alone() {
        let args = Args::try_parse_from(["filmsort"]).unwrap();
        let mut config = config();
        args.apply(&mut config);

        assert_eq!(config.sources, vec![PathBuf::from("/downloads")]);
        assert!(!config.run.test);
        assert!(config.lookup.strict);
        assert!(config.duplicates.enabled);
        assert!(!config.rename.rename_only);
        assert_eq!(config.run.limit, 0);
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "filmsort", "-t", "-q", "-l", "5", "-s", "/a", "/b", "--no-strict",
            "--no-duplicates", "-c", "-o", "-f", "-p", "2.5", "--rename-only",
        ])
        .unwrap();
        let mut config = config();
        args.apply(&mut config);

        assert!(config.run.test);
        assert!(config.run.quiet);
        assert_eq!(config.run.limit, 5);
        assert_eq!(
            config.sources,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert!(!config.lookup.strict);
        assert!(!config.duplicates.enabled);
        assert!(config.transfer.always_copy);
        assert!(config.duplicates.force_overwrite);
        assert!(config.lookup.force_lookup);
        assert_eq!(config.lookup.min_popularity, 2.5);
        assert!(config.rename.rename_only);
    }

    #[test]
    fn test_absent_flags_keep_config_switches() {
        let args = Args::try_parse_from(["filmsort"]).unwrap();
        let mut config = config();
        config.run.test = true;
        config.transfer.always_copy = true;
        args.apply(&mut config);

        assert!(config.run.test);
        assert!(config.transfer.always_copy);
    }

    #[test]
    fn test_config_path_default() {
        let args = Args::try_parse_from(["filmsort", "--config", "/etc/filmsort.toml"]).unwrap();
        assert_eq!(args.config, PathBuf::from("/etc/filmsort.toml"));
    }
}
