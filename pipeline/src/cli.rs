use clap::Parser;

#[derive(Debug, Parser)]
#[clap(
    name = "sales-pipeline",
    version,
    about = "Pull CRM opportunities, aggregate them and write a pipeline snapshot"
)]
pub struct Cli {
    /// Use the built-in demo dataset instead of the configured CRM
    #[clap(long)]
    pub demo: bool,

    /// Same as --demo
    #[clap(long)]
    pub dry_run: bool,
}

impl Cli {
    pub fn demo_requested(&self) -> bool {
        self.demo || self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_means_live_mode() {
        let cli = Cli::try_parse_from(["sales-pipeline"]).unwrap();
        assert!(!cli.demo_requested());
    }

    #[test]
    fn either_flag_forces_demo() {
        for flag in ["--demo", "--dry-run"] {
            let cli = Cli::try_parse_from(["sales-pipeline", flag]).unwrap();
            assert!(cli.demo_requested(), "{flag}");
        }
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["sales-pipeline", "--live"]).is_err());
    }
}
