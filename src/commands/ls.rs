//! # Ls Command Implementation
//!
//! This module implements the `ls` subcommand, which lists the suites and
//! build definitions declared in `ecosystem-ci.yaml`.
//!
//! This command is a safe, read-only operation that does not touch the
//! workspace or run any external command.

use anyhow::Result;
use clap::Args;

use ecosystem_ci::config::Config;
use ecosystem_ci::registry::Suite;

use super::Context;

/// List configured suites and builds
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Use long listing format showing repository and revision.
    #[arg(short, long)]
    pub long: bool,

    /// Show only the number of suites and builds.
    #[arg(long)]
    pub count: bool,
}

/// Execute the `ls` command.
pub fn execute(ctx: &Context, args: LsArgs) -> Result<()> {
    let config = ctx.load_config()?;
    for line in render(&config, &args) {
        println!("{}", line);
    }
    Ok(())
}

fn describe(suite: &Suite, long: bool) -> String {
    if !long {
        return suite.name.clone();
    }
    let repo = &suite.repo;
    let revision = repo
        .tag
        .as_deref()
        .or(repo.commit.as_deref())
        .unwrap_or(repo.branch());
    format!("{:<32} {}#{}", suite.name, repo.repo, revision)
}

/// The lines `ls` prints.
fn render(config: &Config, args: &LsArgs) -> Vec<String> {
    if args.count {
        return vec![format!(
            "{} suite(s), {} build(s)",
            config.suites.len(),
            config.builds.len()
        )];
    }

    let mut lines = Vec::new();
    if config.suites.is_empty() {
        lines.push("No suites configured.".to_string());
    } else {
        lines.push("Suites:".to_string());
        lines.extend(
            config
                .suites
                .iter()
                .map(|suite| format!("  {}", describe(suite, args.long))),
        );
    }

    if !config.builds.is_empty() {
        lines.push("Builds:".to_string());
        for build in &config.builds {
            lines.push(format!("  {}", describe(&build.suite, args.long)));
            if args.long {
                for (package, dir) in &build.packages {
                    lines.push(format!("    {} -> {}", package, dir));
                }
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosystem_ci::config;

    const CONFIG: &str = r#"
suites:
  - { name: vitepress, repo: vuejs/vitepress }
  - { name: nuxt, repo: nuxt/nuxt, tag: v3.8.0 }
builds:
  - name: vite-plugin-vue
    repo: vitejs/vite-plugin-vue
    packages: { "@vitejs/plugin-vue": packages/plugin-vue }
"#;

    fn args(long: bool, count: bool) -> LsArgs {
        LsArgs { long, count }
    }

    #[test]
    fn test_short_listing() {
        let config = config::parse(CONFIG).unwrap();
        assert_eq!(
            render(&config, &args(false, false)),
            vec!["Suites:", "  vitepress", "  nuxt", "Builds:", "  vite-plugin-vue"]
        );
    }

    #[test]
    fn test_long_listing_shows_revision_and_packages() {
        let config = config::parse(CONFIG).unwrap();
        let lines = render(&config, &args(true, false));
        assert!(lines[1].ends_with("vuejs/vitepress#main"));
        assert!(lines[2].ends_with("nuxt/nuxt#v3.8.0"));
        assert_eq!(lines.last().unwrap(), "    @vitejs/plugin-vue -> packages/plugin-vue");
    }

    #[test]
    fn test_count() {
        let config = config::parse(CONFIG).unwrap();
        assert_eq!(render(&config, &args(false, true)), vec!["2 suite(s), 1 build(s)"]);
    }

    #[test]
    fn test_empty_config() {
        let lines = render(&Config::default(), &args(false, false));
        assert_eq!(lines, vec!["No suites configured."]);
    }
}
