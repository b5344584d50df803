//! # Bisection
//!
//! Drives `git bisect` over the target library checkout to find the first
//! commit that breaks a suite. HEAD is marked bad and the given ref good;
//! release and docs commits are skipped without running anything. Every
//! other candidate runs the suite exactly once.
//!
//! Failures inside the loop are logged and end the search. `git bisect
//! reset` is always attempted afterwards; its failure is only a warning.

use regex::Regex;

use crate::error::Result;
use crate::git;
use crate::session::Session;

/// Subjects of commits that cannot change behaviour.
pub const NON_CODE_SUBJECT: &str = r"^(?:release|docs)[:(]";

/// Matches commit subjects of release and docs commits.
#[derive(Debug, Clone)]
pub struct NonCodeCommitFilter {
    pattern: Regex,
}

impl NonCodeCommitFilter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(NON_CODE_SUBJECT)?,
        })
    }

    pub fn is_non_code(&self, subject: &str) -> bool {
        self.pattern.is_match(subject)
    }
}

/// What a bisection did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BisectReport {
    /// Candidates the suite ran against.
    pub tested: usize,
    /// Candidates skipped as non-code commits.
    pub skipped: usize,
    /// Whether git ran out of candidates, as opposed to the loop failing.
    pub completed: bool,
    /// Abbreviated or full hash git reported as the first bad commit.
    pub first_bad: Option<String>,
}

/// Whether git has more candidates; it announces them with `Bisecting:`.
fn is_bisecting(output: &str) -> bool {
    output
        .get(..10)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bisecting:"))
}

fn first_bad_commit(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_suffix(" is the first bad commit"))
        .map(str::to_string)
}

/// Bisects the target checkout between HEAD (bad) and `good`.
///
/// `run_suite` returns an error when the current checkout is bad. The
/// session is left in the target checkout.
pub fn bisect<F>(session: &mut Session, good: &str, mut run_suite: F) -> Result<BisectReport>
where
    F: FnMut(&mut Session) -> Result<()>,
{
    let filter = NonCodeCommitFilter::new()?;
    let mut report = BisectReport::default();

    if let Err(e) = bisect_loop(session, good, &filter, &mut run_suite, &mut report) {
        log::error!("error while bisecting: {}", e);
    }

    let target_path = session.target_path().to_path_buf();
    session.cd(&target_path);
    if let Err(e) = git::bisect(session, ["reset"]) {
        log::warn!("Error while resetting bisect: {}", e);
    }

    Ok(report)
}

fn bisect_loop<F>(
    session: &mut Session,
    good: &str,
    filter: &NonCodeCommitFilter,
    run_suite: &mut F,
    report: &mut BisectReport,
) -> Result<()>
where
    F: FnMut(&mut Session) -> Result<()>,
{
    let target_path = session.target_path().to_path_buf();
    session.cd(&target_path);
    // builds may touch tracked files, which would stop bisect from moving on
    git::reset_hard(session, "HEAD")?;
    git::bisect(session, ["start"])?;
    git::bisect(session, ["bad"])?;
    git::bisect(session, ["good", good])?;

    loop {
        let subject = git::head_subject(session)?;
        let output = if filter.is_non_code(&subject) {
            log::info!("Skipping non-code commit: {}", subject);
            report.skipped += 1;
            git::bisect(session, ["skip"])?
        } else {
            let verdict = match run_suite(session) {
                Ok(()) => "good",
                Err(e) => {
                    log::info!("Suite failed on \"{}\": {}", subject, e);
                    "bad"
                }
            };
            report.tested += 1;
            session.cd(&target_path);
            git::reset_hard(session, "HEAD")?;
            git::bisect(session, [verdict])?
        };

        if !is_bisecting(&output) {
            report.completed = true;
            report.first_bad = first_bad_commit(&output);
            return Ok(());
        }
    }
}
