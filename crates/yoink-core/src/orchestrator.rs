//! Orchestrator (C7): wires the Locations Resolver, Plan Builder, and
//! Parallel Fetcher behind a small explicit state machine, and is the one
//! place that turns a `YoinkError` into a logged, exit-coded failure.

use std::path::PathBuf;

use crate::errors::YoinkResult;
use crate::fetcher::{self, FetchOutcome};
use crate::locations;
use crate::plan;
use crate::request::Request;
use crate::settings::ProfileLoader;

/// Where a run currently stands. `Fail` is reachable from every other
/// state; it is never entered explicitly, only observed after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    Resolve,
    Plan,
    Fetch,
    Done,
    Fail,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub retrieved: Vec<PathBuf>,
    pub total_tries: u32,
}

/// Run a request end to end. On success, returns every file retrieved. On
/// failure, the error has already been logged (debug-level detail, then an
/// error-level summary) before it's returned — callers only need to map it
/// to a process exit code.
pub fn run(request: &Request, profile_loader: &dyn ProfileLoader) -> YoinkResult<RunOutcome> {
    let mut state = State::Init;
    log::debug!("orchestrator: {state:?}");

    let result = run_states(request, profile_loader, &mut state);

    match &result {
        Ok(_) => log::debug!("orchestrator: {:?}", State::Done),
        Err(err) => {
            state = State::Fail;
            log::debug!("orchestrator: {state:?} ({err:?})");
            log::error!("{err}");
        }
    }

    result
}

fn run_states(
    request: &Request,
    profile_loader: &dyn ProfileLoader,
    state: &mut State,
) -> YoinkResult<RunOutcome> {
    request.validate()?;
    let settings = profile_loader.load(request.profile_name.as_deref())?;

    *state = State::Resolve;
    log::debug!("orchestrator: {state:?}");
    let files = locations::resolve(request, &settings)?;

    *state = State::Plan;
    log::debug!("orchestrator: {state:?}");
    let plan = plan::build_plan(&files, settings.threads_per_host);
    log::debug!("orchestrator: built {} bucket(s)", plan.len());

    *state = State::Fetch;
    log::debug!("orchestrator: {state:?}");
    let FetchOutcome {
        retrieved,
        total_tries,
    } = fetcher::fetch_plan(
        &plan,
        request.output_dir.clone(),
        request.dry_run,
        request.force_overwrite,
    )?;

    *state = State::Done;
    Ok(RunOutcome {
        retrieved,
        total_tries,
    })
}
