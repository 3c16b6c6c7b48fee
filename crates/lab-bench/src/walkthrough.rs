//! Scripted walkthrough of a guided simulation
//!
//! Activates each task in order, applies its scripted solution and records
//! what the guide showed. Tasks the script cannot solve are skipped so the
//! walkthrough always terminates.

use crate::solutions::{self, Solver};
use anyhow::Context;
use lab_explain::ExplanationCache;
use lab_guide::{script, GuideConfig, GuideScript, GuideSession, PanelLine};
use lab_speech::SpeechDelivery;
use lab_tasks::domain::{chemistry, optics, ChemistryStore, OpticsStore};
use lab_tasks::{Progress, SimulationStore, TaskId, TaskRunner};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Built-in simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Chemistry,
    Optics,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Chemistry, Domain::Optics];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chemistry => "chemistry",
            Self::Optics => "optics",
        }
    }

    /// Subject and topic sent with explanation requests
    #[must_use]
    pub fn subject(self) -> (&'static str, &'static str) {
        match self {
            Self::Chemistry => ("Chemistry", "Acids, Bases and Salts"),
            Self::Optics => ("Physics", "Light: Reflection and Refraction"),
        }
    }

    #[must_use]
    pub fn script(self) -> GuideScript {
        match self {
            Self::Chemistry => script::chemistry(),
            Self::Optics => script::optics(),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chemistry" | "chem" => Ok(Self::Chemistry),
            "optics" | "light" => Ok(Self::Optics),
            other => anyhow::bail!("unknown domain '{other}' (expected chemistry or optics)"),
        }
    }
}

/// Walkthrough switches
#[derive(Debug, Clone, Copy)]
pub struct WalkthroughOptions {
    /// Ask for an explanation after each activation
    pub explain: bool,
    /// Simulate the first user gesture before starting
    pub gesture: bool,
    /// Start muted
    pub muted: bool,
}

impl Default for WalkthroughOptions {
    fn default() -> Self {
        Self {
            explain: false,
            gesture: true,
            muted: false,
        }
    }
}

/// Outcome of one task
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub task_id: TaskId,
    pub title: String,
    /// Completed by its solution rather than skipped
    pub validated: bool,
    pub explanation: Option<String>,
    pub panel: Vec<String>,
}

/// Outcome of a walkthrough
#[derive(Debug, Clone, Serialize)]
pub struct WalkthroughReport {
    pub domain: Domain,
    pub steps: Vec<StepReport>,
    pub progress: Progress,
}

impl WalkthroughReport {
    /// Every task validated
    #[must_use]
    pub fn passed(&self) -> bool {
        self.progress.is_finished() && self.steps.iter().all(|s| s.validated)
    }

    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut out = format!("Walkthrough: {}\n", self.domain);
        for step in &self.steps {
            let mark = if step.validated { "done" } else { "skipped" };
            out.push_str(&format!("  [{mark}] {} {}\n", step.task_id, step.title));
            for line in &step.panel {
                out.push_str(&format!("      | {line}\n"));
            }
            if let Some(explanation) = &step.explanation {
                out.push_str(&format!("      ? {explanation}\n"));
            }
        }
        out.push_str(&format!("Progress: {}\n", self.progress));
        out
    }
}

/// Run a walkthrough of a built-in domain
///
/// # Errors
/// Fails only on task-layer errors; narration problems end up in the panel.
pub async fn run(
    domain: Domain,
    delivery: Arc<dyn SpeechDelivery>,
    explainer: Option<ExplanationCache>,
    config: &GuideConfig,
    options: WalkthroughOptions,
) -> anyhow::Result<WalkthroughReport> {
    let config = config.clone().with_muted(options.muted || config.start_muted);
    let (steps, progress) = match domain {
        Domain::Chemistry => {
            let runner = TaskRunner::new(ChemistryStore::new(), chemistry::task_list()?);
            let session = session(runner, domain, delivery, explainer, &config);
            drive(session, solutions::chemistry, options).await?
        }
        Domain::Optics => {
            let runner = TaskRunner::new(OpticsStore::new(), optics::task_list()?);
            let session = session(runner, domain, delivery, explainer, &config);
            drive(session, solutions::optics, options).await?
        }
    };
    Ok(WalkthroughReport {
        domain,
        steps,
        progress,
    })
}

fn session<S: SimulationStore>(
    runner: TaskRunner<S>,
    domain: Domain,
    delivery: Arc<dyn SpeechDelivery>,
    explainer: Option<ExplanationCache>,
    config: &GuideConfig,
) -> GuideSession<S> {
    let session = GuideSession::new(runner, domain.script(), delivery, config);
    match explainer {
        Some(cache) => session.with_explainer(cache),
        None => session,
    }
}

/// Drive a session through every task with `solve`
///
/// # Errors
/// Fails on task-layer errors.
pub async fn drive<S: SimulationStore>(
    mut session: GuideSession<S>,
    solve: Solver<S>,
    options: WalkthroughOptions,
) -> anyhow::Result<(Vec<StepReport>, Progress)> {
    if options.gesture {
        session.user_gesture().await;
    }

    let mut steps = Vec::new();
    loop {
        let shown_before = session.transcript().len();
        let Some(id) = session.activate_next().await? else {
            break;
        };
        let title = session
            .runner()
            .active_task()
            .map(|t| t.title.clone())
            .unwrap_or_default();
        tracing::info!(task = %id, %title, "working on task");

        let explanation = if options.explain && session.explain().await {
            session.panel().map(|line| line.text.clone())
        } else {
            None
        };
        session.settle().await;

        let validated = session
            .update(|s| solve(&id, s))
            .await
            .with_context(|| format!("applying solution for {id}"))?;
        if !validated {
            tracing::warn!(task = %id, "solution did not complete the task, skipping");
            session.skip().await?;
        }
        session.settle().await;

        let panel = session.transcript()[shown_before..]
            .iter()
            .map(|PanelLine { text, .. }| text.clone())
            .collect();
        steps.push(StepReport {
            task_id: id,
            title,
            validated,
            explanation,
            panel,
        });
    }
    Ok((steps, session.runner().progress()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_parses_aliases() {
        assert_eq!("Chemistry".parse::<Domain>().unwrap(), Domain::Chemistry);
        assert_eq!("light".parse::<Domain>().unwrap(), Domain::Optics);
        assert!("biology".parse::<Domain>().is_err());
    }

    #[test]
    fn scripts_cover_every_task() {
        let chem = Domain::Chemistry.script();
        for task in chemistry::tasks() {
            assert!(chem.get(&task.id).is_some(), "chemistry {} unscripted", task.id);
        }
        let opt = Domain::Optics.script();
        for task in optics::tasks() {
            assert!(opt.get(&task.id).is_some(), "optics {} unscripted", task.id);
        }
    }
}
