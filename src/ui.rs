// ============================================================================
// src/ui.rs – Terminal reporting for command outcomes
// ============================================================================

use console::Style;

use crate::command::{CommandState, Report, StepReport};

/// Human-facing output. Errors always print; the rest honours `quiet`.
#[derive(Debug, Clone)]
pub struct UX {
    pub quiet: bool,
}

impl UX {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", Style::new().cyan().bold().apply_to("▸"), msg);
        }
    }

    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{} {}", Style::new().green().bold().apply_to("✔"), msg);
        }
    }

    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{} {}", Style::new().yellow().bold().apply_to("!"), msg);
        }
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{} {}", Style::new().red().bold().apply_to("✘"), msg);
    }

    /// Render a finished command: every step, then a verdict that separates
    /// a failed forward step from a failed compensating step.
    pub fn report(&self, report: &Report) {
        for step in &report.steps {
            self.step_line(step);
        }

        match report.state {
            CommandState::Completed => {
                self.success(&format!("{} completed.", report.kind));
            }
            _ => {
                if let Some((step, err)) = report.failed_step() {
                    self.error(&format!(
                        "{} failed at step {} ({}): {} [{}]",
                        report.kind,
                        step.index + 1,
                        step.name,
                        err,
                        err.category().label()
                    ));
                }
                let residual = report.rollback_failures();
                if residual.is_empty() {
                    if report.nothing_to_undo() {
                        self.warn("No step had completed; nothing to roll back.");
                    } else {
                        self.warn(&format!(
                            "Rolled back {} step(s); system restored.",
                            report.unwound.len()
                        ));
                    }
                } else {
                    for (step, err) in residual {
                        self.error(&format!(
                            "ROLLBACK FAILED for step {} ({}): {} – manual cleanup required: {}",
                            step.index + 1,
                            step.name,
                            err,
                            step.description
                        ));
                    }
                }
            }
        }
    }

    fn step_line(&self, step: &StepReport) {
        if self.quiet {
            return;
        }
        let (mark, style) = match (&step.result, &step.rollback) {
            (None, _) => ("·", Style::new().dim()),
            (Some(r), _) if !r.is_ok() => ("✘", Style::new().red()),
            (Some(_), Some(rb)) if rb.is_ok() => ("↶", Style::new().yellow()),
            (Some(_), Some(_)) => ("‼", Style::new().red().bold()),
            (Some(_), None) => ("✔", Style::new().green()),
        };
        println!(
            "  {} {:>2}. {}",
            style.apply_to(mark),
            step.index + 1,
            step.description
        );
    }
}
