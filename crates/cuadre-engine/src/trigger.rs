//! Depletion trigger: finds tranches whose stock has crossed the
//! threshold and asks the workflow to generate settlements for them.
//!
//! The periodic sweep is cooperative and never overlaps itself: an atomic
//! in-progress flag turns a concurrent sweep request into an immediate
//! `SweepInProgress` rejection. The sweep only reads state and forwards
//! candidates to the workflow, which re-enforces every invariant under its
//! own write guard.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cuadre_types::{CuadreError, Result, Settlement, SettlementId, TrancheId, TrancheState};

use crate::ports::StockFeed;
use crate::workflow::SettlementWorkflow;

/// Outcome of one depletion sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Settlements generated this sweep.
    pub generated: Vec<SettlementId>,
    /// Candidates that failed generation, with the rejection.
    pub skipped: Vec<(TrancheId, CuadreError)>,
}

/// Scans sales readings for depletion threshold crossings.
pub struct TriggerDetector {
    workflow: Arc<SettlementWorkflow>,
    stock: Arc<dyn StockFeed>,
    sweeping: AtomicBool,
}

impl TriggerDetector {
    #[must_use]
    pub fn new(workflow: Arc<SettlementWorkflow>, stock: Arc<dyn StockFeed>) -> Self {
        Self {
            workflow,
            stock,
            sweeping: AtomicBool::new(false),
        }
    }

    /// Tranches at or below the depletion threshold that are Released and
    /// have no open settlement.
    #[must_use]
    pub fn detect_eligible(&self) -> Vec<TrancheId> {
        let threshold = self.workflow.config().depletion_threshold;
        self.stock
            .list_below(threshold)
            .into_iter()
            .filter(|&id| {
                self.workflow
                    .tranche(id)
                    .is_ok_and(|t| t.state == TrancheState::Released)
            })
            .collect()
    }

    /// Generate a settlement for one tranche (delegates to the workflow).
    pub fn generate(&self, tranche_id: TrancheId, force: bool) -> Result<Settlement> {
        self.workflow.create(tranche_id, force)
    }

    /// Run one sweep: detect candidates and generate for each.
    ///
    /// Per-candidate failures are collected in the report, never abort the
    /// sweep.
    ///
    /// # Errors
    /// [`CuadreError::SweepInProgress`] if another sweep is running.
    pub fn sweep(&self) -> Result<SweepReport> {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(CuadreError::SweepInProgress);
        }

        let mut report = SweepReport::default();
        for tranche_id in self.detect_eligible() {
            match self.workflow.create(tranche_id, false) {
                Ok(settlement) => report.generated.push(settlement.id),
                Err(err) => {
                    tracing::warn!(tranche = %tranche_id, %err, "sweep candidate skipped");
                    report.skipped.push((tranche_id, err));
                }
            }
        }
        tracing::info!(
            generated = report.generated.len(),
            skipped = report.skipped.len(),
            "depletion sweep finished"
        );

        self.sweeping.store(false, Ordering::Release);
        Ok(report)
    }
}
