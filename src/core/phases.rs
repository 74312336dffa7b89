// src/core/phases.rs

use crate::{
    models::{ErrorRecord, LogCategory, PhaseRank},
    state::ExecutionContext,
};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhaseError {
    #[error("Phase '{phase}' failed validation: {}", summarize(.errors))]
    Validation {
        rank: PhaseRank,
        phase: &'static str,
        errors: Vec<ErrorRecord>,
    },
    #[error("Phase '{phase}' could not be reached: {reason}")]
    Failed {
        rank: PhaseRank,
        phase: &'static str,
        reason: String,
    },
    #[error("Phase '{phase}' cannot be reached before phase '{previous}'.")]
    OutOfOrder {
        rank: PhaseRank,
        phase: &'static str,
        previous: &'static str,
    },
    #[error("Execution already completed; phase '{phase}' will not be elevated.")]
    AlreadyCompleted { rank: PhaseRank, phase: &'static str },
    #[error("No phase with rank {0} exists in the catalog.")]
    UnknownRank(PhaseRank),
}

impl PhaseError {
    /// The rank of the phase that could not be reached.
    pub fn rank(&self) -> PhaseRank {
        match self {
            Self::Validation { rank, .. }
            | Self::Failed { rank, .. }
            | Self::OutOfOrder { rank, .. }
            | Self::AlreadyCompleted { rank, .. } => *rank,
            Self::UnknownRank(rank) => *rank,
        }
    }
}

fn summarize(errors: &[ErrorRecord]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("A phase catalog needs at least one phase.")]
    Empty,
    #[error("Phase '{name}' has rank {rank}, which does not follow rank {previous}.")]
    RankOrder {
        name: &'static str,
        rank: PhaseRank,
        previous: PhaseRank,
    },
    #[error("Phase name '{0}' is declared twice.")]
    DuplicateName(&'static str),
}

/// The external work behind one phase.
///
/// The catalog makes elevation idempotent, so implementations never need to
/// guard against being asked for a phase twice.
pub trait Elevate: fmt::Debug {
    /// Reports why this phase could not be reached from the context as it is
    /// now. Must not mutate anything; the resolver calls it speculatively.
    fn validate(&self, _ctx: &ExecutionContext) -> Vec<ErrorRecord> {
        Vec::new()
    }

    /// Performs the phase's work.
    fn elevate(&self, ctx: &mut ExecutionContext) -> anyhow::Result<()>;

    /// Cleanup for a run that terminated while this phase was being elevated.
    fn abort(&self, _ctx: &mut ExecutionContext) {}
}

#[derive(Debug)]
pub struct PhaseDescriptor {
    rank: PhaseRank,
    name: &'static str,
    operation: Box<dyn Elevate>,
}

impl PhaseDescriptor {
    pub fn new(rank: PhaseRank, name: &'static str, operation: impl Elevate + 'static) -> Self {
        Self {
            rank,
            name,
            operation: Box::new(operation),
        }
    }

    pub fn rank(&self) -> PhaseRank {
        self.rank
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The fixed, strictly ascending list of phases a run can climb through.
#[derive(Debug)]
pub struct PhaseCatalog {
    phases: Vec<PhaseDescriptor>,
}

impl PhaseCatalog {
    pub fn new(phases: Vec<PhaseDescriptor>) -> Result<Self, CatalogError> {
        if phases.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut names = HashSet::new();
        let mut previous: Option<PhaseRank> = None;
        for phase in &phases {
            if let Some(previous) = previous {
                if phase.rank <= previous {
                    return Err(CatalogError::RankOrder {
                        name: phase.name,
                        rank: phase.rank,
                        previous,
                    });
                }
            }
            if !names.insert(phase.name) {
                return Err(CatalogError::DuplicateName(phase.name));
            }
            previous = Some(phase.rank);
        }

        Ok(Self { phases })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhaseDescriptor> {
        self.phases.iter()
    }

    pub fn get(&self, rank: PhaseRank) -> Option<&PhaseDescriptor> {
        self.phases.iter().find(|phase| phase.rank == rank)
    }

    pub fn name_of(&self, rank: PhaseRank) -> &'static str {
        self.get(rank).map_or("unknown", |phase| phase.name)
    }

    /// The descriptor ranked right below `rank`, if any.
    fn predecessor(&self, rank: PhaseRank) -> Option<&PhaseDescriptor> {
        self.phases.iter().take_while(|phase| phase.rank < rank).last()
    }

    /// Elevates the context to `rank`.
    ///
    /// A phase that was already reached is a no-op. Otherwise the phase is
    /// validated, marked as in progress, and its operation runs; the context
    /// only records the new phase once the operation succeeded.
    pub fn elevate(&self, ctx: &mut ExecutionContext, rank: PhaseRank) -> Result<(), PhaseError> {
        let descriptor = self.get(rank).ok_or(PhaseError::UnknownRank(rank))?;
        let phase = descriptor.name;

        // 1. Already there: nothing to do.
        if ctx.has_reached(rank) {
            log::trace!("Phase '{}' already reached, nothing to do.", phase);
            return Ok(());
        }
        // 2. Refuse after completion, or when the phase below was never reached.
        if ctx.is_completed() {
            return Err(PhaseError::AlreadyCompleted { rank, phase });
        }
        if let Some(previous) = self.predecessor(rank) {
            if !ctx.has_reached(previous.rank) {
                return Err(PhaseError::OutOfOrder {
                    rank,
                    phase,
                    previous: previous.name,
                });
            }
        }

        // 3. Validate before touching anything.
        let errors = descriptor.operation.validate(ctx);
        if !errors.is_empty() {
            ctx.log(
                format!(t!("log.phase_invalid"), phase = phase),
                LogCategory::Bootstrap,
            );
            return Err(PhaseError::Validation {
                rank,
                phase,
                errors,
            });
        }

        // 4. Run the operation with the in-progress mark set, so an abrupt
        //    end can be unwound by the finalizer.
        ctx.begin_bootstrap(rank);
        ctx.log(
            format!(t!("log.phase_start"), phase = phase),
            LogCategory::Bootstrap,
        );

        match descriptor.operation.elevate(ctx) {
            Ok(()) => {
                ctx.end_bootstrap(true);
                ctx.log(
                    format!(t!("log.phase_reached"), phase = phase),
                    LogCategory::Bootstrap,
                );
                Ok(())
            }
            Err(e) => {
                ctx.end_bootstrap(false);
                Err(PhaseError::Failed {
                    rank,
                    phase,
                    reason: format!("{:#}", e),
                })
            }
        }
    }

    /// Validates, in rank order, every phase above `reached` up to and
    /// including `required`. Stops at the first phase that reports errors.
    pub fn validate_between(
        &self,
        ctx: &ExecutionContext,
        reached: PhaseRank,
        required: PhaseRank,
    ) -> Vec<ErrorRecord> {
        self.phases
            .iter()
            .filter(|phase| phase.rank > reached && phase.rank <= required)
            .map(|phase| phase.operation.validate(ctx))
            .find(|errors| !errors.is_empty())
            .unwrap_or_default()
    }

    /// Runs the abort hook of the phase at `rank`, if it exists.
    pub fn abort(&self, ctx: &mut ExecutionContext, rank: PhaseRank) {
        if let Some(descriptor) = self.get(rank) {
            descriptor.operation.abort(ctx);
        }
    }
}
