//! Two-phase check-in / check-out picker.

use chrono::NaiveDate;
use thiserror::Error;

use super::conflict::ConflictSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    AwaitingCheckIn,
    AwaitingCheckOut,
    /// Both dates are set and the picker is closed.
    RangeSelected,
}

/// Why a picked date was refused. The selection is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{0} is already booked")]
    Blocked(NaiveDate),

    #[error("check-out date must be after check-in date ({candidate} is not after {check_in})")]
    NotAfterCheckIn {
        check_in: NaiveDate,
        candidate: NaiveDate,
    },

    #[error("select a check-in date first")]
    NoCheckIn,
}

/// What an accepted pick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    CheckInSet(NaiveDate),
    RangeSelected {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRangeSelector {
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    phase: Phase,
}

impl DateRangeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check_in(&self) -> Option<NaiveDate> {
        self.check_in
    }

    pub fn check_out(&self) -> Option<NaiveDate> {
        self.check_out
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_picker_open(&self) -> bool {
        self.phase != Phase::RangeSelected
    }

    /// Both dates, once a full range has been accepted.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.check_in.zip(self.check_out)
    }

    /// "Change check-in": start over, dropping any check-out.
    pub fn begin_check_in(&mut self) {
        self.check_out = None;
        self.phase = Phase::AwaitingCheckIn;
    }

    /// "Change check-out": keep the check-in and pick a new end date.
    pub fn begin_check_out(&mut self) -> Result<(), Rejection> {
        if self.check_in.is_none() {
            return Err(Rejection::NoCheckIn);
        }
        self.phase = Phase::AwaitingCheckOut;
        Ok(())
    }

    /// Forget everything, e.g. after a successful reservation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Feed one picked date into the state machine.
    pub fn select(
        &mut self,
        date: NaiveDate,
        conflicts: &ConflictSet,
    ) -> Result<SelectionOutcome, Rejection> {
        match (self.phase, self.check_in) {
            (Phase::AwaitingCheckOut, Some(check_in)) => {
                if date <= check_in {
                    return Err(Rejection::NotAfterCheckIn {
                        check_in,
                        candidate: date,
                    });
                }
                if conflicts.is_blocked(date) {
                    return Err(Rejection::Blocked(date));
                }
                self.check_out = Some(date);
                self.phase = Phase::RangeSelected;
                Ok(SelectionOutcome::RangeSelected {
                    check_in,
                    check_out: date,
                })
            }
            _ => {
                if conflicts.is_blocked(date) {
                    return Err(Rejection::Blocked(date));
                }
                self.check_in = Some(date);
                self.check_out = None;
                self.phase = Phase::AwaitingCheckOut;
                Ok(SelectionOutcome::CheckInSet(date))
            }
        }
    }
}
