//! Issue and expiry date checks for the documents entered in the registration form.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::eligibility::EligibilityFlags;
use crate::gate::LoadGate;
use crate::model::DocumentDraft;

const FUMIGACION_MONTHS: u32 = 6;
const TERMOKING_MONTHS: u32 = 6;
const LIMPIEZA_MONTHS: u32 = 1;

const FUMIGACION_TOO_OLD: &str = "Fumigación: la fecha de emisión no puede superar 6 meses.";
const REVISION_EXPIRED: &str = "Revisión técnica: la fecha de vencimiento debe estar vigente.";
const TERMOKING_TOO_OLD: &str =
    "Termoking: la fecha de emisión no puede tener una antigüedad mayor a 6 meses.";
const LIMPIEZA_TOO_OLD: &str =
    "Limpieza y desinfección: la fecha de emisión no puede superar 1 mes.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Ordered list of violated date rules.
pub struct ValidityReport {
    violations: Vec<String>,
}

impl ValidityReport {
    /// Whether every applicable rule holds.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable violations, in check order.
    #[must_use]
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    /// Take the violations out of the report.
    #[must_use]
    pub fn into_violations(self) -> Vec<String> {
        self.violations
    }
}

/// Whether `date` is no older than `months` calendar months before `today`.
///
/// The floor keeps the day of month of `today`; when the target month is
/// shorter, the extra days roll over into the following month (31 Aug minus
/// 6 months is 2 Mar in a leap year).
#[must_use]
pub fn within_last_months(date: NaiveDate, months: u32, today: NaiveDate) -> bool {
    months_before(today, months).is_some_and(|floor| date >= floor)
}

fn months_before(today: NaiveDate, months: u32) -> Option<NaiveDate> {
    today
        .with_day(1)?
        .checked_sub_months(Months::new(months))?
        .checked_add_days(Days::new(u64::from(today.day0())))
}

/// Check the drafted document dates against `today`.
///
/// Only sections enabled by `flags` are checked, except the technical review
/// which always is. Missing dates never produce a violation.
#[must_use]
pub fn validate(draft: &DocumentDraft, flags: &EligibilityFlags, today: NaiveDate) -> ValidityReport {
    let mut violations = Vec::new();

    if flags.fumigacion
        && let Some(date) = draft.fumigacion.date
        && !within_last_months(date, FUMIGACION_MONTHS, today)
    {
        violations.push(FUMIGACION_TOO_OLD.to_owned());
    }

    if let Some(date) = draft.revision_tecnica.date
        && date < today
    {
        violations.push(REVISION_EXPIRED.to_owned());
    }

    if flags.termoking
        && let Some(date) = draft.termoking.date
        && !within_last_months(date, TERMOKING_MONTHS, today)
    {
        violations.push(TERMOKING_TOO_OLD.to_owned());
    }

    if flags.limpieza
        && let Some(date) = draft.limpieza.date
        && !within_last_months(date, LIMPIEZA_MONTHS, today)
    {
        violations.push(LIMPIEZA_TOO_OLD.to_owned());
    }

    ValidityReport { violations }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WatchedInputs {
    fumigacion: Option<NaiveDate>,
    revision_tecnica: Option<NaiveDate>,
    termoking: Option<NaiveDate>,
    limpieza: Option<NaiveDate>,
    flags: (bool, bool, bool),
    today: NaiveDate,
}

impl WatchedInputs {
    fn capture(draft: &DocumentDraft, flags: &EligibilityFlags, today: NaiveDate) -> Self {
        Self {
            fumigacion: draft.fumigacion.date,
            revision_tecnica: draft.revision_tecnica.date,
            termoking: draft.termoking.date,
            limpieza: draft.limpieza.date,
            flags: (flags.fumigacion, flags.termoking, flags.limpieza),
            today,
        }
    }
}

type Listener = Box<dyn FnMut(bool, &[String]) + Send>;

/// Re-validates the draft whenever a watched date or flag changes and pushes
/// the outcome to a listener, so the save action can be gated.
pub struct ValidityMonitor {
    gate: LoadGate<WatchedInputs>,
    report: ValidityReport,
    listener: Option<Listener>,
}

impl Default for ValidityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidityMonitor {
    /// Monitor without a listener.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gate: LoadGate::new(),
            report: ValidityReport::default(),
            listener: None,
        }
    }

    /// Monitor notifying `listener` with `(ok, violations)` after each re-validation.
    #[must_use]
    pub fn with_listener<F>(listener: F) -> Self
    where
        F: FnMut(bool, &[String]) + Send + 'static,
    {
        Self {
            listener: Some(Box::new(listener)),
            ..Self::new()
        }
    }

    /// Re-validate if any watched input changed since the last call.
    pub fn observe(
        &mut self,
        draft: &DocumentDraft,
        flags: &EligibilityFlags,
        today: NaiveDate,
    ) -> &ValidityReport {
        if self
            .gate
            .enter(WatchedInputs::capture(draft, flags, today))
        {
            self.report = validate(draft, flags, today);
            if let Some(listener) = self.listener.as_mut() {
                listener(self.report.is_ok(), self.report.violations());
            }
        }
        &self.report
    }

    /// Latest report.
    #[must_use]
    pub fn report(&self) -> &ValidityReport {
        &self.report
    }

    /// Forget the watched inputs and clear the report, as on a form reset.
    pub fn reset(&mut self) {
        self.gate.reset();
        self.report = ValidityReport::default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::model::DatedDocument;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    fn all_flags() -> EligibilityFlags {
        EligibilityFlags {
            res_bonificacion: true,
            termoking: true,
            sanipes: true,
            fumigacion: true,
            limpieza: true,
        }
    }

    fn dated(value: NaiveDate) -> DatedDocument {
        DatedDocument {
            date: Some(value),
            file: None,
        }
    }

    #[test]
    fn six_month_window_is_inclusive() {
        let today = date(2024, 8, 15);
        assert!(within_last_months(date(2024, 2, 15), 6, today));
        assert!(!within_last_months(date(2024, 2, 14), 6, today));
    }

    #[test]
    fn window_uses_calendar_months_not_day_counts() {
        let today = date(2024, 3, 31);
        // February has no 31st: the floor rolls over to Mar 2.
        assert!(within_last_months(date(2024, 3, 2), 1, today));
        assert!(!within_last_months(date(2024, 3, 1), 1, today));
        assert!(!within_last_months(date(2024, 2, 29), 1, today));
        assert!(within_last_months(date(2023, 10, 1), 6, today));
        assert!(!within_last_months(date(2023, 9, 30), 6, today));
    }

    #[test]
    fn month_end_floors_roll_into_the_next_month() {
        let termoking = DocumentDraft {
            termoking: dated(date(2024, 3, 1)),
            ..DocumentDraft::default()
        };
        let flags = EligibilityFlags {
            termoking: true,
            ..EligibilityFlags::default()
        };
        let report = validate(&termoking, &flags, date(2024, 8, 31));
        assert_eq!(report.violations(), [TERMOKING_TOO_OLD]);

        let limpieza = DocumentDraft {
            limpieza: dated(date(2024, 2, 29)),
            ..DocumentDraft::default()
        };
        let flags = EligibilityFlags {
            limpieza: true,
            ..EligibilityFlags::default()
        };
        let report = validate(&limpieza, &flags, date(2024, 3, 31));
        assert_eq!(report.violations(), [LIMPIEZA_TOO_OLD]);

        let on_floor = DocumentDraft {
            limpieza: dated(date(2024, 3, 2)),
            ..DocumentDraft::default()
        };
        assert!(validate(&on_floor, &flags, date(2024, 3, 31)).is_ok());
    }

    #[test]
    fn boundary_day_for_termoking_and_fumigation() {
        let today = date(2024, 8, 15);
        let mut draft = DocumentDraft {
            termoking: dated(date(2024, 2, 15)),
            fumigacion: dated(date(2024, 2, 15)),
            ..DocumentDraft::default()
        };
        assert!(validate(&draft, &all_flags(), today).is_ok());

        draft.termoking = dated(date(2024, 2, 14));
        draft.fumigacion = dated(date(2024, 2, 14));
        let report = validate(&draft, &all_flags(), today);
        assert_eq!(report.violations(), [FUMIGACION_TOO_OLD, TERMOKING_TOO_OLD]);
    }

    #[test]
    fn violations_come_in_check_order() {
        let today = date(2024, 8, 15);
        let draft = DocumentDraft {
            fumigacion: dated(date(2023, 1, 1)),
            termoking: dated(date(2023, 1, 1)),
            limpieza: dated(date(2024, 7, 14)),
            revision_tecnica: crate::model::DatedTextDocument {
                date: Some(date(2024, 8, 14)),
                ..Default::default()
            },
            ..DocumentDraft::default()
        };

        let first = validate(&draft, &all_flags(), today);
        let second = validate(&draft, &all_flags(), today);

        assert_eq!(
            first.violations(),
            [FUMIGACION_TOO_OLD, REVISION_EXPIRED, TERMOKING_TOO_OLD, LIMPIEZA_TOO_OLD]
        );
        assert_eq!(first, second);
    }

    #[test]
    fn disabled_sections_and_missing_dates_pass() {
        let today = date(2024, 8, 15);
        let stale = DocumentDraft {
            fumigacion: dated(date(2020, 1, 1)),
            termoking: dated(date(2020, 1, 1)),
            limpieza: dated(date(2020, 1, 1)),
            ..DocumentDraft::default()
        };
        assert!(validate(&stale, &EligibilityFlags::default(), today).is_ok());
        assert!(validate(&DocumentDraft::default(), &all_flags(), today).is_ok());
    }

    #[test]
    fn technical_review_is_checked_without_flags() {
        let today = date(2024, 8, 15);
        let mut draft = DocumentDraft::default();
        draft.revision_tecnica.date = Some(today);
        assert!(validate(&draft, &EligibilityFlags::default(), today).is_ok());

        draft.revision_tecnica.date = Some(date(2024, 8, 14));
        let report = validate(&draft, &EligibilityFlags::default(), today);
        assert_eq!(report.violations(), [REVISION_EXPIRED]);
    }

    #[test]
    fn monitor_notifies_only_when_inputs_change() {
        let today = date(2024, 8, 15);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut monitor = ValidityMonitor::with_listener(move |ok, violations: &[String]| {
            sink.lock().expect("listener lock").push((ok, violations.len()));
        });

        let mut draft = DocumentDraft::default();
        monitor.observe(&draft, &all_flags(), today);
        monitor.observe(&draft, &all_flags(), today);

        draft.limpieza = dated(date(2024, 1, 1));
        assert!(!monitor.observe(&draft, &all_flags(), today).is_ok());

        // Unwatched input: the file does not trigger a re-run.
        draft.limpieza.file = Some(crate::model::Attachment::new("l.pdf", Vec::new()));
        monitor.observe(&draft, &all_flags(), today);

        assert_eq!(*seen.lock().expect("listener lock"), [(true, 0), (false, 1)]);
    }
}
