//! # Backend Parity Tests
//!
//! The same operation sequence must leave the in-memory and redb backends
//! in observably identical states. Domain rules live above the storage
//! seam, so any divergence here is a storage bug.

use chrono::NaiveDate;
use plotledger_core::{
    CaseStatus, InstallmentSpec, Ledger, LedgerStore, Milestone, Money, NewPlot, Operations,
    PlotStatus, RedbLedger,
};
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Register a plot, schedule it, pay to 50%, sweep past grace, work the
/// resulting case, and return the observable summary.
fn run_scenario<L: LedgerStore>(store: &mut L) -> (u8, Milestone, PlotStatus, usize, usize) {
    let plot = Operations::register_plot(
        store,
        NewPlot {
            plot_number: "HG-3-007".to_string(),
            area: "1 kanal".to_string(),
            location: "Phase 3, Block B".to_string(),
            total_value: Money::new(2_000_000),
        },
        date(2024, 1, 1),
    )
    .expect("register");

    let specs: Vec<InstallmentSpec> = (1..=4)
        .map(|n| InstallmentSpec {
            amount: Money::new(450_000),
            due_date: date(2024, n + 1, 1),
        })
        .collect();
    let (_, installments) = Operations::create_schedule(
        store,
        plot.id,
        Money::new(2_000_000),
        Money::new(200_000),
        &specs,
        date(2024, 1, 1),
    )
    .expect("schedule");

    // Down payment + first installment: 650k of 2M -> 33%
    Operations::record_payment(store, installments[0].id, date(2024, 1, 1), None).expect("pay");
    Operations::record_payment(store, installments[1].id, date(2024, 2, 1), None).expect("pay");
    // Second installment crosses 50%
    let outcome =
        Operations::record_payment(store, installments[2].id, date(2024, 3, 1), None)
            .expect("pay");
    assert_eq!(outcome.milestone_reached, Some(Milestone::Allocation));

    // Installment 4 (due 2024-04-01) defaults past its grace period
    let sweep = Operations::sweep_overdue(store, date(2024, 6, 1)).expect("sweep");
    assert_eq!(sweep.cases_opened.len(), 2);

    // Work the first case forward
    let case_id = sweep.cases_opened[0].1;
    Operations::update_case(store, case_id, CaseStatus::Filed, None, None, date(2024, 6, 5))
        .expect("file");

    let progress = Operations::progress_for_plot(store, plot.id).expect("progress");
    let plot = store.plot(plot.id).expect("lookup").expect("plot");
    (
        progress.percentage,
        progress.milestone,
        plot.status,
        store.open_case_count().expect("count"),
        store.audit(1000).expect("audit").len(),
    )
}

#[test]
fn in_memory_and_redb_agree() {
    let mut memory = Ledger::new();
    let memory_summary = run_scenario(&mut memory);

    let temp = tempdir().expect("temp dir");
    let mut redb = RedbLedger::open(temp.path().join("parity.redb")).expect("open");
    let redb_summary = run_scenario(&mut redb);

    assert_eq!(memory_summary, redb_summary);
    assert_eq!(memory_summary.0, 55); // 650k + 450k of 2M
    assert_eq!(memory_summary.1, Milestone::Allocation);
    assert_eq!(memory_summary.2, PlotStatus::OnHold);
}

#[test]
fn redb_state_survives_reopen_mid_scenario() {
    let temp = tempdir().expect("temp dir");
    let path = temp.path().join("ledger.redb");

    let (plot_id, installment_id);
    {
        let mut store = RedbLedger::open(&path).expect("open");
        let plot = Operations::register_plot(
            &mut store,
            NewPlot {
                plot_number: "HG-3-001".to_string(),
                area: "5 marla".to_string(),
                location: "Phase 3".to_string(),
                total_value: Money::new(1_000_000),
            },
            date(2024, 1, 1),
        )
        .expect("register");
        let (_, installments) = Operations::create_schedule(
            &mut store,
            plot.id,
            Money::new(1_000_000),
            Money::ZERO,
            &[
                InstallmentSpec {
                    amount: Money::new(100_000),
                    due_date: date(2024, 2, 1),
                },
                InstallmentSpec {
                    amount: Money::new(900_000),
                    due_date: date(2024, 3, 1),
                },
            ],
            date(2024, 1, 1),
        )
        .expect("schedule");
        plot_id = plot.id;
        installment_id = installments[0].id;
    }

    {
        let mut store = RedbLedger::open(&path).expect("reopen");
        let outcome =
            Operations::record_payment(&mut store, installment_id, date(2024, 2, 1), None)
                .expect("pay");
        assert_eq!(outcome.milestone_reached, Some(Milestone::Allotment));
        let progress = Operations::progress_for_plot(&store, plot_id).expect("progress");
        assert_eq!(progress.percentage, 10);
    }
}
