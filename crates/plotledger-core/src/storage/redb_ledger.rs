//! # redb-backed Ledger Storage
//!
//! A disk-backed ledger store using the redb embedded database, providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//! - Zero configuration
//!
//! ## Integration with Session
//!
//! This module provides `RedbLedger` which can be used as a persistent
//! storage backend for PlotLedger sessions. Unlike the in-memory `Ledger`,
//! `RedbLedger` persists every record to disk automatically.

use crate::audit::{AuditAction, AuditEntry};
use crate::documents::DocumentKind;
use crate::ledger::LedgerStore;
use crate::limits::MAX_AUDIT_QUERY;
use crate::types::{
    CaseId, CaseStatus, DocumentId, DocumentStatus, InstallmentId, LedgerError, LegalCase,
    MilestoneDocument, Money, NewPlot, PaymentInstallment, PaymentSchedule, PaymentStatus, Plot,
    PlotId, PlotStatus, ScheduleId,
};
use chrono::NaiveDate;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;

/// Table for plots: PlotId(u64) -> serialized Plot bytes
const PLOTS: TableDefinition<u64, &[u8]> = TableDefinition::new("plots");

/// Table for schedules: ScheduleId(u64) -> serialized PaymentSchedule bytes
const SCHEDULES: TableDefinition<u64, &[u8]> = TableDefinition::new("schedules");

/// Table for the plot -> schedule index: PlotId(u64) -> ScheduleId(u64)
const PLOT_INDEX: TableDefinition<u64, u64> = TableDefinition::new("plot_index");

/// Table for installments: InstallmentId(u64) -> serialized bytes
const INSTALLMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("installments");

/// Table for documents: DocumentId(u64) -> serialized bytes
const DOCUMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("documents");

/// Table for cases: CaseId(u64) -> serialized bytes
const CASES: TableDefinition<u64, &[u8]> = TableDefinition::new("cases");

/// Table for the audit log: seq(u64) -> serialized AuditEntry bytes
const AUDIT: TableDefinition<u64, &[u8]> = TableDefinition::new("audit");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

fn io_err(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::IoError(e.to_string())
}

fn ser_err(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::SerializationError(e.to_string())
}

/// Monotonic id counters, persisted in the METADATA table.
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    plot: u64,
    schedule: u64,
    installment: u64,
    document: u64,
    case_: u64,
    audit: u64,
}

/// A disk-backed ledger store using redb.
///
/// Maintains an in-memory plot -> schedule index for fast lookups,
/// rebuilt from the PLOT_INDEX table on open.
pub struct RedbLedger {
    /// The redb database handle.
    db: Database,
    /// In-memory cache of the plot -> schedule mapping.
    schedule_cache: BTreeMap<PlotId, ScheduleId>,
    /// Next available record ids.
    counters: Counters,
}

impl std::fmt::Debug for RedbLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbLedger")
            .field("schedule_cache_size", &self.schedule_cache.len())
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

impl RedbLedger {
    /// Open or create a ledger database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(PLOTS).map_err(io_err)?;
            let _ = write_txn.open_table(SCHEDULES).map_err(io_err)?;
            let _ = write_txn.open_table(PLOT_INDEX).map_err(io_err)?;
            let _ = write_txn.open_table(INSTALLMENTS).map_err(io_err)?;
            let _ = write_txn.open_table(DOCUMENTS).map_err(io_err)?;
            let _ = write_txn.open_table(CASES).map_err(io_err)?;
            let _ = write_txn.open_table(AUDIT).map_err(io_err)?;
            let _ = write_txn.open_table(METADATA).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        let read_txn = db.begin_read().map_err(io_err)?;

        let counters = {
            let table = read_txn.open_table(METADATA).map_err(io_err)?;
            let load = |key: &str| -> Result<u64, LedgerError> {
                Ok(table.get(key).map_err(io_err)?.map_or(0, |v| v.value()))
            };
            Counters {
                plot: load("next_plot_id")?,
                schedule: load("next_schedule_id")?,
                installment: load("next_installment_id")?,
                document: load("next_document_id")?,
                case_: load("next_case_id")?,
                audit: load("next_audit_seq")?,
            }
        };

        let schedule_cache = {
            let table = read_txn.open_table(PLOT_INDEX).map_err(io_err)?;
            let mut cache = BTreeMap::new();
            for entry in table.iter().map_err(io_err)? {
                let (key, value) = entry.map_err(io_err)?;
                cache.insert(PlotId(key.value()), ScheduleId(value.value()));
            }
            cache
        };

        Ok(Self {
            db,
            schedule_cache,
            counters,
        })
    }

    /// Compact the database (optional optimization).
    pub fn compact(&mut self) -> Result<(), LedgerError> {
        self.db.compact().map_err(io_err)?;
        Ok(())
    }

    // =========================================================================
    // RECORD HELPERS
    // =========================================================================

    /// Write one serialized record, updating the metadata counter in the
    /// same transaction.
    fn put_record<T: Serialize>(
        &self,
        table_def: TableDefinition<'static, u64, &'static [u8]>,
        key: u64,
        record: &T,
        counter_key: Option<(&str, u64)>,
    ) -> Result<(), LedgerError> {
        let bytes = postcard::to_allocvec(record).map_err(ser_err)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(table_def).map_err(io_err)?;
            table.insert(key, bytes.as_slice()).map_err(io_err)?;
        }
        if let Some((meta_key, value)) = counter_key {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            meta.insert(meta_key, value).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;
        Ok(())
    }

    fn get_record<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<'static, u64, &'static [u8]>,
        key: u64,
    ) -> Result<Option<T>, LedgerError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table_def).map_err(io_err)?;
        match table.get(key).map_err(io_err)? {
            Some(data) => Ok(Some(postcard::from_bytes(data.value()).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    /// Get all records in a table in key order.
    fn all_records<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<'static, u64, &'static [u8]>,
    ) -> Result<Vec<T>, LedgerError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table_def).map_err(io_err)?;
        let mut records = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (_, data) = entry.map_err(io_err)?;
            records.push(postcard::from_bytes(data.value()).map_err(ser_err)?);
        }
        Ok(records)
    }

    fn record_count(
        &self,
        table_def: TableDefinition<'static, u64, &'static [u8]>,
    ) -> Result<usize, LedgerError> {
        use redb::ReadableTableMetadata;
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table_def).map_err(io_err)?;
        Ok(table.len().map_err(io_err)? as usize)
    }
}

// =============================================================================
// LEDGERSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl LedgerStore for RedbLedger {
    fn insert_plot(&mut self, new: NewPlot) -> Result<Plot, LedgerError> {
        let id = self.counters.plot.saturating_add(1);
        let plot = Plot {
            id: PlotId(id),
            plot_number: new.plot_number,
            area: new.area,
            location: new.location,
            total_value: new.total_value,
            status: PlotStatus::Available,
        };
        self.put_record(PLOTS, id, &plot, Some(("next_plot_id", id)))?;
        self.counters.plot = id;
        Ok(plot)
    }

    fn plot(&self, id: PlotId) -> Result<Option<Plot>, LedgerError> {
        self.get_record(PLOTS, id.0)
    }

    fn plots(&self) -> Result<Vec<Plot>, LedgerError> {
        self.all_records(PLOTS)
    }

    fn update_plot(&mut self, plot: &Plot) -> Result<(), LedgerError> {
        if self.get_record::<Plot>(PLOTS, plot.id.0)?.is_none() {
            return Err(LedgerError::PlotNotFound(plot.id));
        }
        self.put_record(PLOTS, plot.id.0, plot, None)
    }

    fn insert_schedule(
        &mut self,
        plot_id: PlotId,
        total_amount: Money,
        down_payment: Money,
        installment_count: u32,
    ) -> Result<PaymentSchedule, LedgerError> {
        let id = self.counters.schedule.saturating_add(1);
        let schedule = PaymentSchedule {
            id: ScheduleId(id),
            plot_id,
            total_amount,
            down_payment,
            installment_count,
        };

        let bytes = postcard::to_allocvec(&schedule).map_err(ser_err)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(SCHEDULES).map_err(io_err)?;
            table.insert(id, bytes.as_slice()).map_err(io_err)?;
        }
        {
            let mut index = write_txn.open_table(PLOT_INDEX).map_err(io_err)?;
            index.insert(plot_id.0, id).map_err(io_err)?;
        }
        {
            let mut meta = write_txn.open_table(METADATA).map_err(io_err)?;
            meta.insert("next_schedule_id", id).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)?;

        // Update in-memory state only after successful commit.
        self.counters.schedule = id;
        self.schedule_cache.insert(plot_id, schedule.id);
        Ok(schedule)
    }

    fn schedule(&self, id: ScheduleId) -> Result<Option<PaymentSchedule>, LedgerError> {
        self.get_record(SCHEDULES, id.0)
    }

    fn schedule_for_plot(&self, plot: PlotId) -> Result<Option<PaymentSchedule>, LedgerError> {
        match self.schedule_cache.get(&plot) {
            Some(id) => self.get_record(SCHEDULES, id.0),
            None => Ok(None),
        }
    }

    fn insert_installment(
        &mut self,
        schedule_id: ScheduleId,
        number: u32,
        amount: Money,
        due_date: NaiveDate,
    ) -> Result<PaymentInstallment, LedgerError> {
        let id = self.counters.installment.saturating_add(1);
        let installment = PaymentInstallment {
            id: InstallmentId(id),
            schedule_id,
            number,
            amount,
            due_date,
            status: PaymentStatus::Pending,
            paid_date: None,
            receipt_uri: None,
        };
        self.put_record(
            INSTALLMENTS,
            id,
            &installment,
            Some(("next_installment_id", id)),
        )?;
        self.counters.installment = id;
        Ok(installment)
    }

    fn installment(&self, id: InstallmentId) -> Result<Option<PaymentInstallment>, LedgerError> {
        self.get_record(INSTALLMENTS, id.0)
    }

    fn installments(&self, schedule: ScheduleId) -> Result<Vec<PaymentInstallment>, LedgerError> {
        let mut items: Vec<PaymentInstallment> = self
            .all_records(INSTALLMENTS)?
            .into_iter()
            .filter(|i: &PaymentInstallment| i.schedule_id == schedule)
            .collect();
        items.sort_by_key(|i| i.number);
        Ok(items)
    }

    fn update_installment(&mut self, installment: &PaymentInstallment) -> Result<(), LedgerError> {
        if self
            .get_record::<PaymentInstallment>(INSTALLMENTS, installment.id.0)?
            .is_none()
        {
            return Err(LedgerError::InstallmentNotFound(installment.id));
        }
        self.put_record(INSTALLMENTS, installment.id.0, installment, None)
    }

    fn insert_document(
        &mut self,
        plot_id: PlotId,
        kind: DocumentKind,
    ) -> Result<MilestoneDocument, LedgerError> {
        let id = self.counters.document.saturating_add(1);
        let document = MilestoneDocument {
            id: DocumentId(id),
            plot_id,
            kind,
            status: DocumentStatus::Ready,
            generated_uri: None,
            generated_on: None,
            approved_on: None,
            approved_by: None,
        };
        self.put_record(DOCUMENTS, id, &document, Some(("next_document_id", id)))?;
        self.counters.document = id;
        Ok(document)
    }

    fn document(&self, id: DocumentId) -> Result<Option<MilestoneDocument>, LedgerError> {
        self.get_record(DOCUMENTS, id.0)
    }

    fn documents_for_plot(&self, plot: PlotId) -> Result<Vec<MilestoneDocument>, LedgerError> {
        Ok(self
            .all_records(DOCUMENTS)?
            .into_iter()
            .filter(|d: &MilestoneDocument| d.plot_id == plot)
            .collect())
    }

    fn update_document(&mut self, document: &MilestoneDocument) -> Result<(), LedgerError> {
        if self
            .get_record::<MilestoneDocument>(DOCUMENTS, document.id.0)?
            .is_none()
        {
            return Err(LedgerError::DocumentNotFound(document.id));
        }
        self.put_record(DOCUMENTS, document.id.0, document, None)
    }

    fn insert_case(
        &mut self,
        plot_id: PlotId,
        installment_id: Option<InstallmentId>,
        amount: Money,
        opened_on: NaiveDate,
        grace_period_end: NaiveDate,
        description: Option<String>,
    ) -> Result<LegalCase, LedgerError> {
        let id = self.counters.case_.saturating_add(1);
        let case = LegalCase {
            id: CaseId(id),
            plot_id,
            installment_id,
            amount,
            opened_on,
            grace_period_end,
            status: CaseStatus::Recorded,
            court_date: None,
            filed_by: None,
            description,
        };
        self.put_record(CASES, id, &case, Some(("next_case_id", id)))?;
        self.counters.case_ = id;
        Ok(case)
    }

    fn case(&self, id: CaseId) -> Result<Option<LegalCase>, LedgerError> {
        self.get_record(CASES, id.0)
    }

    fn cases(&self) -> Result<Vec<LegalCase>, LedgerError> {
        self.all_records(CASES)
    }

    fn update_case(&mut self, case: &LegalCase) -> Result<(), LedgerError> {
        if self.get_record::<LegalCase>(CASES, case.id.0)?.is_none() {
            return Err(LedgerError::CaseNotFound(case.id));
        }
        self.put_record(CASES, case.id.0, case, None)
    }

    fn append_audit(
        &mut self,
        on: NaiveDate,
        action: AuditAction,
        plot: Option<PlotId>,
        detail: String,
    ) -> Result<u64, LedgerError> {
        let seq = self.counters.audit.saturating_add(1);
        let entry = AuditEntry {
            seq,
            on,
            action,
            plot,
            detail,
        };
        self.put_record(AUDIT, seq, &entry, Some(("next_audit_seq", seq)))?;
        self.counters.audit = seq;
        Ok(seq)
    }

    fn audit(&self, limit: usize) -> Result<Vec<AuditEntry>, LedgerError> {
        let limit = limit.min(MAX_AUDIT_QUERY);
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(AUDIT).map_err(io_err)?;
        let mut entries = Vec::new();
        for entry in table.iter().map_err(io_err)?.rev().take(limit) {
            let (_, data) = entry.map_err(io_err)?;
            entries.push(postcard::from_bytes(data.value()).map_err(ser_err)?);
        }
        Ok(entries)
    }

    fn plot_count(&self) -> Result<usize, LedgerError> {
        self.record_count(PLOTS)
    }

    fn schedule_count(&self) -> Result<usize, LedgerError> {
        self.record_count(SCHEDULES)
    }

    fn document_count(&self) -> Result<usize, LedgerError> {
        self.record_count(DOCUMENTS)
    }

    fn open_case_count(&self) -> Result<usize, LedgerError> {
        Ok(self
            .cases()?
            .iter()
            .filter(|c| c.status.is_open())
            .count())
    }
}
