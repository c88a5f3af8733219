//! Incremental generation loading.
//!
//! The loader owns no transport. `ensure_generation` hands the host a
//! batch of identifiers to fetch; the host reports back through
//! `complete` or `fail`. At most one batch is outstanding at a time, and
//! a batch made stale by a reset is recognized and dropped when its
//! result arrives late.

use serde::{Deserialize, Serialize};

use fandoku_logic::ahnentafel::{child, is_maternal, Slot};

use crate::index::AhnentafelIndex;
use crate::person::{Person, PersonId};
use crate::source::{AncestorSource, SourceError};
use crate::store::AncestorStore;

/// One batch of identifiers to request from the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchBatch {
    pub generation: u32,
    pub ids: Vec<PersonId>,
    epoch: u64,
}

/// What `ensure_generation` decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// Everything fetchable in the generation is already resolved; the
    /// watermark advanced.
    AlreadyResolved,
    /// The host should fetch this batch and hand the result back to
    /// [`AncestorLoader::complete`] or [`AncestorLoader::fail`].
    Requested(FetchBatch),
    /// A batch is already in flight; no duplicate request is issued.
    Pending,
}

/// What a completed batch changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Slots bound by this batch.
    pub newly_bound: Vec<Slot>,
    /// Slots that stayed vacant: parent identifier unknown, record not
    /// returned, or record private.
    pub unresolved: Vec<Slot>,
}

/// Drives generation-by-generation fetching against the store and index.
#[derive(Debug, Default)]
pub struct AncestorLoader {
    retrieved_through: u32,
    in_flight: Option<FetchBatch>,
    epoch: u64,
    last_error: Option<SourceError>,
}

impl AncestorLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure `generation` has been requested.
    ///
    /// Already-resolved generations just advance the watermark. A
    /// generation with vacant slots yields one deduplicated batch of the
    /// missing parent identifiers; slots whose parent identifier is
    /// unknown are skipped (they can never resolve).
    pub fn ensure_generation(
        &mut self,
        generation: u32,
        index: &AhnentafelIndex,
        store: &AncestorStore,
    ) -> EnsureOutcome {
        if generation <= self.retrieved_through {
            return EnsureOutcome::AlreadyResolved;
        }
        if self.in_flight.is_some() {
            return EnsureOutcome::Pending;
        }

        let mut ids: Vec<PersonId> = Vec::new();
        for slot in index.slots_needing(generation) {
            if let Some(id) = wanted_parent_id(slot, index, store) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        if ids.is_empty() {
            self.retrieved_through = generation;
            log::debug!("generation {} needs no fetch", generation);
            return EnsureOutcome::AlreadyResolved;
        }

        let batch = FetchBatch { generation, ids, epoch: self.epoch };
        self.in_flight = Some(batch.clone());
        log::info!(
            "requesting {} persons for generation {}",
            batch.ids.len(),
            generation
        );
        EnsureOutcome::Requested(batch)
    }

    /// Apply a fetched batch: merge records, bind the new generation,
    /// advance the watermark. A stale or unknown batch is dropped with
    /// no effect.
    pub fn complete(
        &mut self,
        batch: &FetchBatch,
        records: Vec<Person>,
        store: &mut AncestorStore,
        index: &mut AhnentafelIndex,
    ) -> LoadReport {
        match &self.in_flight {
            Some(current) if current == batch => {}
            _ => {
                log::warn!(
                    "dropping stale fetch result for generation {}",
                    batch.generation
                );
                return LoadReport::default();
            }
        }
        self.in_flight = None;
        self.last_error = None;

        for person in records {
            store.merge(person);
        }

        let mut report = LoadReport::default();
        for slot in index.occupied_in(batch.generation - 1) {
            report.newly_bound.extend(index.derive_children(slot, store));
        }
        report.unresolved = index.slots_needing(batch.generation);
        self.retrieved_through = batch.generation;
        log::info!(
            "generation {}: {} slots bound, {} permanently vacant",
            batch.generation,
            report.newly_bound.len(),
            report.unresolved.len()
        );
        report
    }

    /// Record a fetch failure. The watermark does not advance and no
    /// retry is issued; the next `ensure_generation` call for the same
    /// generation builds a fresh batch.
    pub fn fail(&mut self, error: SourceError) {
        if let Some(batch) = self.in_flight.take() {
            log::warn!("fetch for generation {} failed: {}", batch.generation, error);
        }
        self.last_error = Some(error);
    }

    /// Mark any in-flight batch stale; its late completion is ignored.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        self.in_flight = None;
    }

    /// Full reset for a new root person.
    pub fn reset(&mut self) {
        self.invalidate();
        self.retrieved_through = 0;
        self.last_error = None;
    }

    /// Restore the watermark from a loaded snapshot.
    pub fn restore_watermark(&mut self, generation: u32) {
        self.retrieved_through = generation;
    }

    pub fn retrieved_through(&self) -> u32 {
        self.retrieved_through
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending_generation(&self) -> Option<u32> {
        self.in_flight.as_ref().map(|b| b.generation)
    }

    /// The last fetch failure, for the host's retry affordance.
    pub fn last_error(&self) -> Option<&SourceError> {
        self.last_error.as_ref()
    }

    /// Step toward `target`, always requesting the lowest unretrieved
    /// generation first so inner rings resolve before outer ones.
    ///
    /// Dead-end generations are skipped in place; the first generation
    /// that actually needs data yields its batch.
    pub fn ensure_through(
        &mut self,
        target: u32,
        index: &AhnentafelIndex,
        store: &AncestorStore,
    ) -> EnsureOutcome {
        while self.retrieved_through < target {
            match self.ensure_generation(self.retrieved_through + 1, index, store) {
                EnsureOutcome::AlreadyResolved => continue,
                other => return other,
            }
        }
        EnsureOutcome::AlreadyResolved
    }

    /// Drive fetching synchronously up to `target` against a source.
    ///
    /// Convenience for the harness and tests; interactive hosts run the
    /// ensure/complete loop themselves.
    pub fn run_to_generation(
        &mut self,
        target: u32,
        source: &mut dyn AncestorSource,
        store: &mut AncestorStore,
        index: &mut AhnentafelIndex,
    ) -> Result<(), SourceError> {
        while self.retrieved_through < target {
            let generation = self.retrieved_through + 1;
            match self.ensure_generation(generation, index, store) {
                EnsureOutcome::Requested(batch) => match source.fetch_persons(&batch.ids) {
                    Ok(records) => {
                        self.complete(&batch, records, store, index);
                    }
                    Err(error) => {
                        self.fail(error.clone());
                        return Err(error);
                    }
                },
                EnsureOutcome::AlreadyResolved => {}
                EnsureOutcome::Pending => return Ok(()),
            }
        }
        Ok(())
    }
}

/// Identifier of the person who should fill vacant `slot`, taken from
/// the record of the slot's child line.
fn wanted_parent_id(
    slot: Slot,
    index: &AhnentafelIndex,
    store: &AncestorStore,
) -> Option<PersonId> {
    let record = index.person_at(child(slot)).and_then(|id| store.get(id))?;
    if is_maternal(slot) {
        record.mother.clone()
    } else {
        record.father.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::PersonName;
    use crate::source::StaticSource;

    fn make_person(id: &str, father: Option<&str>, mother: Option<&str>) -> Person {
        Person::new(id, PersonName::new(id.to_uppercase(), "Falk")).with_parents(father, mother)
    }

    /// Root resolved locally; two further generations behind the source.
    fn fixture() -> (AncestorStore, AhnentafelIndex, StaticSource) {
        let mut store = AncestorStore::new();
        store.add(make_person("root", Some("f"), Some("m")));
        let mut index = AhnentafelIndex::new();
        index.assign_root("root".to_string());

        let source = StaticSource::from_records([
            make_person("f", Some("ff"), Some("fm")),
            make_person("m", Some("mf"), Some("mm")),
            make_person("ff", None, None),
            make_person("fm", None, None),
            make_person("mf", None, None),
            make_person("mm", None, None),
        ]);
        (store, index, source)
    }

    #[test]
    fn test_request_then_complete_binds_generation() {
        let (mut store, mut index, mut source) = fixture();
        let mut loader = AncestorLoader::new();

        let batch = match loader.ensure_generation(1, &index, &store) {
            EnsureOutcome::Requested(batch) => batch,
            other => panic!("expected a request, got {:?}", other),
        };
        assert_eq!(batch.ids, vec!["f".to_string(), "m".to_string()]);

        let records = source.fetch_persons(&batch.ids).unwrap();
        let report = loader.complete(&batch, records, &mut store, &mut index);
        assert_eq!(report.newly_bound, vec![2, 3]);
        assert!(report.unresolved.is_empty());
        assert_eq!(loader.retrieved_through(), 1);
    }

    #[test]
    fn test_no_duplicate_request_while_pending() {
        let (store, index, _) = fixture();
        let mut loader = AncestorLoader::new();

        assert!(matches!(
            loader.ensure_generation(1, &index, &store),
            EnsureOutcome::Requested(_)
        ));
        // Second call must not issue another batch.
        assert_eq!(loader.ensure_generation(1, &index, &store), EnsureOutcome::Pending);
        assert!(loader.is_pending());
        assert_eq!(loader.pending_generation(), Some(1));
    }

    #[test]
    fn test_resolved_generation_needs_no_request() {
        let (mut store, mut index, mut source) = fixture();
        let mut loader = AncestorLoader::new();
        loader
            .run_to_generation(2, &mut source, &mut store, &mut index)
            .unwrap();
        let served = source.requests_served;

        assert_eq!(
            loader.ensure_generation(2, &index, &store),
            EnsureOutcome::AlreadyResolved
        );
        assert_eq!(source.requests_served, served);
    }

    #[test]
    fn test_dead_end_generation_advances_watermark() {
        let (mut store, mut index, mut source) = fixture();
        let mut loader = AncestorLoader::new();
        loader
            .run_to_generation(2, &mut source, &mut store, &mut index)
            .unwrap();

        // Generation 3: grandparents have no recorded parents at all.
        assert_eq!(
            loader.ensure_generation(3, &index, &store),
            EnsureOutcome::AlreadyResolved
        );
        assert_eq!(loader.retrieved_through(), 3);
    }

    #[test]
    fn test_failure_keeps_watermark_and_allows_retry() {
        let (mut store, mut index, _) = fixture();
        let mut loader = AncestorLoader::new();
        let mut bad_source = StaticSource::new();
        bad_source.fail_with = Some(SourceError::Network("offline".to_string()));

        let err = loader
            .run_to_generation(1, &mut bad_source, &mut store, &mut index)
            .unwrap_err();
        assert!(matches!(err, SourceError::Network(_)));
        assert_eq!(loader.retrieved_through(), 0);
        assert!(loader.last_error().is_some());
        assert!(!loader.is_pending());

        // The retry affordance: a fresh ensure issues a fresh batch.
        assert!(matches!(
            loader.ensure_generation(1, &index, &store),
            EnsureOutcome::Requested(_)
        ));
    }

    #[test]
    fn test_stale_batch_is_dropped() {
        let (mut store, mut index, mut source) = fixture();
        let mut loader = AncestorLoader::new();

        let batch = match loader.ensure_generation(1, &index, &store) {
            EnsureOutcome::Requested(batch) => batch,
            other => panic!("expected a request, got {:?}", other),
        };
        let records = source.fetch_persons(&batch.ids).unwrap();

        // The user reset before the response arrived.
        loader.invalidate();
        let report = loader.complete(&batch, records, &mut store, &mut index);
        assert_eq!(report, LoadReport::default());
        assert!(!index.is_occupied(2));
        assert_eq!(loader.retrieved_through(), 0);
    }

    #[test]
    fn test_epoch_distinguishes_identical_batches() {
        let (mut store, mut index, mut source) = fixture();
        let mut loader = AncestorLoader::new();

        let old_batch = match loader.ensure_generation(1, &index, &store) {
            EnsureOutcome::Requested(batch) => batch,
            other => panic!("expected a request, got {:?}", other),
        };
        loader.invalidate();

        // A new batch with the same content is live; the old one is not.
        let new_batch = match loader.ensure_generation(1, &index, &store) {
            EnsureOutcome::Requested(batch) => batch,
            other => panic!("expected a request, got {:?}", other),
        };
        assert_ne!(old_batch, new_batch);

        let records = source.fetch_persons(&old_batch.ids).unwrap();
        let report = loader.complete(&old_batch, records.clone(), &mut store, &mut index);
        assert_eq!(report, LoadReport::default());
        let report = loader.complete(&new_batch, records, &mut store, &mut index);
        assert_eq!(report.newly_bound, vec![2, 3]);
    }

    #[test]
    fn test_collapse_dedupes_requested_ids() {
        // Both parents share a father: his id appears once in the batch.
        let mut store = AncestorStore::new();
        store.add(make_person("root", Some("f"), Some("m")));
        let mut index = AhnentafelIndex::new();
        index.assign_root("root".to_string());
        let mut source = StaticSource::from_records([
            make_person("f", Some("gp"), None),
            make_person("m", Some("gp"), None),
            make_person("gp", None, None),
        ]);
        let mut loader = AncestorLoader::new();
        loader
            .run_to_generation(1, &mut source, &mut store, &mut index)
            .unwrap();

        let batch = match loader.ensure_generation(2, &index, &store) {
            EnsureOutcome::Requested(batch) => batch,
            other => panic!("expected a request, got {:?}", other),
        };
        assert_eq!(batch.ids, vec!["gp".to_string()]);
    }
}
