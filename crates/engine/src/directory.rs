//! Unit lookup by opaque id.

use std::sync::Arc;

use cad_core::types::DbId;
use cad_core::unit::{UnitFilter, UnitKind};
use cad_db::models::unit::Unit;
use cad_db::{DispatchStore, StoreResult};

/// A unit together with the table it was found in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUnit {
    pub unit: Unit,
    pub kind: UnitKind,
}

/// Resolves unit ids across the four unit tables.
///
/// Tables are tried in [`UnitKind::PRIORITY`] order and the first match
/// wins. Missing units are `Ok(None)`; the caller decides what that means.
#[derive(Clone)]
pub struct UnitDirectory {
    store: Arc<dyn DispatchStore>,
}

impl UnitDirectory {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        unit_id: DbId,
        filter: UnitFilter,
    ) -> StoreResult<Option<ResolvedUnit>> {
        self.resolve_in(&UnitKind::PRIORITY, unit_id, filter).await
    }

    /// Like [`resolve`](Self::resolve) but only searches `kinds`, still in
    /// priority order.
    pub async fn resolve_in(
        &self,
        kinds: &[UnitKind],
        unit_id: DbId,
        filter: UnitFilter,
    ) -> StoreResult<Option<ResolvedUnit>> {
        for kind in UnitKind::PRIORITY.iter().filter(|k| kinds.contains(k)) {
            if let Some(unit) = self.store.find_unit(*kind, unit_id, filter).await? {
                return Ok(Some(ResolvedUnit { unit, kind: *kind }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use cad_db::store::memory::{BUSY_STATUS_ID, OFF_DUTY_STATUS_ID};
    use cad_db::MemoryDispatchStore;

    use super::*;

    #[tokio::test]
    async fn resolves_each_kind_by_id() {
        let store = Arc::new(MemoryDispatchStore::new());
        let officer = store.insert_unit(UnitKind::Officer, "1-A", None).await;
        let combined = store.insert_unit(UnitKind::CombinedEmsFd, "M-1/2", None).await;
        let directory = UnitDirectory::new(store);

        let found = directory.resolve(officer.id, UnitFilter::Any).await.unwrap().unwrap();
        assert_eq!(found.kind, UnitKind::Officer);
        let found = directory.resolve(combined.id, UnitFilter::Any).await.unwrap().unwrap();
        assert_eq!(found.kind, UnitKind::CombinedEmsFd);
        assert!(directory.resolve(999, UnitFilter::Any).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn filter_hides_off_duty_units() {
        let store = Arc::new(MemoryDispatchStore::new());
        let off = store.insert_unit(UnitKind::EmsFdDeputy, "M-2", Some(OFF_DUTY_STATUS_ID)).await;
        let on = store.insert_unit(UnitKind::EmsFdDeputy, "M-3", Some(BUSY_STATUS_ID)).await;
        let directory = UnitDirectory::new(store);

        assert!(directory.resolve(off.id, UnitFilter::NotOffDuty).await.unwrap().is_none());
        assert!(directory.resolve(on.id, UnitFilter::NotOffDuty).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn resolve_in_ignores_other_families() {
        let store = Arc::new(MemoryDispatchStore::new());
        let deputy = store.insert_unit(UnitKind::EmsFdDeputy, "M-4", Some(BUSY_STATUS_ID)).await;
        let directory = UnitDirectory::new(store);

        let leo = directory
            .resolve_in(&[UnitKind::Officer, UnitKind::CombinedLeo], deputy.id, UnitFilter::Any)
            .await
            .unwrap();
        assert!(leo.is_none());
    }
}
