//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. Records live in per-year
//! tables keyed by record id; writes go to a working copy that `commit`
//! publishes and `rollback` drops.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::db::repository::*;
use crate::models::{
    MoeThresholds, NewTravelTime, Period, RouteId, RouteInfo, RouteMoeParameters,
    TravelTimeRecord, TravelTimeUpdate,
};

/// Repository operations that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListByPeriod,
    DeleteRange,
    BulkInsert,
    Update,
    Commit,
    Rollback,
    ListRoutes,
    GetRoute,
    GetLatestOverride,
    InsertOverride,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::ListByPeriod => "list_by_period",
            Operation::DeleteRange => "delete_range",
            Operation::BulkInsert => "bulk_insert",
            Operation::Update => "update",
            Operation::Commit => "commit",
            Operation::Rollback => "rollback",
            Operation::ListRoutes => "list_routes",
            Operation::GetRoute => "get_route",
            Operation::GetLatestOverride => "get_latest_override",
            Operation::InsertOverride => "insert_override",
        }
    }
}

/// Per-year tables of travel-time records.
type Tables = HashMap<i32, BTreeMap<i64, TravelTimeRecord>>;

/// In-memory local repository.
///
/// # Example
/// ```
/// use tetres_tt::db::repositories::LocalRepository;
/// use tetres_tt::db::RouteRepository;
///
/// #[tokio::main]
/// async fn main() {
///     let repo = LocalRepository::new();
///     let routes = repo.list_routes().await.unwrap();
///     assert!(routes.is_empty());
/// }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    committed: Tables,
    // Uncommitted state; `None` when nothing was written since the last commit.
    working: Option<Tables>,

    routes: BTreeMap<RouteId, RouteInfo>,
    overrides: Vec<RouteMoeParameters>,

    // ID counters
    next_record_id: i64,
    next_override_id: i64,

    // Call counters
    update_calls: usize,
    commit_calls: usize,

    // Failure injection
    failing: HashSet<Operation>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            committed: Tables::new(),
            working: None,
            routes: BTreeMap::new(),
            overrides: Vec::new(),
            next_record_id: 1,
            next_override_id: 1,
            update_calls: 0,
            commit_calls: 0,
            failing: HashSet::new(),
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn tables(&self) -> &Tables {
        self.working.as_ref().unwrap_or(&self.committed)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        let committed = &self.committed;
        self.working.get_or_insert_with(|| committed.clone())
    }

    fn records(&self) -> impl Iterator<Item = &TravelTimeRecord> {
        self.tables().values().flat_map(|t| t.values())
    }

    fn check(&self, op: Operation) -> RepositoryResult<()> {
        if !self.is_healthy {
            return Err(RepositoryError::unavailable("Database is not healthy").with_operation(op.name()));
        }
        if self.failing.contains(&op) {
            let err = match op {
                Operation::Commit | Operation::Rollback => RepositoryError::transaction("Injected failure"),
                _ => RepositoryError::query("Injected failure"),
            };
            return Err(err.with_operation(op.name()));
        }
        Ok(())
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LocalData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LocalData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a route to the catalog, replacing any route with the same id.
    pub fn insert_route(&self, route: RouteInfo) {
        self.write().routes.insert(route.id, route);
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.write().is_healthy = healthy;
    }

    /// Make every later call of `op` fail with a query error.
    pub fn fail_on(&self, op: Operation) {
        self.write().failing.insert(op);
    }

    /// Stop injecting failures.
    pub fn clear_failures(&self) {
        self.write().failing.clear();
    }

    /// Number of records visible to reads, including uncommitted writes.
    pub fn record_count(&self) -> usize {
        self.read().records().count()
    }

    /// Number of committed records.
    pub fn committed_count(&self) -> usize {
        self.read().committed.values().map(BTreeMap::len).sum()
    }

    /// Whether writes are pending a commit.
    pub fn has_pending_writes(&self) -> bool {
        self.read().working.is_some()
    }

    /// Look up a record by id.
    pub fn get_record(&self, id: i64) -> Option<TravelTimeRecord> {
        self.read().records().find(|r| r.id == id).cloned()
    }

    /// Look up a record by its key.
    pub fn find_record(&self, route_id: RouteId, time: NaiveDateTime) -> Option<TravelTimeRecord> {
        self.read()
            .records()
            .find(|r| r.route_id == route_id && r.time == time)
            .cloned()
    }

    /// Number of `update` calls served so far.
    pub fn update_count(&self) -> usize {
        self.read().update_calls
    }

    /// Number of `commit` calls served so far.
    pub fn commit_count(&self) -> usize {
        self.read().commit_calls
    }

    /// Load records as committed, keeping their ids.
    ///
    /// Later inserts are numbered after the highest imported id.
    pub fn import_records(&self, records: Vec<TravelTimeRecord>) {
        let mut data = self.write();
        for record in records {
            data.next_record_id = data.next_record_id.max(record.id + 1);
            data.committed
                .entry(record.time.year())
                .or_default()
                .insert(record.id, record);
        }
    }

    /// Every committed record, ordered by route and time.
    pub fn export_records(&self) -> Vec<TravelTimeRecord> {
        let mut records: Vec<TravelTimeRecord> = self
            .read()
            .committed
            .values()
            .flat_map(|t| t.values().cloned())
            .collect();
        records.sort_by_key(|r| r.key());
        records
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TravelTimeRepository for LocalRepository {
    async fn list_by_period(
        &self,
        route_id: RouteId,
        period: &Period,
    ) -> RepositoryResult<Vec<TravelTimeRecord>> {
        let data = self.read();
        data.check(Operation::ListByPeriod)?;
        let years = period.start().year()..=period.end().year();
        let mut rows: Vec<TravelTimeRecord> = data
            .tables()
            .iter()
            .filter(|(year, _)| years.contains(*year))
            .flat_map(|(_, t)| t.values())
            .filter(|r| r.route_id == route_id && period.contains(r.time))
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.time);
        Ok(rows)
    }

    async fn delete_range(
        &self,
        route_id: RouteId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let mut data = self.write();
        data.check(Operation::DeleteRange)?;
        let mut deleted = 0;
        for table in data.tables_mut().values_mut() {
            let before = table.len();
            table.retain(|_, r| !(r.route_id == route_id && start <= r.time && r.time < end));
            deleted += before - table.len();
        }
        Ok(deleted)
    }

    async fn bulk_insert(&self, rows: &[NewTravelTime]) -> RepositoryResult<Vec<i64>> {
        let mut data = self.write();
        data.check(Operation::BulkInsert)?;

        let mut keys: HashSet<(RouteId, NaiveDateTime)> = data.records().map(|r| r.key()).collect();
        for row in rows {
            if !keys.insert((row.route_id, row.time)) {
                return Err(RepositoryError::duplicate_key(format!(
                    "travel time at {}",
                    row.time
                ))
                .with_operation(Operation::BulkInsert.name())
                .with_entity("route", row.route_id));
            }
        }

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = data.next_record_id;
            data.next_record_id += 1;
            let record = TravelTimeRecord {
                id,
                route_id: row.route_id,
                time: row.time,
                values: row.values,
                meta_data: row.meta_data.clone(),
            };
            data.tables_mut()
                .entry(row.time.year())
                .or_default()
                .insert(id, record);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn update(&self, id: i64, update: &TravelTimeUpdate) -> RepositoryResult<()> {
        let mut data = self.write();
        data.check(Operation::Update)?;
        data.update_calls += 1;
        let record = data
            .tables_mut()
            .values_mut()
            .find_map(|t| t.get_mut(&id))
            .ok_or_else(|| {
                RepositoryError::not_found("travel time record")
                    .with_operation(Operation::Update.name())
                    .with_entity("travel_time", id)
            })?;
        record.apply(update);
        Ok(())
    }

    async fn commit(&self) -> RepositoryResult<()> {
        let mut data = self.write();
        data.check(Operation::Commit)?;
        data.commit_calls += 1;
        if let Some(working) = data.working.take() {
            data.committed = working;
        }
        Ok(())
    }

    async fn rollback(&self) -> RepositoryResult<()> {
        let mut data = self.write();
        data.check(Operation::Rollback)?;
        data.working = None;
        Ok(())
    }
}

#[async_trait]
impl RouteRepository for LocalRepository {
    async fn list_routes(&self) -> RepositoryResult<Vec<RouteInfo>> {
        let data = self.read();
        data.check(Operation::ListRoutes)?;
        Ok(data.routes.values().cloned().collect())
    }

    async fn get_route(&self, route_id: RouteId) -> RepositoryResult<RouteInfo> {
        let data = self.read();
        data.check(Operation::GetRoute)?;
        data.routes.get(&route_id).cloned().ok_or_else(|| {
            RepositoryError::not_found(format!("Route {} not found", route_id))
                .with_operation(Operation::GetRoute.name())
        })
    }
}

#[async_trait]
impl MoeParameterRepository for LocalRepository {
    async fn get_latest_override(
        &self,
        route_id: RouteId,
    ) -> RepositoryResult<Option<RouteMoeParameters>> {
        let data = self.read();
        data.check(Operation::GetLatestOverride)?;
        Ok(data
            .overrides
            .iter()
            .filter(|p| p.route_id == route_id)
            .max_by_key(|p| (p.registered_at, p.id))
            .cloned())
    }

    async fn insert_override(
        &self,
        route_id: RouteId,
        thresholds: MoeThresholds,
    ) -> RepositoryResult<RouteMoeParameters> {
        let mut data = self.write();
        data.check(Operation::InsertOverride)?;
        let params = RouteMoeParameters {
            id: data.next_override_id,
            route_id,
            thresholds,
            registered_at: Utc::now().naive_utc(),
        };
        data.next_override_id += 1;
        data.overrides.push(params.clone());
        Ok(params)
    }
}
