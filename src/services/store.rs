//! Data-store collaborator: the typed surface the voice core reads and
//! writes, plus an in-memory implementation used by tests and the console
//! driver. The real backend lives outside this crate.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::intent::types::DayCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MedicineId(pub Uuid);

impl MedicineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberId(pub Uuid);

impl MemberId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub Uuid);

impl PlanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medicine {
    pub id: MedicineId,
    pub name: String,
    pub dose: String,
    pub days: Vec<DayCode>,
    pub times: Vec<String>,
    pub note: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMedicine {
    pub name: String,
    pub dose: String,
    pub days: Vec<DayCode>,
    pub times: Vec<String>,
    pub note: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub id: MemberId,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub title: String,
    pub plan_date: NaiveDate,
    pub plan_time: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPlan {
    pub title: String,
    pub plan_date: NaiveDate,
    pub plan_time: String,
    pub note: String,
}

/// One "taken today" record. Keyed by (user, medicine, date): marking the
/// same medicine twice on the same day overwrites, never duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakenLog {
    pub user: UserId,
    pub medicine: MedicineId,
    pub taken_date: NaiveDate,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait HealthStore: Send + Sync {
    async fn medicines(&self, user: UserId) -> Result<Vec<Medicine>, StoreError>;
    async fn family_members(&self, user: UserId) -> Result<Vec<FamilyMember>, StoreError>;
    /// Idempotent per (user, medicine, date).
    async fn upsert_taken(
        &self,
        user: UserId,
        medicine: MedicineId,
        date: NaiveDate,
    ) -> Result<(), StoreError>;
    async fn insert_medicine(
        &self,
        user: UserId,
        medicine: NewMedicine,
    ) -> Result<Medicine, StoreError>;
    async fn insert_plan(&self, user: UserId, plan: NewPlan) -> Result<Plan, StoreError>;
}

#[derive(Default)]
struct Tables {
    medicines: HashMap<UserId, Vec<Medicine>>,
    family: HashMap<UserId, Vec<FamilyMember>>,
    plans: HashMap<UserId, Vec<Plan>>,
    taken: HashMap<(UserId, MedicineId, NaiveDate), TakenLog>,
}

/// In-memory store. Interior mutability so it can sit behind an `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> Result<T, StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))?;
        Ok(f(&mut tables))
    }

    /// Seed helper; family members have no insert operation on the trait.
    pub fn add_family_member(
        &self,
        user: UserId,
        name: &str,
        phone: Option<&str>,
    ) -> Result<MemberId, StoreError> {
        let member = FamilyMember {
            id: MemberId::new(),
            name: name.to_string(),
            phone: phone.map(str::to_string),
        };
        let id = member.id;
        self.with_tables(|t| t.family.entry(user).or_default().push(member))?;
        Ok(id)
    }

    pub fn taken_on(&self, user: UserId, date: NaiveDate) -> Result<Vec<MedicineId>, StoreError> {
        self.with_tables(|t| {
            t.taken
                .keys()
                .filter(|(u, _, d)| *u == user && *d == date)
                .map(|(_, m, _)| *m)
                .collect()
        })
    }

    pub fn plans_of(&self, user: UserId) -> Result<Vec<Plan>, StoreError> {
        self.with_tables(|t| t.plans.get(&user).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl HealthStore for MemoryStore {
    async fn medicines(&self, user: UserId) -> Result<Vec<Medicine>, StoreError> {
        self.with_tables(|t| t.medicines.get(&user).cloned().unwrap_or_default())
    }

    async fn family_members(&self, user: UserId) -> Result<Vec<FamilyMember>, StoreError> {
        self.with_tables(|t| t.family.get(&user).cloned().unwrap_or_default())
    }

    async fn upsert_taken(
        &self,
        user: UserId,
        medicine: MedicineId,
        date: NaiveDate,
    ) -> Result<(), StoreError> {
        let log = TakenLog {
            user,
            medicine,
            taken_date: date,
            taken_at: Utc::now(),
        };
        self.with_tables(|t| {
            t.taken.insert((user, medicine, date), log);
        })
    }

    async fn insert_medicine(
        &self,
        user: UserId,
        medicine: NewMedicine,
    ) -> Result<Medicine, StoreError> {
        let record = Medicine {
            id: MedicineId::new(),
            name: medicine.name,
            dose: medicine.dose,
            days: medicine.days,
            times: medicine.times,
            note: medicine.note,
            color: medicine.color,
            icon: medicine.icon,
        };
        let out = record.clone();
        self.with_tables(|t| t.medicines.entry(user).or_default().push(record))?;
        Ok(out)
    }

    async fn insert_plan(&self, user: UserId, plan: NewPlan) -> Result<Plan, StoreError> {
        let record = Plan {
            id: PlanId::new(),
            title: plan.title,
            plan_date: plan.plan_date,
            plan_time: plan.plan_time,
            note: plan.note,
        };
        let out = record.clone();
        self.with_tables(|t| t.plans.entry(user).or_default().push(record))?;
        Ok(out)
    }
}
