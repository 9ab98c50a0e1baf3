use chrono::NaiveDate;
use std::future::Future;
use std::path::Path;
use tally_core::{
    Budget, BudgetId, Category, CategoryId, Expense, ExpenseId, NewBudget, NewCategory,
    Preferences, ValidatedExpense,
};
use thiserror::Error;

use crate::db::{self, DbPool};
use crate::retry::{with_retry, RetryPolicy};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl StorageError {
    fn from_write(e: sqlx::Error, what: &str) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StorageError::Conflict(format!("{what} already exists"))
            }
            _ => StorageError::Database(e),
        }
    }
}

/// Typed access to the database. Every method runs its query through the
/// retry accessor, so callers never see a transient error unless retries
/// were exhausted.
#[derive(Debug, Clone)]
pub struct Store {
    pool: DbPool,
    policy: RetryPolicy,
}

impl Store {
    pub fn new(pool: DbPool, policy: RetryPolicy) -> Self {
        Self { pool, policy }
    }

    pub async fn open(path: &Path, policy: RetryPolicy) -> Result<Self, StorageError> {
        let pool = with_retry(&policy, || db::create_db(path)).await?;
        Ok(Self::new(pool, policy))
    }

    async fn retrying<T, F, Fut>(&self, op: F) -> Result<T, sqlx::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        with_retry(&self.policy, op).await
    }

    // ── Categories ────────────────────────────────────────────────────────────

    pub async fn list_categories(&self, user_id: &str) -> Result<Vec<Category>, StorageError> {
        let pool = &self.pool;
        Ok(self.retrying(move || db::list_categories(pool, user_id)).await?)
    }

    /// Just the names, as handed to the receipt prompt.
    pub async fn category_names(&self, user_id: &str) -> Result<Vec<String>, StorageError> {
        let categories = self.list_categories(user_id).await?;
        Ok(categories.into_iter().map(|c| c.name).collect())
    }

    pub async fn create_category(
        &self,
        user_id: &str,
        category: &NewCategory,
    ) -> Result<Category, StorageError> {
        let pool = &self.pool;
        self.retrying(move || db::insert_category(pool, user_id, category))
            .await
            .map_err(|e| StorageError::from_write(e, "Category"))
    }

    pub async fn delete_category(&self, user_id: &str, id: CategoryId) -> Result<(), StorageError> {
        let pool = &self.pool;
        let deleted = self.retrying(move || db::delete_category(pool, user_id, id)).await?;
        if deleted {
            Ok(())
        } else {
            Err(StorageError::NotFound("Category"))
        }
    }

    async fn check_category(&self, user_id: &str, id: Option<CategoryId>) -> Result<(), StorageError> {
        let Some(id) = id else { return Ok(()) };
        let pool = &self.pool;
        let owned = self.retrying(move || db::category_belongs_to(pool, user_id, id)).await?;
        if owned {
            Ok(())
        } else {
            Err(StorageError::NotFound("Category"))
        }
    }

    // ── Expenses ──────────────────────────────────────────────────────────────

    pub async fn create_expense(
        &self,
        user_id: &str,
        expense: &ValidatedExpense,
    ) -> Result<Expense, StorageError> {
        self.check_category(user_id, expense.category_id).await?;
        let pool = &self.pool;
        Ok(self.retrying(move || db::insert_expense(pool, user_id, expense)).await?)
    }

    pub async fn get_expense(&self, user_id: &str, id: ExpenseId) -> Result<Expense, StorageError> {
        let pool = &self.pool;
        self.retrying(move || db::get_expense(pool, user_id, id))
            .await?
            .ok_or(StorageError::NotFound("Expense"))
    }

    pub async fn list_expenses(
        &self,
        user_id: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Expense>, StorageError> {
        let pool = &self.pool;
        Ok(self.retrying(move || db::list_expenses(pool, user_id, from, to)).await?)
    }

    pub async fn update_expense(
        &self,
        user_id: &str,
        id: ExpenseId,
        expense: &ValidatedExpense,
    ) -> Result<Expense, StorageError> {
        self.check_category(user_id, expense.category_id).await?;
        let pool = &self.pool;
        self.retrying(move || db::update_expense(pool, user_id, id, expense))
            .await?
            .ok_or(StorageError::NotFound("Expense"))
    }

    pub async fn delete_expense(&self, user_id: &str, id: ExpenseId) -> Result<(), StorageError> {
        let pool = &self.pool;
        let deleted = self.retrying(move || db::delete_expense(pool, user_id, id)).await?;
        if deleted {
            Ok(())
        } else {
            Err(StorageError::NotFound("Expense"))
        }
    }

    // ── Budgets ───────────────────────────────────────────────────────────────

    pub async fn upsert_budget(&self, user_id: &str, budget: &NewBudget) -> Result<Budget, StorageError> {
        self.check_category(user_id, budget.category_id).await?;
        let pool = &self.pool;
        Ok(self.retrying(move || db::upsert_budget(pool, user_id, budget)).await?)
    }

    pub async fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>, StorageError> {
        let pool = &self.pool;
        Ok(self.retrying(move || db::list_budgets(pool, user_id)).await?)
    }

    pub async fn delete_budget(&self, user_id: &str, id: BudgetId) -> Result<(), StorageError> {
        let pool = &self.pool;
        let deleted = self.retrying(move || db::delete_budget(pool, user_id, id)).await?;
        if deleted {
            Ok(())
        } else {
            Err(StorageError::NotFound("Budget"))
        }
    }

    // ── Preferences ───────────────────────────────────────────────────────────

    pub async fn get_preferences(&self, user_id: &str) -> Result<Preferences, StorageError> {
        let pool = &self.pool;
        let stored = self.retrying(move || db::get_preferences(pool, user_id)).await?;
        Ok(stored.unwrap_or_else(|| Preferences::default_for(user_id)))
    }

    pub async fn save_preferences(&self, prefs: &Preferences) -> Result<(), StorageError> {
        let pool = &self.pool;
        Ok(self.retrying(move || db::save_preferences(pool, prefs)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tally_core::{BudgetPeriod, Money, UnvalidatedExpense};

    async fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(
            &dir.path().join("tally.db"),
            RetryPolicy::new(3, Duration::from_millis(1)),
        )
        .await
        .unwrap();
        (dir, store)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(title: &str, cents: i64, day: NaiveDate, cat: Option<CategoryId>) -> ValidatedExpense {
        ValidatedExpense::validate(UnvalidatedExpense {
            title: title.into(),
            amount: Money::from_cents(cents),
            currency: "USD".into(),
            date: day,
            category_id: cat,
            vendor: Some("Corner Cafe".into()),
            description: None,
            receipt_url: None,
        })
        .unwrap()
    }

    fn food() -> NewCategory {
        NewCategory { name: "Food".into(), color: Some("#ff0000".into()) }
    }

    #[tokio::test]
    async fn categories_are_scoped_per_user() {
        let (_dir, store) = test_store().await;
        store.create_category("alice", &food()).await.unwrap();
        store.create_category("bob", &food()).await.unwrap();

        assert_eq!(store.category_names("alice").await.unwrap(), vec!["Food"]);
        assert_eq!(store.list_categories("carol").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn duplicate_category_name_conflicts() {
        let (_dir, store) = test_store().await;
        store.create_category("alice", &food()).await.unwrap();
        let dup = NewCategory { name: "food".into(), color: None };
        let err = store.create_category("alice", &dup).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn expense_crud_roundtrip() {
        let (_dir, store) = test_store().await;
        let cat = store.create_category("alice", &food()).await.unwrap();

        let created = store
            .create_expense("alice", &expense("Lunch", 1250, date(2024, 3, 1), Some(cat.id)))
            .await
            .unwrap();
        assert_eq!(created.amount.to_cents(), Some(1250));
        assert_eq!(created.category_id, Some(cat.id));
        assert_eq!(created.date, date(2024, 3, 1));

        let fetched = store.get_expense("alice", created.id).await.unwrap();
        assert_eq!(fetched.title, "Lunch");

        let updated = store
            .update_expense("alice", created.id, &expense("Dinner", 4000, date(2024, 3, 2), None))
            .await
            .unwrap();
        assert_eq!(updated.title, "Dinner");
        assert_eq!(updated.category_id, None);

        store.delete_expense("alice", created.id).await.unwrap();
        assert!(matches!(
            store.get_expense("alice", created.id).await,
            Err(StorageError::NotFound("Expense"))
        ));
    }

    #[tokio::test]
    async fn other_users_rows_are_not_found() {
        let (_dir, store) = test_store().await;
        let e = store
            .create_expense("alice", &expense("Lunch", 1000, date(2024, 3, 1), None))
            .await
            .unwrap();

        assert!(store.get_expense("bob", e.id).await.is_err());
        assert!(store.delete_expense("bob", e.id).await.is_err());
        assert!(store
            .update_expense("bob", e.id, &expense("x", 1, date(2024, 1, 1), None))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn foreign_category_is_rejected() {
        let (_dir, store) = test_store().await;
        let bobs = store.create_category("bob", &food()).await.unwrap();
        let err = store
            .create_expense("alice", &expense("Lunch", 1000, date(2024, 3, 1), Some(bobs.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound("Category")));
    }

    #[tokio::test]
    async fn list_expenses_filters_and_orders() {
        let (_dir, store) = test_store().await;
        for (title, day) in [
            ("a", date(2024, 1, 5)),
            ("b", date(2024, 2, 5)),
            ("c", date(2024, 3, 5)),
        ] {
            store
                .create_expense("alice", &expense(title, 100, day, None))
                .await
                .unwrap();
        }

        let all = store.list_expenses("alice", None, None).await.unwrap();
        let titles: Vec<_> = all.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);

        let feb_on = store
            .list_expenses("alice", Some(date(2024, 2, 1)), Some(date(2024, 2, 29)))
            .await
            .unwrap();
        assert_eq!(feb_on.len(), 1);
        assert_eq!(feb_on[0].title, "b");
    }

    #[tokio::test]
    async fn deleting_category_unassigns_expenses() {
        let (_dir, store) = test_store().await;
        let cat = store.create_category("alice", &food()).await.unwrap();
        let e = store
            .create_expense("alice", &expense("Lunch", 1000, date(2024, 3, 1), Some(cat.id)))
            .await
            .unwrap();

        store.delete_category("alice", cat.id).await.unwrap();
        let after = store.get_expense("alice", e.id).await.unwrap();
        assert_eq!(after.category_id, None);
    }

    #[tokio::test]
    async fn budget_upsert_replaces_same_scope() {
        let (_dir, store) = test_store().await;
        let overall = NewBudget {
            category_id: None,
            amount: Money::from_cents(100_000),
            currency: "USD".into(),
            period: BudgetPeriod::Monthly,
        };
        let first = store.upsert_budget("alice", &overall).await.unwrap();
        let second = store
            .upsert_budget(
                "alice",
                &NewBudget { amount: Money::from_cents(120_000), ..overall.clone() },
            )
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let yearly = NewBudget { period: BudgetPeriod::Yearly, ..overall };
        store.upsert_budget("alice", &yearly).await.unwrap();

        let budgets = store.list_budgets("alice").await.unwrap();
        assert_eq!(budgets.len(), 2);
        assert_eq!(budgets[0].amount.to_cents(), Some(120_000));
        assert_eq!(budgets[1].period, BudgetPeriod::Yearly);

        store.delete_budget("alice", first.id).await.unwrap();
        assert_eq!(store.list_budgets("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn amount_beyond_cents_range_is_refused() {
        let (_dir, store) = test_store().await;
        let mut huge = expense("Yacht", 100, date(2024, 3, 1), None);
        huge.amount = Money::from_cents(i64::MAX) + Money::from_cents(i64::MAX);

        let err = store.create_expense("alice", &huge).await.unwrap_err();
        assert!(matches!(err, StorageError::Database(sqlx::Error::Encode(_))), "got {err:?}");
        assert!(store.list_expenses("alice", None, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn preferences_default_then_saved() {
        let (_dir, store) = test_store().await;
        let defaults = store.get_preferences("alice").await.unwrap();
        assert_eq!(defaults, Preferences::default_for("alice"));

        let prefs = Preferences {
            currency: "EUR".into(),
            budget_alerts: false,
            ..defaults
        };
        store.save_preferences(&prefs).await.unwrap();
        assert_eq!(store.get_preferences("alice").await.unwrap(), prefs);
    }
}
