use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tally_core::{
    Budget, BudgetId, BudgetPeriod, Category, CategoryId, Expense, ExpenseId, Money, NewBudget,
    NewCategory, Preferences, ValidatedExpense,
};

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL COLLATE NOCASE,
            color TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (user_id, name)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL,
            date TEXT NOT NULL,
            category_id INTEGER,
            vendor TEXT,
            description TEXT,
            receipt_url TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS expenses_user_date ON expenses (user_id, date)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS budgets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            category_id INTEGER,
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL,
            period TEXT NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS preferences (
            user_id TEXT PRIMARY KEY,
            currency TEXT NOT NULL,
            email_notifications INTEGER NOT NULL DEFAULT 1,
            budget_alerts INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// ── Categories ────────────────────────────────────────────────────────────────

type CategoryRow = (i64, String, String, Option<String>, String);

fn category_from_row(r: CategoryRow) -> Category {
    Category {
        id: CategoryId(r.0),
        user_id: r.1,
        name: r.2,
        color: r.3,
        created_at: r.4,
    }
}

pub async fn list_categories(pool: &DbPool, user_id: &str) -> Result<Vec<Category>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, user_id, name, color, created_at FROM categories WHERE user_id = ? ORDER BY name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(category_from_row).collect())
}

pub async fn insert_category(
    pool: &DbPool,
    user_id: &str,
    category: &NewCategory,
) -> Result<Category, sqlx::Error> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (user_id, name, color) VALUES (?, ?, ?) RETURNING id, user_id, name, color, created_at",
    )
    .bind(user_id)
    .bind(&category.name)
    .bind(&category.color)
    .fetch_one(pool)
    .await?;

    Ok(category_from_row(row))
}

pub async fn category_belongs_to(
    pool: &DbPool,
    user_id: &str,
    id: CategoryId,
) -> Result<bool, sqlx::Error> {
    let row = sqlx::query_as::<_, (i64,)>("SELECT id FROM categories WHERE id = ? AND user_id = ?")
        .bind(id.0)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Returns whether a row was deleted.
pub async fn delete_category(pool: &DbPool, user_id: &str, id: CategoryId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
        .bind(id.0)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ── Expenses ──────────────────────────────────────────────────────────────────

type ExpenseRow = (
    i64,
    String,
    String,
    i64,
    String,
    NaiveDate,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

/// Validated amounts always fit; anything else is refused before it reaches SQL.
fn cents(amount: Money) -> Result<i64, sqlx::Error> {
    amount
        .to_cents()
        .ok_or_else(|| sqlx::Error::Encode(format!("amount {amount} does not fit in cents").into()))
}

const EXPENSE_COLUMNS: &str =
    "id, user_id, title, amount_cents, currency, date, category_id, vendor, description, receipt_url, created_at";

fn expense_from_row(r: ExpenseRow) -> Expense {
    Expense {
        id: ExpenseId(r.0),
        user_id: r.1,
        title: r.2,
        amount: Money::from_cents(r.3),
        currency: r.4,
        date: r.5,
        category_id: r.6.map(CategoryId),
        vendor: r.7,
        description: r.8,
        receipt_url: r.9,
        created_at: r.10,
    }
}

pub async fn insert_expense(
    pool: &DbPool,
    user_id: &str,
    expense: &ValidatedExpense,
) -> Result<Expense, sqlx::Error> {
    let sql = format!(
        "INSERT INTO expenses (user_id, title, amount_cents, currency, date, category_id, vendor, description, receipt_url) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING {EXPENSE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ExpenseRow>(&sql)
        .bind(user_id)
        .bind(&expense.title)
        .bind(cents(expense.amount)?)
        .bind(expense.currency)
        .bind(expense.date)
        .bind(expense.category_id.map(|c| c.0))
        .bind(&expense.vendor)
        .bind(&expense.description)
        .bind(&expense.receipt_url)
        .fetch_one(pool)
        .await?;

    Ok(expense_from_row(row))
}

pub async fn get_expense(
    pool: &DbPool,
    user_id: &str,
    id: ExpenseId,
) -> Result<Option<Expense>, sqlx::Error> {
    let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ? AND user_id = ?");
    let row = sqlx::query_as::<_, ExpenseRow>(&sql)
        .bind(id.0)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(expense_from_row))
}

/// Newest first. Both bounds are inclusive when given.
pub async fn list_expenses(
    pool: &DbPool,
    user_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<Expense>, sqlx::Error> {
    let sql = format!(
        "SELECT {EXPENSE_COLUMNS} FROM expenses \
         WHERE user_id = ? AND (? IS NULL OR date >= ?) AND (? IS NULL OR date <= ?) \
         ORDER BY date DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, ExpenseRow>(&sql)
        .bind(user_id)
        .bind(from)
        .bind(from)
        .bind(to)
        .bind(to)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(expense_from_row).collect())
}

pub async fn update_expense(
    pool: &DbPool,
    user_id: &str,
    id: ExpenseId,
    expense: &ValidatedExpense,
) -> Result<Option<Expense>, sqlx::Error> {
    let sql = format!(
        "UPDATE expenses SET title = ?, amount_cents = ?, currency = ?, date = ?, category_id = ?, \
         vendor = ?, description = ?, receipt_url = ? \
         WHERE id = ? AND user_id = ? RETURNING {EXPENSE_COLUMNS}"
    );
    let row = sqlx::query_as::<_, ExpenseRow>(&sql)
        .bind(&expense.title)
        .bind(cents(expense.amount)?)
        .bind(expense.currency)
        .bind(expense.date)
        .bind(expense.category_id.map(|c| c.0))
        .bind(&expense.vendor)
        .bind(&expense.description)
        .bind(&expense.receipt_url)
        .bind(id.0)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(expense_from_row))
}

pub async fn delete_expense(pool: &DbPool, user_id: &str, id: ExpenseId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND user_id = ?")
        .bind(id.0)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ── Budgets ───────────────────────────────────────────────────────────────────

type BudgetRow = (i64, String, Option<i64>, i64, String, String);

fn budget_from_row(r: BudgetRow) -> Budget {
    Budget {
        id: BudgetId(r.0),
        user_id: r.1,
        category_id: r.2.map(CategoryId),
        amount: Money::from_cents(r.3),
        currency: r.4,
        // Only this module writes the column.
        period: BudgetPeriod::from_str(&r.5).unwrap_or(BudgetPeriod::Monthly),
    }
}

/// One budget per (user, category, period): an existing row is updated in place.
pub async fn upsert_budget(
    pool: &DbPool,
    user_id: &str,
    budget: &NewBudget,
) -> Result<Budget, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let category_id = budget.category_id.map(|c| c.0);
    let period = budget.period.to_string();

    let updated = sqlx::query_as::<_, BudgetRow>(
        "UPDATE budgets SET amount_cents = ?, currency = ? \
         WHERE user_id = ? AND category_id IS ? AND period = ? \
         RETURNING id, user_id, category_id, amount_cents, currency, period",
    )
    .bind(cents(budget.amount)?)
    .bind(&budget.currency)
    .bind(user_id)
    .bind(category_id)
    .bind(&period)
    .fetch_optional(&mut *tx)
    .await?;

    let row = match updated {
        Some(row) => row,
        None => {
            sqlx::query_as::<_, BudgetRow>(
                "INSERT INTO budgets (user_id, category_id, amount_cents, currency, period) VALUES (?, ?, ?, ?, ?) \
                 RETURNING id, user_id, category_id, amount_cents, currency, period",
            )
            .bind(user_id)
            .bind(category_id)
            .bind(cents(budget.amount)?)
            .bind(&budget.currency)
            .bind(&period)
            .fetch_one(&mut *tx)
            .await?
        }
    };

    tx.commit().await?;
    Ok(budget_from_row(row))
}

pub async fn list_budgets(pool: &DbPool, user_id: &str) -> Result<Vec<Budget>, sqlx::Error> {
    let rows = sqlx::query_as::<_, BudgetRow>(
        "SELECT id, user_id, category_id, amount_cents, currency, period FROM budgets WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(budget_from_row).collect())
}

pub async fn delete_budget(pool: &DbPool, user_id: &str, id: BudgetId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM budgets WHERE id = ? AND user_id = ?")
        .bind(id.0)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ── Preferences ───────────────────────────────────────────────────────────────

pub async fn get_preferences(pool: &DbPool, user_id: &str) -> Result<Option<Preferences>, sqlx::Error> {
    let row = sqlx::query_as::<_, (String, String, bool, bool)>(
        "SELECT user_id, currency, email_notifications, budget_alerts FROM preferences WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Preferences {
        user_id: r.0,
        currency: r.1,
        email_notifications: r.2,
        budget_alerts: r.3,
    }))
}

pub async fn save_preferences(pool: &DbPool, prefs: &Preferences) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO preferences (user_id, currency, email_notifications, budget_alerts) VALUES (?, ?, ?, ?) \
         ON CONFLICT(user_id) DO UPDATE SET currency = excluded.currency, \
         email_notifications = excluded.email_notifications, budget_alerts = excluded.budget_alerts",
    )
    .bind(&prefs.user_id)
    .bind(&prefs.currency)
    .bind(prefs.email_notifications)
    .bind(prefs.budget_alerts)
    .execute(pool)
    .await?;
    Ok(())
}
