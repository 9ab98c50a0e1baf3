pub mod analytics;
pub mod budget;
pub mod currency;
pub mod expense;
pub mod money;
pub mod period;

pub use analytics::{BudgetStatus, CategoryTotal, MonthTotal};
pub use budget::{Budget, BudgetId, NewBudget, Preferences};
pub use expense::{
    Category, CategoryId, Expense, ExpenseId, NewCategory, UnvalidatedExpense, ValidatedExpense,
    ValidationError,
};
pub use money::Money;
pub use period::{BudgetPeriod, DateRange};
