//! Expense tracking engine.
//!
//! Two components share one database:
//!
//! - identity & access: users, credentials and bearer tokens;
//! - expenses: owner-only writes, even splits between the owner and the
//!   participants, participant names resolved at read time through
//!   [`NameResolver`].

pub use error::EngineError;
pub use expenses::{Expense, ExpenseDraft, Share, UNKNOWN_USER, split_shares};
pub use ops::{DEFAULT_TOKEN_TTL_HOURS, Engine, EngineBuilder, enrich_shares};
pub use tokens::TokenSigner;
pub use users::{Identity, NameResolver, User, UserUpdate};

mod error;
mod expenses;
mod ops;
mod password;
mod tokens;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
