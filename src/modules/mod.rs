//! Feature modules. Each has a `store` (persistence trait plus Postgres and
//! in-memory implementations), a `controller` (handlers) and a `router`.

pub mod snippets;
pub mod users;
