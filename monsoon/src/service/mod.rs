//! Data access orchestration.
//!
//! [`DataAccessService`] ties query building, the response cache, backend
//! dispatch, row conversion and request statistics together behind a single
//! `fetch` call that never fails: every outcome is a status string and a
//! (possibly empty) row set.

mod data_access;

pub use data_access::{DataAccessService, FetchResult, STATUS_OK};
