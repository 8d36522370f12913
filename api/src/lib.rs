//! HTTP front end of the sum service.
//!
//! Every `POST /` request carries one operation, either an integer contribution or
//! an `end [token]` command, and is answered with `<sum> <token>` once its batch is
//! released.

mod request_logging;
pub mod routes;
pub mod startup;
