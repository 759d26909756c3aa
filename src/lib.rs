//! Voice-driven form filling: extract the fields of a page, send them with a
//! spoken utterance to a reasoning backend, and write the returned values
//! back so that the page's framework observes the change.

pub mod backend;
pub mod capture;
pub mod cli;
pub mod dom;
pub mod form;
pub mod page;
pub mod session;
pub mod trace;
