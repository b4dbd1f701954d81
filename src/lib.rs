//! Demonstration console for an instant-messaging client SDK.
//!
//! Every SDK method is exposed as a form: fill it in, submit, and the call
//! goes through [`call::to`] so success and failure come back as one
//! [`call::Outcome`]. Parameters of the last successful call are remembered
//! per call site in a [`storage::ParamStore`].

pub mod app;
pub mod banner;
pub mod call;
pub mod config;
pub mod form;
pub mod global_prefs;
pub mod handlers;
pub mod lifecycle;
pub mod logging;
pub mod pages;
pub mod sdk;
pub mod services;
pub mod state;
pub mod storage;
pub mod ui;
