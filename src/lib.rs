//! Image filter job intake
//!
//! Accepts PNG uploads over HTTP, validates the requested filter, records a
//! `pending` status per job and hands the image to out-of-process filter
//! workers through a Redis list.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
