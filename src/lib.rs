//! Dawaai core library.
//!
//! Everything the app does away from the screen lives here: resolving noisy
//! package-scan text against the bundled medicine dictionary, persisting the
//! medication list and dose log, computing daily reminder plans, and spotting
//! adherence drift. Camera capture, OCR itself, and notification delivery are
//! platform collaborators; this crate only consumes their text and hands back
//! data for them to act on.

pub mod adherence;
pub mod config;
pub mod db;
pub mod matcher;
pub mod models;
pub mod scan;
pub mod schedule;
